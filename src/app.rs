//! Top-level composition of the per-concern state containers.
//!
//! Each container owns its own state and mutation API; [`App`] only wires
//! them to a shared backend and the transcript store, and implements the
//! few intents that span containers (clearing the chat).

use std::sync::Arc;

use anyhow::Result;

use crate::backend::{Backend, HttpBackend};
use crate::config::Config;
use crate::conversation::ConversationController;
use crate::credential::CredentialManager;
use crate::error::ClientResult;
use crate::registry::RegistryClient;
use crate::session::SessionStore;
use crate::storage::{FileStore, PersistencePort};

pub struct App {
    pub session: SessionStore,
    pub registry: RegistryClient,
    pub credentials: CredentialManager,
    pub conversation: ConversationController,
}

impl App {
    /// Wire containers around an existing backend and persistence port.
    /// Restores the transcript; performs no network calls.
    pub fn new(
        config: &Config,
        backend: Arc<dyn Backend>,
        port: impl PersistencePort + 'static,
    ) -> Self {
        Self {
            session: SessionStore::restore(port),
            registry: RegistryClient::new(backend.clone(), config.labels.clone()),
            credentials: CredentialManager::new(backend.clone()),
            conversation: ConversationController::new(backend, config.labels.all_groups.clone()),
        }
    }

    /// Build the HTTP backend and file store from `config` and restore the
    /// transcript.
    pub fn connect(config: &Config) -> Result<Self> {
        let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&config.backend)?);
        let port = FileStore::new(config.storage.dir.clone());
        Ok(Self::new(config, backend, port))
    }

    /// [`connect`](Self::connect), then load the document and group
    /// listings the way a freshly opened client does.
    pub async fn start(config: &Config) -> Result<Self> {
        let mut app = Self::connect(config)?;
        app.registry.refresh().await;
        Ok(app)
    }

    /// Ask the current question in the input buffer.
    pub async fn ask(&mut self) -> ClientResult<bool> {
        self.conversation.ask(&mut self.session).await
    }

    /// Empty the transcript, the input buffer, and the chat error.
    pub fn clear_chat(&mut self) {
        self.session.clear();
        self.conversation.clear_error();
        self.conversation.clear_question();
    }
}
