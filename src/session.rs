//! Chat transcript with write-through persistence.
//!
//! The transcript is restored once from a [`PersistencePort`] and written
//! back as a full JSON snapshot after every mutation. Persistence is
//! fire-and-forget: a failed write is logged and the in-memory transcript
//! stays authoritative.

use crate::models::{ChatMessage, TRANSCRIPT_KEY};
use crate::storage::PersistencePort;

pub struct SessionStore {
    port: Box<dyn PersistencePort>,
    messages: Vec<ChatMessage>,
    scroll_to_latest: bool,
}

impl SessionStore {
    /// Rehydrate from `port`. A missing, unreadable, or malformed snapshot
    /// yields an empty transcript.
    pub fn restore(port: impl PersistencePort + 'static) -> Self {
        let messages = match port.load(TRANSCRIPT_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ChatMessage>>(&raw) {
                Ok(messages) => messages,
                Err(e) => {
                    tracing::warn!(error = %e, "discarding malformed transcript snapshot");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read transcript snapshot");
                Vec::new()
            }
        };
        tracing::debug!(count = messages.len(), "transcript restored");

        Self {
            port: Box::new(port),
            messages,
            // A restored transcript is shown scrolled to its end.
            scroll_to_latest: true,
        }
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.persist();
        self.scroll_to_latest = true;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.persist();
        self.scroll_to_latest = true;
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns whether the view should scroll to the newest message, and
    /// resets the signal.
    pub fn take_scroll_signal(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_latest)
    }

    fn persist(&self) {
        let snapshot = match serde_json::to_string(&self.messages) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "could not serialize transcript");
                return;
            }
        };
        if let Err(e) = self.port.save(TRANSCRIPT_KEY, &snapshot) {
            tracing::warn!(error = %e, "could not persist transcript");
        }
    }
}
