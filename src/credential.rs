//! API key panel state.
//!
//! The key lives only in memory. Testing and saving are single backend
//! calls whose outcome is kept as a display string; editing the key
//! discards the previous outcome.

use std::sync::Arc;

use crate::backend::Backend;
use crate::error::messages;

pub struct CredentialManager {
    backend: Arc<dyn Backend>,
    key: String,
    status: Option<String>,
    passed: Option<bool>,
    busy: bool,
}

impl CredentialManager {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            key: String::new(),
            status: None,
            passed: None,
            busy: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set_key(&mut self, key: impl Into<String>) {
        self.key = key.into();
        self.status = None;
        self.passed = None;
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Outcome of the last test or save; `None` until one completes.
    pub fn passed(&self) -> Option<bool> {
        self.passed
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Ask the backend whether the current key works.
    pub async fn validate(&mut self) -> &str {
        self.status = None;
        self.busy = true;
        let result = self.backend.test_key(&self.key).await;
        self.busy = false;
        self.passed = Some(result.is_ok());

        let status = match result {
            Ok(()) => messages::KEY_TEST_PASSED.to_string(),
            Err(e) => {
                tracing::debug!(error = %e, "key test failed");
                e.display_message(messages::KEY_TEST_FAILED)
            }
        };
        self.status.insert(status).as_str()
    }

    /// Ask the backend to store the current key.
    pub async fn persist(&mut self) -> &str {
        self.status = None;
        self.busy = true;
        let result = self.backend.save_key(&self.key).await;
        self.busy = false;
        self.passed = Some(result.is_ok());

        let status = match result {
            Ok(()) => messages::KEY_SAVED.to_string(),
            Err(e) => {
                tracing::debug!(error = %e, "key save failed");
                e.display_message(messages::KEY_SAVE_FAILED)
            }
        };
        self.status.insert(status).as_str()
    }
}
