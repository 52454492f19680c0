//! Error taxonomy for backend interactions.
//!
//! Every failure a controller can see falls into one of four buckets:
//!
//! | Variant | Cause | Surfaced as |
//! |---------|-------|-------------|
//! | [`ClientError::Transport`] | backend unreachable, timed out, or sent an unreadable body | a generic per-area message |
//! | [`ClientError::Application`] | backend answered with an `{"error": ...}` body | the backend's message, verbatim |
//! | [`ClientError::Rejected`] | backend answered without the expected payload | a generic per-area message |
//! | [`ClientError::Validation`] | a required field was blank | skipped before any request is sent |
//!
//! None of these are fatal. Controllers convert them into their area's
//! error slot and stay usable.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The request never produced a usable response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The backend rejected the request and explained why.
    #[error("{0}")]
    Application(String),

    /// The backend answered without an error message but also without
    /// the expected payload (e.g. `{"success": false}`).
    #[error("backend did not confirm the operation")]
    Rejected,

    /// A required input was blank; no request was sent.
    #[error("{0}")]
    Validation(&'static str),
}

impl ClientError {
    /// Message for the area's error slot.
    ///
    /// Application and validation messages pass through unchanged;
    /// transport failures and unconfirmed responses are replaced by
    /// `generic` since there is nothing more useful to show.
    pub fn display_message(&self, generic: &str) -> String {
        match self {
            ClientError::Transport(_) | ClientError::Rejected => generic.to_string(),
            ClientError::Application(msg) => msg.clone(),
            ClientError::Validation(msg) => (*msg).to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Generic messages shown when the backend cannot be reached.
pub mod messages {
    pub const UPLOAD_FAILED: &str = "Upload failed, check that the backend service is running";
    pub const NO_FILE_SELECTED: &str = "Please choose a file first";
    pub const ASK_FAILED: &str = "AI request failed, check the backend service";
    pub const NO_ANSWER: &str = "AI returned no answer";
    pub const READ_CONTENT_FAILED: &str = "Could not read file content";
    pub const DELETE_FAILED: &str = "Delete failed";
    pub const RENAME_FAILED: &str = "Rename failed";
    pub const GROUP_FAILED: &str = "Setting group failed";
    pub const LIST_FAILED: &str = "Could not load the document list";
    pub const KEY_TEST_PASSED: &str = "API key test passed";
    pub const KEY_TEST_FAILED: &str = "API key test failed";
    pub const KEY_SAVED: &str = "API key saved";
    pub const KEY_SAVE_FAILED: &str = "API key save failed";
}
