//! Question/answer turn handling.
//!
//! A turn moves through explicit states:
//!
//! ```text
//!   Idle ──submit(non-blank)──▶ AwaitingAnswer ──resolve──▶ Idle
//!    ▲                                                       │
//!    └────────────── submit(blank) is a no-op ───────────────┘
//! ```
//!
//! `submit` appends the user's message to the transcript right away and
//! clears the input; the answer (or error) arrives in `resolve`. There is
//! no cancellation: once a request is out, the controller stays in
//! `AwaitingAnswer` until it resolves, and further submissions are refused.

use std::sync::Arc;

use crate::backend::Backend;
use crate::error::{messages, ClientError, ClientResult};
use crate::models::{AskAnswer, AskRequest, ChatMessage};
use crate::session::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    Idle,
    AwaitingAnswer { question: String },
}

/// An in-flight question, produced by [`ConversationController::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAsk {
    request: AskRequest,
}

impl PendingAsk {
    pub fn request(&self) -> &AskRequest {
        &self.request
    }
}

pub struct ConversationController {
    backend: Arc<dyn Backend>,
    sentinel: String,
    question: String,
    qa_group: String,
    state: ConversationState,
    error: Option<String>,
}

impl ConversationController {
    /// `sentinel` is the "all groups" value; while it is the active group
    /// no filter is sent.
    pub fn new(backend: Arc<dyn Backend>, sentinel: impl Into<String>) -> Self {
        let sentinel = sentinel.into();
        Self {
            backend,
            qa_group: sentinel.clone(),
            sentinel,
            question: String::new(),
            state: ConversationState::Idle,
            error: None,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn set_question(&mut self, question: impl Into<String>) {
        self.question = question.into();
    }

    pub fn clear_question(&mut self) {
        self.question.clear();
    }

    pub fn qa_group(&self) -> &str {
        &self.qa_group
    }

    pub fn set_qa_group(&mut self, group: impl Into<String>) {
        self.qa_group = group.into();
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, ConversationState::AwaitingAnswer { .. })
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Start a turn from the input buffer.
    ///
    /// Returns `None` when the buffer is blank or a turn is already in
    /// flight. Otherwise the question is appended to `session`, the buffer
    /// is cleared, and the request to send is returned.
    pub fn submit(&mut self, session: &mut SessionStore) -> Option<PendingAsk> {
        if self.is_busy() || self.question.trim().is_empty() {
            return None;
        }

        let question = std::mem::take(&mut self.question);
        let message = ChatMessage::user(question.clone());
        let wire = message.to_wire();
        session.append(message);
        self.error = None;
        self.state = ConversationState::AwaitingAnswer { question };

        let group = if self.qa_group.is_empty() || self.qa_group == self.sentinel {
            None
        } else {
            Some(self.qa_group.clone())
        };

        Some(PendingAsk {
            request: AskRequest {
                messages: vec![wire],
                group,
            },
        })
    }

    /// Finish a turn. Success appends the assistant's answer; failure sets
    /// the chat error and appends nothing. Either way the controller is
    /// idle afterwards.
    pub fn resolve(
        &mut self,
        session: &mut SessionStore,
        _pending: PendingAsk,
        outcome: ClientResult<AskAnswer>,
    ) -> ClientResult<()> {
        self.state = ConversationState::Idle;
        match outcome {
            Ok(answer) => {
                session.append(ChatMessage::assistant(answer.answer, answer.source_files));
                Ok(())
            }
            Err(e) => {
                let message = match &e {
                    ClientError::Rejected => messages::NO_ANSWER.to_string(),
                    other => other.display_message(messages::ASK_FAILED),
                };
                tracing::warn!(error = %e, "question failed");
                self.error = Some(message);
                Err(e)
            }
        }
    }

    /// Submit, send, and resolve in one step.
    ///
    /// Returns `Ok(false)` when nothing was submitted.
    pub async fn ask(&mut self, session: &mut SessionStore) -> ClientResult<bool> {
        let Some(pending) = self.submit(session) else {
            return Ok(false);
        };
        let outcome = self.backend.ask(pending.request()).await;
        self.resolve(session, pending, outcome).map(|()| true)
    }
}
