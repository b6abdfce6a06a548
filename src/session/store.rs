//! Owned session state and its mutation primitives
//!
//! Every operation is synchronous and runs to completion. The interaction
//! controller is the only caller that mutates a store.

use super::snapshot::{AvailableActions, SessionSnapshot};
use super::transcript::Transcript;
use super::types::{ContextTag, Drafts, ExchangeFailure, Message, Mode, Role};
use crate::assistant::AssistantError;
use crate::state_machine::InteractionState;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the store itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("message content is empty")]
    EmptyContent,
}

/// Aggregate root for one session
#[derive(Debug)]
pub struct SessionStore {
    session_id: Uuid,
    user_email: Option<String>,
    transcript: Transcript,
    mode: Mode,
    drafts: Drafts,
    status: InteractionState,
    failure: Option<ExchangeFailure>,
}

impl SessionStore {
    pub fn new(user_email: Option<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_email,
            transcript: Transcript::new(),
            mode: Mode::default(),
            drafts: Drafts::default(),
            status: InteractionState::Idle,
            failure: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Append a message to the transcript.
    ///
    /// Content that trims to empty is rejected and nothing changes. Accepted
    /// content is stored verbatim.
    pub fn append_message(
        &mut self,
        role: Role,
        content: impl Into<String>,
        context: ContextTag,
    ) -> Result<Message, SessionError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(SessionError::EmptyContent);
        }
        Ok(self.transcript.push(role, content, context).clone())
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_draft(&mut self, mode: Mode, text: impl Into<String>) {
        self.drafts.set(mode, text.into());
    }

    pub fn clear_draft(&mut self, mode: Mode) {
        self.drafts.clear(mode);
    }

    pub fn draft(&self, mode: Mode) -> &str {
        self.drafts.get(mode)
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn set_status(&mut self, status: InteractionState) {
        self.status = status;
    }

    /// Attach a failure marker to the exchange, pointing at the unanswered
    /// user message
    pub fn record_failure(
        &mut self,
        exchange_id: Uuid,
        context: ContextTag,
        error: &AssistantError,
    ) -> ExchangeFailure {
        let failure = ExchangeFailure::new(
            exchange_id,
            self.transcript.last_user_sequence(),
            context,
            error,
        );
        self.failure = Some(failure.clone());
        failure
    }

    pub fn clear_failure(&mut self) {
        self.failure = None;
    }

    pub fn failure(&self) -> Option<&ExchangeFailure> {
        self.failure.as_ref()
    }

    /// Start over with a fresh session for the same user. The active mode
    /// carries over; transcript, drafts and failure do not.
    pub fn reset(&mut self) {
        let mode = self.mode;
        *self = Self::new(self.user_email.take());
        self.mode = mode;
    }

    /// Close the session on sign-out. The transcript stays readable; the
    /// user and any unsent drafts are dropped.
    pub fn end(&mut self) {
        self.user_email = None;
        self.drafts = Drafts::default();
    }

    /// Owned, read-only view for rendering
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            user_email: self.user_email.clone(),
            mode: self.mode,
            transcript: self.transcript.messages().to_vec(),
            drafts: self.drafts.clone(),
            active_draft: self.drafts.get(self.mode).to_string(),
            status: self.status,
            failure: self.failure.clone(),
            actions: AvailableActions::evaluate(
                self.status,
                self.mode,
                &self.drafts,
                self.failure.is_some(),
            ),
        }
    }
}
