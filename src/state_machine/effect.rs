//! Effects produced by state transitions

use crate::assistant::AssistantError;
use crate::session::{ContextTag, Mode, Role};
use uuid::Uuid;

/// Effects to be executed after state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a message to the transcript
    AppendMessage {
        role: Role,
        content: String,
        context: ContextTag,
    },

    SetMode { mode: Mode },

    SetDraft { mode: Mode, text: String },

    ClearDraft { mode: Mode },

    /// Mirror the new state into the session and notify subscribers
    PersistState,

    /// Spawn the assistant call for an exchange
    RequestAssistant {
        exchange_id: Uuid,
        context: ContextTag,
    },

    /// Abort the outstanding assistant call, if any
    CancelRequest,

    /// Attach a failure marker to the unanswered exchange
    RecordFailure {
        exchange_id: Uuid,
        context: ContextTag,
        error: AssistantError,
    },

    ClearFailure,

    /// Replace the session with a fresh one
    ResetSession,

    /// Tear the session down after sign-out
    EndSession,
}

impl Effect {
    pub fn append_user_message(content: String, context: ContextTag) -> Self {
        Effect::AppendMessage {
            role: Role::User,
            content,
            context,
        }
    }

    pub fn append_assistant_message(content: String, context: ContextTag) -> Self {
        Effect::AppendMessage {
            role: Role::Assistant,
            content,
            context,
        }
    }
}
