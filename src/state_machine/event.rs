//! Events that can occur in a session

use crate::assistant::AssistantError;
use crate::session::{ContextTag, Mode};
use uuid::Uuid;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    Submit {
        exchange_id: Uuid,
        context: ContextTag,
        /// Draft text at the moment of submission
        text: String,
    },
    /// Re-request an answer for the transcript as it stands
    Retry {
        exchange_id: Uuid,
        context: ContextTag,
    },
    SwitchMode {
        mode: Mode,
    },
    EditDraft {
        mode: Mode,
        text: String,
    },
    ClearDraft {
        mode: Mode,
    },
    NewConversation,
    SignOut,

    // Assistant events
    AssistantReplied {
        exchange_id: Uuid,
        content: String,
    },
    AssistantFailed {
        exchange_id: Uuid,
        error: AssistantError,
    },
}

impl Event {
    /// Whether this event reports the outcome of an assistant request
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            Event::AssistantReplied { .. } | Event::AssistantFailed { .. }
        )
    }
}
