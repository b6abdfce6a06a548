//! Interaction state types

use crate::session::ContextTag;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-session interaction state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionState {
    /// Ready for user input, no request outstanding
    #[default]
    Idle,

    /// One assistant request in flight
    AwaitingResponse {
        /// Correlates the eventual completion with this request
        exchange_id: Uuid,
        context: ContextTag,
    },

    /// Signed out; the session accepts no further intents
    Closed,
}

impl InteractionState {
    /// Check if this is a terminal state (cannot transition out)
    pub fn is_terminal(&self) -> bool {
        matches!(self, InteractionState::Closed)
    }

    pub fn is_awaiting_response(&self) -> bool {
        matches!(self, InteractionState::AwaitingResponse { .. })
    }

    /// Exchange id of the request in flight
    pub fn pending_exchange(&self) -> Option<Uuid> {
        match self {
            InteractionState::AwaitingResponse { exchange_id, .. } => Some(*exchange_id),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::AwaitingResponse { .. } => "awaiting_response",
            InteractionState::Closed => "closed",
        }
    }
}
