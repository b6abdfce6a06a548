//! Runtime for driving a session
//!
//! The controller feeds user intents and assistant completions through the
//! pure state machine and executes the resulting effects against the
//! session store.

mod controller;

#[cfg(test)]
pub mod testing;

pub use controller::{ControllerConfig, InteractionController, QuickAction, Resolution};

use crate::assistant::AssistantService;
use crate::identity::LocalIdentity;
use crate::session::{ExchangeFailure, Message, Mode};
use crate::state_machine::InteractionState;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Type alias for production controller with concrete implementations
pub type ProductionController = InteractionController<Arc<dyn AssistantService>, LocalIdentity>;

/// Events published to the presentation layer after each mutation
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Message {
        message: Message,
    },
    StateChange {
        state: InteractionState,
    },
    ModeChange {
        mode: Mode,
    },
    DraftChange {
        mode: Mode,
        text: String,
    },
    /// The pending exchange failed; the transcript keeps the user message
    Failure {
        failure: ExchangeFailure,
    },
    SessionReset {
        session_id: Uuid,
    },
    SessionEnded,
    Error {
        message: String,
    },
}
