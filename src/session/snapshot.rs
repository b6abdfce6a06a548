//! Read-only session views handed to the presentation layer

use super::types::{Drafts, ExchangeFailure, Message, Mode};
use crate::state_machine::InteractionState;
use serde::Serialize;
use uuid::Uuid;

/// Everything a renderer needs, detached from the live store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub user_email: Option<String>,
    pub mode: Mode,
    pub transcript: Vec<Message>,
    pub drafts: Drafts,
    /// Draft of the active mode
    pub active_draft: String,
    pub status: InteractionState,
    pub failure: Option<ExchangeFailure>,
    pub actions: AvailableActions,
}

/// Which user actions are currently enabled.
///
/// A pending response disables sending rather than surfacing an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct AvailableActions {
    pub can_submit: bool,
    pub can_analyze: bool,
    pub can_clear_code: bool,
    pub can_retry: bool,
}

impl AvailableActions {
    pub fn evaluate(
        status: InteractionState,
        mode: Mode,
        drafts: &Drafts,
        has_failure: bool,
    ) -> Self {
        let idle = matches!(status, InteractionState::Idle);
        let open = !status.is_terminal();
        Self {
            can_submit: idle && !drafts.get(mode).trim().is_empty(),
            can_analyze: idle && !drafts.get(Mode::CodeAnalysis).trim().is_empty(),
            can_clear_code: open && !drafts.get(Mode::CodeAnalysis).is_empty(),
            can_retry: idle && has_failure,
        }
    }
}
