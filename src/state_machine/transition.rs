//! Pure state transition function
//!
//! Given the same state and event, `transition` always produces the same
//! result and performs no I/O. All mutation happens when the runtime
//! executes the returned effects.

use super::{Effect, Event, InteractionState};
use crate::assistant::AssistantError;
use crate::session::SessionError;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: InteractionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: InteractionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// True when the event was absorbed without any change
    pub fn is_noop(&self, previous: &InteractionState) -> bool {
        self.effects.is_empty() && self.new_state == *previous
    }
}

/// Errors surfaced to the user for rejected intents
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InteractionError {
    #[error("Message is empty")]
    EmptyContent,
    #[error("Waiting for the assistant to respond")]
    ResponsePending,
    #[error("Assistant unavailable: {0}")]
    AssistantUnavailable(String),
    #[error("Session has been signed out")]
    SessionClosed,
    #[error("No failed exchange to retry")]
    NothingToRetry,
}

impl InteractionError {
    /// Rejections the front end absorbs itself: a blank draft is ignored and
    /// a pending response shows up as disabled actions.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            InteractionError::EmptyContent | InteractionError::ResponsePending
        )
    }
}

impl From<SessionError> for InteractionError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::EmptyContent => InteractionError::EmptyContent,
        }
    }
}

/// Pure transition function
pub fn transition(
    state: &InteractionState,
    event: Event,
) -> Result<TransitionResult, InteractionError> {
    match (state, event) {
        // ============================================================
        // Closed sessions
        // ============================================================

        // Sign-out is idempotent
        (InteractionState::Closed, Event::SignOut) => {
            Ok(TransitionResult::new(InteractionState::Closed))
        }

        // Late completions after sign-out are dropped
        (InteractionState::Closed, event) if event.is_completion() => {
            Ok(TransitionResult::new(InteractionState::Closed))
        }

        (InteractionState::Closed, _) => Err(InteractionError::SessionClosed),

        // ============================================================
        // Submission
        // ============================================================

        // At most one outstanding request per session. Checked before the
        // draft so a repeated send reports the pending response.
        (InteractionState::AwaitingResponse { .. }, Event::Submit { .. } | Event::Retry { .. }) => {
            Err(InteractionError::ResponsePending)
        }

        // Idle + Submit -> AwaitingResponse
        (
            InteractionState::Idle,
            Event::Submit {
                exchange_id,
                context,
                text,
            },
        ) => {
            if text.trim().is_empty() {
                return Err(InteractionError::EmptyContent);
            }
            // User message lands before the request is issued
            Ok(
                TransitionResult::new(InteractionState::AwaitingResponse {
                    exchange_id,
                    context,
                })
                .with_effect(Effect::ClearFailure)
                .with_effect(Effect::append_user_message(text, context))
                .with_effect(Effect::ClearDraft {
                    mode: context.mode(),
                })
                .with_effect(Effect::PersistState)
                .with_effect(Effect::RequestAssistant {
                    exchange_id,
                    context,
                }),
            )
        }

        // Idle + Retry -> AwaitingResponse, transcript untouched
        (InteractionState::Idle, Event::Retry { exchange_id, context }) => Ok(
            TransitionResult::new(InteractionState::AwaitingResponse {
                exchange_id,
                context,
            })
            .with_effect(Effect::ClearFailure)
            .with_effect(Effect::PersistState)
            .with_effect(Effect::RequestAssistant {
                exchange_id,
                context,
            }),
        ),

        // ============================================================
        // Mode and draft edits (allowed while a response is pending)
        // ============================================================
        (_, Event::SwitchMode { mode }) => {
            Ok(TransitionResult::new(*state).with_effect(Effect::SetMode { mode }))
        }

        (_, Event::EditDraft { mode, text }) => {
            Ok(TransitionResult::new(*state).with_effect(Effect::SetDraft { mode, text }))
        }

        (_, Event::ClearDraft { mode }) => {
            Ok(TransitionResult::new(*state).with_effect(Effect::ClearDraft { mode }))
        }

        // ============================================================
        // Assistant completion
        // ============================================================

        // AwaitingResponse + matching reply -> Idle
        (
            InteractionState::AwaitingResponse {
                exchange_id: pending,
                context,
            },
            Event::AssistantReplied {
                exchange_id,
                content,
            },
        ) if *pending == exchange_id => {
            let result = TransitionResult::new(InteractionState::Idle);
            if content.trim().is_empty() {
                Ok(result
                    .with_effect(Effect::RecordFailure {
                        exchange_id,
                        context: *context,
                        error: AssistantError::empty_reply("Assistant returned an empty reply"),
                    })
                    .with_effect(Effect::PersistState))
            } else {
                Ok(result
                    .with_effect(Effect::append_assistant_message(content, *context))
                    .with_effect(Effect::PersistState))
            }
        }

        // AwaitingResponse + matching failure -> Idle, no rollback
        (
            InteractionState::AwaitingResponse {
                exchange_id: pending,
                context,
            },
            Event::AssistantFailed { exchange_id, error },
        ) if *pending == exchange_id => Ok(TransitionResult::new(InteractionState::Idle)
            .with_effect(Effect::RecordFailure {
                exchange_id,
                context: *context,
                error,
            })
            .with_effect(Effect::PersistState)),

        // Completion for an exchange that is no longer pending -> discard
        (_, Event::AssistantReplied { .. } | Event::AssistantFailed { .. }) => {
            Ok(TransitionResult::new(*state))
        }

        // ============================================================
        // Session lifecycle
        // ============================================================
        (_, Event::NewConversation) => Ok(TransitionResult::new(InteractionState::Idle)
            .with_effect(Effect::CancelRequest)
            .with_effect(Effect::ResetSession)
            .with_effect(Effect::PersistState)),

        (_, Event::SignOut) => Ok(TransitionResult::new(InteractionState::Closed)
            .with_effect(Effect::CancelRequest)
            .with_effect(Effect::PersistState)
            .with_effect(Effect::EndSession)),
    }
}
