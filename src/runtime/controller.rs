//! Interaction controller

use super::SessionEvent;
use crate::assistant::{AssistantError, AssistantService};
use crate::identity::{IdentityProvider, User};
use crate::session::{ContextTag, ExchangeFailure, Message, Mode, SessionSnapshot, SessionStore};
use crate::state_machine::{transition, Effect, Event, InteractionError, InteractionState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Upper bound on a single assistant request
    pub response_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }
}

/// Outcome of an assistant completion once applied to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Replied(Message),
    Failed(ExchangeFailure),
    /// The completion belonged to an exchange that is no longer pending
    Discarded,
}

/// One-shot code analysis shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    Review,
    QuickFix,
}

impl QuickAction {
    fn instruction(self) -> &'static str {
        match self {
            QuickAction::Review => {
                "Review this code for bugs, readability and performance issues:"
            }
            QuickAction::QuickFix => {
                "Find the most likely bug in this code and show a minimal fix:"
            }
        }
    }
}

/// What executing a transition's effects produced
#[derive(Debug, Default)]
struct Applied {
    appended: Option<Message>,
    failure: Option<ExchangeFailure>,
    discarded: bool,
}

/// Drives one session: user intents and assistant completions go through
/// the pure transition function, and the resulting effects are applied to
/// the store in order.
pub struct InteractionController<A, I>
where
    A: AssistantService + 'static,
    I: IdentityProvider + 'static,
{
    config: ControllerConfig,
    store: SessionStore,
    state: InteractionState,
    assistant: Arc<A>,
    identity: I,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    /// Cancelled when the session is reset or ended
    session_token: CancellationToken,
    /// Token to cancel the assistant request in flight
    request_token: Option<CancellationToken>,
}

impl<A, I> InteractionController<A, I>
where
    A: AssistantService + 'static,
    I: IdentityProvider + 'static,
{
    pub fn new(assistant: A, identity: I, config: ControllerConfig) -> Self {
        let user_email = identity.current_user().map(|u| u.email);
        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let store = SessionStore::new(user_email);

        tracing::info!(
            session_id = %store.session_id(),
            model = %assistant.model_id(),
            "Session started"
        );

        Self {
            config,
            store,
            state: InteractionState::Idle,
            assistant: Arc::new(assistant),
            identity,
            event_rx,
            event_tx,
            broadcast_tx,
            session_token: CancellationToken::new(),
            request_token: None,
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.broadcast_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.store.snapshot()
    }

    pub fn mode(&self) -> Mode {
        self.store.mode()
    }

    pub fn current_user(&self) -> Option<User> {
        self.identity.current_user()
    }

    // ========================================================================
    // Drafts and mode
    // ========================================================================

    /// Replace the draft of the active mode
    pub fn edit_draft(&mut self, text: impl Into<String>) -> Result<(), InteractionError> {
        let mode = self.store.mode();
        self.edit_draft_for(mode, text)
    }

    pub fn edit_draft_for(
        &mut self,
        mode: Mode,
        text: impl Into<String>,
    ) -> Result<(), InteractionError> {
        self.dispatch(Event::EditDraft {
            mode,
            text: text.into(),
        })
        .map(|_| ())
    }

    /// Append one line to a draft, for line-oriented input of pasted code
    pub fn append_draft_line(&mut self, mode: Mode, line: &str) -> Result<(), InteractionError> {
        let mut text = self.store.draft(mode).to_string();
        text.push_str(line);
        text.push('\n');
        self.edit_draft_for(mode, text)
    }

    pub fn switch_mode(&mut self, mode: Mode) -> Result<(), InteractionError> {
        self.dispatch(Event::SwitchMode { mode }).map(|_| ())
    }

    /// Empty the code draft; the conversation draft is untouched
    pub fn clear_code_buffer(&mut self) -> Result<(), InteractionError> {
        self.dispatch(Event::ClearDraft {
            mode: Mode::CodeAnalysis,
        })
        .map(|_| ())
    }

    // ========================================================================
    // Exchanges
    // ========================================================================

    /// Send the active mode's draft, tagged with the active mode.
    ///
    /// Returns the appended user message. The reply arrives later through
    /// [`Self::next_resolution`].
    pub fn submit_message(&mut self) -> Result<Message, InteractionError> {
        let context = ContextTag::from(self.store.mode());
        self.submit(context)
    }

    /// Send the code draft for analysis regardless of the active mode
    pub fn request_code_analysis(&mut self) -> Result<Message, InteractionError> {
        self.submit(ContextTag::CodeAnalysis)
    }

    /// Load `code` behind a canned instruction and send it for analysis
    pub fn quick_action(
        &mut self,
        action: QuickAction,
        code: &str,
    ) -> Result<Message, InteractionError> {
        if self.state.is_awaiting_response() {
            return Err(InteractionError::ResponsePending);
        }
        if code.trim().is_empty() {
            return Err(InteractionError::EmptyContent);
        }
        let text = format!(
            "{}\n\n```\n{}\n```",
            action.instruction(),
            code.trim_end()
        );
        self.edit_draft_for(Mode::CodeAnalysis, text)?;
        self.request_code_analysis()
    }

    /// Re-issue the request for the last failed exchange.
    ///
    /// The unanswered user message is already in the transcript, so nothing
    /// is appended.
    pub fn retry_failed_exchange(&mut self) -> Result<(), InteractionError> {
        let Some(context) = self.store.failure().map(|f| f.context) else {
            return Err(match self.state {
                InteractionState::Closed => InteractionError::SessionClosed,
                InteractionState::AwaitingResponse { .. } => InteractionError::ResponsePending,
                InteractionState::Idle => InteractionError::NothingToRetry,
            });
        };
        self.dispatch(Event::Retry {
            exchange_id: Uuid::new_v4(),
            context,
        })
        .map(|_| ())
    }

    /// Abandon the current session and start an empty one for the same user
    pub fn new_conversation(&mut self) -> Result<(), InteractionError> {
        self.dispatch(Event::NewConversation).map(|_| ())
    }

    /// Close the session and sign the user out. Repeated calls are no-ops.
    pub async fn sign_out(&mut self) -> Result<(), InteractionError> {
        let was_open = !self.state.is_terminal();
        self.dispatch(Event::SignOut)?;
        if was_open {
            self.identity.sign_out().await;
        }
        Ok(())
    }

    /// Wait for the next assistant completion and apply it.
    ///
    /// Cancel-safe: nothing is applied until a completion has been received,
    /// so this can sit in a `select!` next to user input. Pends while no
    /// request is outstanding.
    pub async fn next_resolution(&mut self) -> Option<Resolution> {
        let event = self.event_rx.recv().await?;
        Some(self.resolve(event))
    }

    fn resolve(&mut self, event: Event) -> Resolution {
        match self.dispatch(event) {
            Ok(Applied {
                discarded: true, ..
            }) => Resolution::Discarded,
            Ok(Applied {
                failure: Some(failure),
                ..
            }) => Resolution::Failed(failure),
            Ok(Applied {
                appended: Some(message),
                ..
            }) => Resolution::Replied(message),
            Ok(_) => Resolution::Discarded,
            Err(e) => {
                tracing::error!(error = %e, "Failed to apply assistant completion");
                Resolution::Discarded
            }
        }
    }

    fn submit(&mut self, context: ContextTag) -> Result<Message, InteractionError> {
        let text = self.store.draft(context.mode()).to_string();
        let applied = self.dispatch(Event::Submit {
            exchange_id: Uuid::new_v4(),
            context,
            text,
        })?;
        applied.appended.ok_or(InteractionError::EmptyContent)
    }

    // ========================================================================
    // Effect execution
    // ========================================================================

    fn dispatch(&mut self, event: Event) -> Result<Applied, InteractionError> {
        let is_completion = event.is_completion();

        let result = match transition(&self.state, event) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(state = self.state.label(), error = %e, "Intent rejected");
                if !e.is_local() {
                    let _ = self.broadcast_tx.send(SessionEvent::Error {
                        message: e.to_string(),
                    });
                }
                return Err(e);
            }
        };

        if is_completion && result.is_noop(&self.state) {
            tracing::debug!(
                session_id = %self.store.session_id(),
                state = self.state.label(),
                pending = ?self.state.pending_exchange(),
                "Discarding stale assistant completion"
            );
            return Ok(Applied {
                discarded: true,
                ..Applied::default()
            });
        }

        self.state = result.new_state;

        let mut applied = Applied::default();
        for effect in result.effects {
            self.execute_effect(effect, &mut applied)?;
        }
        Ok(applied)
    }

    #[allow(clippy::too_many_lines)]
    fn execute_effect(
        &mut self,
        effect: Effect,
        applied: &mut Applied,
    ) -> Result<(), InteractionError> {
        match effect {
            Effect::AppendMessage {
                role,
                content,
                context,
            } => {
                let message = self.store.append_message(role, content, context)?;
                tracing::debug!(
                    session_id = %self.store.session_id(),
                    sequence = message.sequence(),
                    role = ?role,
                    context = %context,
                    "Message appended"
                );
                let _ = self.broadcast_tx.send(SessionEvent::Message {
                    message: message.clone(),
                });
                applied.appended = Some(message);
            }

            Effect::SetMode { mode } => {
                self.store.set_mode(mode);
                let _ = self.broadcast_tx.send(SessionEvent::ModeChange { mode });
            }

            Effect::SetDraft { mode, text } => {
                self.store.set_draft(mode, text.clone());
                let _ = self
                    .broadcast_tx
                    .send(SessionEvent::DraftChange { mode, text });
            }

            Effect::ClearDraft { mode } => {
                self.store.clear_draft(mode);
                let _ = self.broadcast_tx.send(SessionEvent::DraftChange {
                    mode,
                    text: String::new(),
                });
            }

            Effect::PersistState => {
                self.store.set_status(self.state);
                if !self.state.is_awaiting_response() {
                    self.request_token = None;
                }
                let _ = self
                    .broadcast_tx
                    .send(SessionEvent::StateChange { state: self.state });
            }

            Effect::RequestAssistant {
                exchange_id,
                context,
            } => {
                self.spawn_request(exchange_id, context);
            }

            Effect::CancelRequest => {
                if let Some(token) = self.request_token.take() {
                    token.cancel();
                    tracing::info!(
                        session_id = %self.store.session_id(),
                        "Cancelled outstanding assistant request"
                    );
                }
            }

            Effect::RecordFailure {
                exchange_id,
                context,
                error,
            } => {
                let failure = self.store.record_failure(exchange_id, context, &error);
                tracing::warn!(
                    session_id = %self.store.session_id(),
                    exchange_id = %exchange_id,
                    kind = ?failure.kind,
                    retryable = failure.retryable,
                    error = %failure.message,
                    "Assistant exchange failed"
                );
                let _ = self.broadcast_tx.send(SessionEvent::Failure {
                    failure: failure.clone(),
                });
                applied.failure = Some(failure);
            }

            Effect::ClearFailure => {
                self.store.clear_failure();
            }

            Effect::ResetSession => {
                self.session_token.cancel();
                self.session_token = CancellationToken::new();
                let previous = self.store.session_id();
                self.store.reset();
                tracing::info!(
                    previous = %previous,
                    session_id = %self.store.session_id(),
                    "Started new conversation"
                );
                let _ = self.broadcast_tx.send(SessionEvent::SessionReset {
                    session_id: self.store.session_id(),
                });
            }

            Effect::EndSession => {
                self.session_token.cancel();
                self.store.end();
                tracing::info!(session_id = %self.store.session_id(), "Session ended");
                let _ = self.broadcast_tx.send(SessionEvent::SessionEnded);
            }
        }
        Ok(())
    }

    /// Issue the assistant request as a background task. The completion
    /// comes back on the event channel tagged with `exchange_id`.
    fn spawn_request(&mut self, exchange_id: Uuid, context: ContextTag) {
        let cancel_token = self.session_token.child_token();
        self.request_token = Some(cancel_token.clone());

        let assistant = self.assistant.clone();
        let event_tx = self.event_tx.clone();
        let transcript = self.store.transcript().messages().to_vec();
        let timeout = self.config.response_timeout;
        let session_id = self.store.session_id();

        tokio::spawn(async move {
            tracing::info!(
                session_id = %session_id,
                exchange_id = %exchange_id,
                context = %context,
                messages = transcript.len(),
                "Requesting assistant reply (background)"
            );

            // Race the request against cancellation
            let event = tokio::select! {
                biased;

                () = cancel_token.cancelled() => {
                    tracing::info!(exchange_id = %exchange_id, "Assistant request cancelled");
                    return;
                }

                result = tokio::time::timeout(timeout, assistant.respond(&transcript, context)) => {
                    match result {
                        Ok(Ok(reply)) => Event::AssistantReplied {
                            exchange_id,
                            content: reply.content,
                        },
                        Ok(Err(error)) => Event::AssistantFailed { exchange_id, error },
                        Err(_) => Event::AssistantFailed {
                            exchange_id,
                            error: AssistantError::timeout(format!(
                                "No response within {timeout:?}"
                            )),
                        },
                    }
                }
            };

            if cancel_token.is_cancelled() {
                return;
            }
            let _ = event_tx.send(event).await;
        });
    }
}
