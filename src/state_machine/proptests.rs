//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::assistant::AssistantError;
use crate::session::{ContextTag, Mode, Role};
use proptest::prelude::*;
use uuid::Uuid;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn arb_context() -> impl Strategy<Value = ContextTag> {
    prop_oneof![Just(ContextTag::Conversation), Just(ContextTag::CodeAnalysis)]
}

fn arb_mode() -> impl Strategy<Value = Mode> {
    prop_oneof![Just(Mode::Conversation), Just(Mode::CodeAnalysis)]
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ]{1,30}",
        Just(String::new()),
        Just("  \n\t".to_string()),
    ]
}

fn arb_error() -> impl Strategy<Value = AssistantError> {
    prop_oneof![
        "[a-z ]{1,20}".prop_map(AssistantError::network),
        "[a-z ]{1,20}".prop_map(AssistantError::timeout),
        "[a-z ]{1,20}".prop_map(AssistantError::auth),
        "[a-z ]{1,20}".prop_map(AssistantError::server_error),
    ]
}

fn arb_state() -> impl Strategy<Value = InteractionState> {
    prop_oneof![
        Just(InteractionState::Idle),
        (arb_uuid(), arb_context()).prop_map(|(exchange_id, context)| {
            InteractionState::AwaitingResponse {
                exchange_id,
                context,
            }
        }),
        Just(InteractionState::Closed),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        (arb_uuid(), arb_context(), arb_text()).prop_map(|(exchange_id, context, text)| {
            Event::Submit {
                exchange_id,
                context,
                text,
            }
        }),
        (arb_uuid(), arb_context())
            .prop_map(|(exchange_id, context)| Event::Retry { exchange_id, context }),
        arb_mode().prop_map(|mode| Event::SwitchMode { mode }),
        (arb_mode(), arb_text()).prop_map(|(mode, text)| Event::EditDraft { mode, text }),
        arb_mode().prop_map(|mode| Event::ClearDraft { mode }),
        (arb_uuid(), arb_text()).prop_map(|(exchange_id, content)| Event::AssistantReplied {
            exchange_id,
            content
        }),
        (arb_uuid(), arb_error())
            .prop_map(|(exchange_id, error)| Event::AssistantFailed { exchange_id, error }),
        Just(Event::NewConversation),
        Just(Event::SignOut),
    ]
}

/// Replace the exchange id of a completion with the pending one, so
/// sequences actually resolve their requests
fn correlate(state: &InteractionState, event: Event) -> Event {
    match (state.pending_exchange(), event) {
        (Some(pending), Event::AssistantReplied { content, .. }) => Event::AssistantReplied {
            exchange_id: pending,
            content,
        },
        (Some(pending), Event::AssistantFailed { error, .. }) => Event::AssistantFailed {
            exchange_id: pending,
            error,
        },
        (_, event) => event,
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: transition is deterministic
    #[test]
    fn prop_transition_is_deterministic(state in arb_state(), event in arb_event()) {
        let first = transition(&state, event.clone());
        let second = transition(&state, event);
        prop_assert_eq!(first, second);
    }

    // Invariant 2: Closed is terminal
    #[test]
    fn prop_closed_is_terminal(event in arb_event()) {
        if let Ok(result) = transition(&InteractionState::Closed, event) {
            prop_assert_eq!(result.new_state, InteractionState::Closed);
            prop_assert!(result.effects.is_empty());
        }
    }

    // Invariant 3: no second request while one is pending
    #[test]
    fn prop_pending_rejects_submissions(
        exchange_id in arb_uuid(),
        context in arb_context(),
        text in arb_text()
    ) {
        let state = InteractionState::AwaitingResponse { exchange_id, context };
        let submit = Event::Submit { exchange_id: Uuid::new_v4(), context, text };
        prop_assert_eq!(transition(&state, submit), Err(InteractionError::ResponsePending));

        let retry = Event::Retry { exchange_id: Uuid::new_v4(), context };
        prop_assert_eq!(transition(&state, retry), Err(InteractionError::ResponsePending));
    }

    // Invariant 4: blank drafts never reach the assistant
    #[test]
    fn prop_blank_submit_has_no_effects(context in arb_context(), ws in "[ \t\n]{0,8}") {
        let event = Event::Submit { exchange_id: Uuid::new_v4(), context, text: ws };
        prop_assert_eq!(
            transition(&InteractionState::Idle, event),
            Err(InteractionError::EmptyContent)
        );
    }

    // Invariant 5: a request is only issued on entering AwaitingResponse,
    // and the user message always precedes it
    #[test]
    fn prop_request_follows_user_message(
        events in proptest::collection::vec(arb_event(), 0..30)
    ) {
        let mut state = InteractionState::Idle;

        for event in events {
            let event = correlate(&state, event);
            let is_submit = matches!(event, Event::Submit { .. });
            if let Ok(result) = transition(&state, event) {
                let request_at = result
                    .effects
                    .iter()
                    .position(|e| matches!(e, Effect::RequestAssistant { .. }));
                if let Some(request_at) = request_at {
                    prop_assert!(result.new_state.is_awaiting_response());
                    prop_assert!(!state.is_awaiting_response());
                    if is_submit {
                        let append_at = result.effects.iter().position(|e| {
                            matches!(e, Effect::AppendMessage { role: Role::User, .. })
                        });
                        prop_assert!(append_at.is_some_and(|a| a < request_at));
                    }
                }
                state = result.new_state;
            }
        }
    }

    // Invariant 6: state changes are always persisted
    #[test]
    fn prop_state_changes_persist(state in arb_state(), event in arb_event()) {
        if let Ok(result) = transition(&state, event) {
            if result.new_state != state {
                prop_assert!(
                    result.effects.iter().any(|e| matches!(e, Effect::PersistState)),
                    "State changed but no PersistState effect: {:?} -> {:?}",
                    state,
                    result.new_state
                );
            }
        }
    }

    // Invariant 7: completions for other exchanges never touch the transcript
    #[test]
    fn prop_uncorrelated_completion_is_discarded(
        state in arb_state(),
        exchange_id in arb_uuid(),
        content in arb_text()
    ) {
        prop_assume!(state.pending_exchange() != Some(exchange_id));
        let result = transition(&state, Event::AssistantReplied { exchange_id, content }).unwrap();
        prop_assert!(result.is_noop(&state));
    }
}
