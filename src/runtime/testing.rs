//! Mock implementations for testing
//!
//! These mocks enable controller testing without real I/O.

use crate::assistant::{AssistantError, AssistantReply, AssistantService};
use crate::identity::{IdentityProvider, User};
use crate::session::{ContextTag, Message};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};

// ============================================================================
// Mock Assistant
// ============================================================================

/// A request as seen by the assistant
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub transcript: Vec<Message>,
    pub context: ContextTag,
}

/// Mock assistant that returns queued replies
pub struct MockAssistant {
    replies: Mutex<VecDeque<Result<AssistantReply, AssistantError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockAssistant {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, text: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(AssistantReply::text(text)));
    }

    /// Queue an error reply
    pub fn queue_error(&self, error: AssistantError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, transcript: &[Message], context: ContextTag) {
        self.requests.lock().unwrap().push(RecordedRequest {
            transcript: transcript.to_vec(),
            context,
        });
    }

    fn next_reply(&self) -> Result<AssistantReply, AssistantError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AssistantError::network("No mock reply queued")))
    }
}

impl Default for MockAssistant {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssistantService for MockAssistant {
    async fn respond(
        &self,
        transcript: &[Message],
        context: ContextTag,
    ) -> Result<AssistantReply, AssistantError> {
        self.record(transcript, context);
        self.next_reply()
    }

    fn model_id(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Gated Assistant (for pending-state and cancellation testing)
// ============================================================================

/// Mock assistant that holds each request until the test releases it
pub struct GatedAssistant {
    inner: MockAssistant,
    gate: Semaphore,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl GatedAssistant {
    pub fn new() -> Self {
        Self {
            inner: MockAssistant::new(),
            gate: Semaphore::new(0),
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, text: &str) {
        self.inner.queue_reply(text);
    }

    /// Let one held request complete
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl AssistantService for GatedAssistant {
    async fn respond(
        &self,
        transcript: &[Message],
        context: ContextTag,
    ) -> Result<AssistantReply, AssistantError> {
        self.inner.record(transcript, context);
        self.request_started.notify_one();
        let _permit = self.gate.acquire().await.expect("gate closed");
        self.inner.next_reply()
    }

    fn model_id(&self) -> &str {
        "gated-mock"
    }
}

// ============================================================================
// Mock Identity
// ============================================================================

pub struct MockIdentity {
    email: Option<String>,
    sign_outs: AtomicUsize,
}

impl MockIdentity {
    pub fn signed_in(email: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            sign_outs: AtomicUsize::new(0),
        }
    }

    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    fn current_user(&self) -> Option<User> {
        if self.sign_out_count() > 0 {
            return None;
        }
        self.email.clone().map(|email| User { email })
    }

    async fn sign_out(&self) {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Role, SessionStore};

    #[tokio::test]
    async fn test_mock_assistant() {
        let mock = MockAssistant::new();
        mock.queue_reply("Hello");

        let mut store = SessionStore::new(None);
        store
            .append_message(Role::User, "hi", ContextTag::Conversation)
            .unwrap();
        let transcript = store.transcript().messages();

        let reply = mock
            .respond(transcript, ContextTag::Conversation)
            .await
            .unwrap();
        assert_eq!(reply.content, "Hello");

        // Second call should fail (no more replies)
        let result = mock.respond(transcript, ContextTag::Conversation).await;
        assert!(result.is_err());

        let requests = mock.recorded_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].transcript.len(), 1);
    }

    #[tokio::test]
    async fn test_mock_identity_signs_out() {
        let identity = MockIdentity::signed_in("dev@example.com");
        assert!(identity.current_user().is_some());

        identity.sign_out().await;

        assert_eq!(identity.sign_out_count(), 1);
        assert!(identity.current_user().is_none());
    }
}
