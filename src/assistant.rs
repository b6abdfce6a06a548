//! Assistant service abstraction
//!
//! The interaction controller talks to the assistant backend only through
//! [`AssistantService`].

mod anthropic;
mod error;
mod prompt;
mod registry;
mod simulated;

pub use anthropic::AnthropicService;
pub use error::{AssistantError, AssistantErrorKind};
pub use registry::{build_service, AssistantConfig};
pub use simulated::SimulatedAssistant;

use crate::session::{ContextTag, Message};
use async_trait::async_trait;
use std::sync::Arc;

/// Text returned by the assistant for one exchange.
///
/// Sequence numbers are assigned by the session store, not the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub content: String,
}

impl AssistantReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Common interface for assistant backends
#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Answer the latest exchange given the full transcript
    async fn respond(
        &self,
        transcript: &[Message],
        context: ContextTag,
    ) -> Result<AssistantReply, AssistantError>;

    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: AssistantService + ?Sized> AssistantService for Arc<T> {
    async fn respond(
        &self,
        transcript: &[Message],
        context: ContextTag,
    ) -> Result<AssistantReply, AssistantError> {
        (**self).respond(transcript, context).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for assistant services
pub struct LoggingService {
    inner: Arc<dyn AssistantService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn AssistantService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl AssistantService for LoggingService {
    async fn respond(
        &self,
        transcript: &[Message],
        context: ContextTag,
    ) -> Result<AssistantReply, AssistantError> {
        let start = std::time::Instant::now();
        let result = self.inner.respond(transcript, context).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    model = %self.model_id,
                    context = %context,
                    duration_ms = %duration.as_millis(),
                    reply_chars = reply.content.chars().count(),
                    "Assistant request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    context = %context,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "Assistant request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
