//! Backend selection from configuration

use super::{
    AnthropicService, AssistantError, AssistantService, LoggingService, SimulatedAssistant,
};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_SIMULATED_DELAY: Duration = Duration::from_millis(1000);

/// Configuration for the assistant backend
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub anthropic_api_key: Option<String>,
    /// Gateway base URL; the gateway handles authentication
    pub gateway: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    /// Reply delay of the offline backend
    pub simulated_delay: Duration,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            gateway: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            simulated_delay: DEFAULT_SIMULATED_DELAY,
        }
    }
}

impl AssistantConfig {
    /// Whether a live backend can be reached with this configuration
    pub fn has_live_backend(&self) -> bool {
        self.gateway.is_some()
            || self
                .anthropic_api_key
                .as_deref()
                .is_some_and(|key| !key.is_empty())
    }
}

/// Build the configured backend, wrapped with logging.
///
/// Falls back to the simulated assistant when no API key or gateway is set.
pub fn build_service(
    config: &AssistantConfig,
) -> Result<Arc<dyn AssistantService>, AssistantError> {
    let service: Arc<dyn AssistantService> = if config.has_live_backend() {
        let api_key = if config.gateway.is_some() {
            "implicit".to_string()
        } else {
            config.anthropic_api_key.clone().unwrap_or_default()
        };
        Arc::new(AnthropicService::new(
            api_key,
            config.model.clone(),
            config.max_tokens,
            config.gateway.as_deref(),
        )?)
    } else {
        tracing::warn!("No ANTHROPIC_API_KEY or LLM_GATEWAY configured, using simulated assistant");
        Arc::new(SimulatedAssistant::new(config.simulated_delay))
    };

    tracing::info!(model = %service.model_id(), "Assistant backend initialized");
    Ok(Arc::new(LoggingService::new(service)))
}
