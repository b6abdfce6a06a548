//! Process configuration from environment variables

use crate::assistant::AssistantConfig;
use crate::runtime::ControllerConfig;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub assistant: AssistantConfig,
    pub controller: ControllerConfig,
    /// Signed-in user, if any
    pub user_email: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = AssistantConfig::default();
        let controller_defaults = ControllerConfig::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let simulated_delay_ms = parse_or(
            &lookup,
            "ASSISTANT_SIMULATED_DELAY_MS",
            u64::try_from(defaults.simulated_delay.as_millis()).unwrap_or(u64::MAX),
        );
        let timeout_secs = parse_or(
            &lookup,
            "ASSISTANT_TIMEOUT_SECS",
            controller_defaults.response_timeout.as_secs(),
        );

        Self {
            assistant: AssistantConfig {
                anthropic_api_key: non_empty("ANTHROPIC_API_KEY"),
                gateway: non_empty("LLM_GATEWAY"),
                model: non_empty("ASSISTANT_MODEL").unwrap_or(defaults.model),
                max_tokens: parse_or(&lookup, "ASSISTANT_MAX_TOKENS", defaults.max_tokens),
                simulated_delay: Duration::from_millis(simulated_delay_ms),
            },
            controller: ControllerConfig {
                response_timeout: Duration::from_secs(timeout_secs.max(1)),
            },
            user_email: non_empty("ASSISTANT_USER_EMAIL"),
        }
    }
}

/// True when `ASSISTANT_LOG_JSON` asks for JSON log lines
pub fn log_json_from_env() -> bool {
    std::env::var("ASSISTANT_LOG_JSON").is_ok_and(|v| is_truthy(&v))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parse a variable, keeping the default when it is unset or malformed
fn parse_or<T>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    if let Ok(value) = raw.trim().parse() {
        value
    } else {
        tracing::warn!(key, value = %raw, default = %default, "Ignoring invalid setting");
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]);

        assert!(config.assistant.anthropic_api_key.is_none());
        assert!(!config.assistant.has_live_backend());
        assert_eq!(config.assistant.max_tokens, 4096);
        assert_eq!(config.assistant.simulated_delay, Duration::from_millis(1000));
        assert_eq!(config.controller.response_timeout, Duration::from_secs(120));
        assert!(config.user_email.is_none());
    }

    #[test]
    fn test_values_are_read() {
        let config = config_from(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("ASSISTANT_MODEL", "claude-3-5-haiku-20241022"),
            ("ASSISTANT_MAX_TOKENS", "1024"),
            ("ASSISTANT_TIMEOUT_SECS", "30"),
            ("ASSISTANT_SIMULATED_DELAY_MS", "0"),
            ("ASSISTANT_USER_EMAIL", "dev@example.com"),
        ]);

        assert_eq!(config.assistant.anthropic_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.assistant.model, "claude-3-5-haiku-20241022");
        assert_eq!(config.assistant.max_tokens, 1024);
        assert_eq!(config.assistant.simulated_delay, Duration::ZERO);
        assert_eq!(config.controller.response_timeout, Duration::from_secs(30));
        assert_eq!(config.user_email.as_deref(), Some("dev@example.com"));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config_from(&[
            ("ASSISTANT_MAX_TOKENS", "lots"),
            ("ASSISTANT_TIMEOUT_SECS", "-5"),
        ]);

        assert_eq!(config.assistant.max_tokens, 4096);
        assert_eq!(config.controller.response_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = config_from(&[("ANTHROPIC_API_KEY", "  "), ("ASSISTANT_MODEL", "")]);

        assert!(config.assistant.anthropic_api_key.is_none());
        assert_eq!(config.assistant.model, AssistantConfig::default().model);
    }

    #[test]
    fn test_truthy_values() {
        assert!(is_truthy("1"));
        assert!(is_truthy(" TRUE "));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
    }
}
