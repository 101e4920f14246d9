//! Global configuration for Parley.
//!
//! Deserialized from `{data_dir}/config.toml` by parley-infra. Every field
//! has a default so a missing or partial file still yields a working config.

use serde::{Deserialize, Serialize};

/// Service-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Model used for chat turns.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Maximum tokens per chat completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature; None lets the provider pick.
    #[serde(default)]
    pub temperature: Option<f64>,

    /// Most-recent-N message window resent per turn; None resends the
    /// full history (the observed default behavior).
    #[serde(default)]
    pub context_window: Option<usize>,

    /// Model used by the offline `prompts` batch utility.
    #[serde(default = "default_prompt_model")]
    pub prompt_model: String,

    /// Token cap for each generated workflow prompt.
    #[serde(default = "default_prompt_max_tokens")]
    pub prompt_max_tokens: u32,
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_prompt_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_prompt_max_tokens() -> u32 {
    100
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: None,
            context_window: None,
            prompt_model: default_prompt_model(),
            prompt_max_tokens: default_prompt_max_tokens(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GlobalConfig::default();
        assert_eq!(config.default_model, "gpt-4");
        assert_eq!(config.max_tokens, 1024);
        assert!(config.temperature.is_none());
        assert!(config.context_window.is_none());
        assert_eq!(config.prompt_model, "gpt-4o-mini");
        assert_eq!(config.prompt_max_tokens, 100);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: GlobalConfig = toml::from_str("default_model = \"gpt-4o\"").unwrap();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.prompt_model, "gpt-4o-mini");
    }

    #[test]
    fn test_context_window_parses() {
        let config: GlobalConfig = toml::from_str("context_window = 20").unwrap();
        assert_eq!(config.context_window, Some(20));
    }
}
