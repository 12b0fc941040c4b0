//! Environment-supplied configuration for the remote chat-completions
//! service. The endpoint, key, and model identifiers are injected, never
//! hard-coded.

use std::env;

pub const DEFAULT_FAST_MODEL: &str = "Llama-3.3-70B-Instruct";
pub const DEFAULT_REASONING_MODEL: &str = "DeepSeek-R1";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the chat-completions service, without the endpoint path.
    pub base_url: String,
    pub api_key: String,
    /// Lightweight model used for classification and template responses.
    pub fast_model: String,
    /// Larger model used for full persona generation.
    pub reasoning_model: String,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup. `from_env` wires
    /// this to the process environment; tests supply their own lookup.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let api_key = lookup("BODHI_API_KEY").filter(|v| !v.is_empty()).ok_or(
            "BODHI_API_KEY environment variable not set

Please set your API key:
export BODHI_API_KEY=\"your-api-key-here\"",
        )?;

        let base_url = lookup("BODHI_BASE_URL").filter(|v| !v.is_empty()).ok_or(
            "BODHI_BASE_URL environment variable not set

Please set the service base URL:
export BODHI_BASE_URL=\"https://your-endpoint.example.com/models\"",
        )?;

        let fast_model =
            lookup("BODHI_FAST_MODEL").unwrap_or_else(|| DEFAULT_FAST_MODEL.to_string());
        let reasoning_model = lookup("BODHI_REASONING_MODEL")
            .unwrap_or_else(|| DEFAULT_REASONING_MODEL.to_string());

        Ok(Config {
            base_url,
            api_key,
            fast_model,
            reasoning_model,
        })
    }

    /// Apply command-line model overrides on top of the environment values.
    pub fn apply_overrides(&mut self, fast: Option<String>, reasoning: Option<String>) {
        if let Some(model) = fast {
            self.fast_model = model;
        }
        if let Some(model) = reasoning {
            self.reasoning_model = model;
        }
    }
}
