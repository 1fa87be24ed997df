use chaincore::ChainError;
use std::time::Duration;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant for function routing.";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for the registry and its execution engine
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Upper bound on steps per run; `None` lets a cyclic graph run forever
    pub max_steps: Option<usize>,
    /// Deadline for a single classifier call
    pub routing_timeout: Option<Duration>,
    pub event_buffer_size: usize,
    /// Role text for routing nodes that do not set their own
    pub system_prompt: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_steps: Some(1000),
            routing_timeout: None,
            event_buffer_size: 1000,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Settings for the chat-completions classifier
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: 5000,
        }
    }
}

impl ClassifierConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Read `OPENAI_API_KEY` (required), `OPENAI_BASE_URL` and `CHAIN_ROUTER_MODEL`.
    pub fn from_env() -> Result<Self, ChainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ChainError> {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ChainError::Configuration(
                    "API key must be provided via the OPENAI_API_KEY environment variable"
                        .to_string(),
                )
            })?;

        let mut config = Self::new(api_key);
        if let Some(base) = lookup("OPENAI_BASE_URL") {
            config.api_base = base;
        }
        if let Some(model) = lookup("CHAIN_ROUTER_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}
