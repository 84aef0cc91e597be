// Agent configuration
//
// AgentConfig can be:
// - Created directly or through AgentConfigBuilder
// - Deserialized from a config file (missing fields take their defaults)
// - Read from environment variables via `from_env`

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// Environment variable overriding `max_iterations`
pub const MAX_ITERATIONS_ENV: &str = "FRIZZ_MAX_ITERATIONS";

/// Environment variable providing the system prompt
pub const SYSTEM_PROMPT_ENV: &str = "FRIZZ_SYSTEM_PROMPT";

/// Configuration for an Agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum number of tool round-trips per turn (prevents infinite loops)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// System prompt placed at the start of every new conversation
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_max_iterations() -> usize {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            system_prompt: None,
        }
    }
}

impl AgentConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of tool round-trips
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the system prompt
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `FRIZZ_MAX_ITERATIONS`: maximum tool round-trips per turn (default: 10)
    /// - `FRIZZ_SYSTEM_PROMPT`: system prompt for new conversations (default: none)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_iterations = match lookup(MAX_ITERATIONS_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                AgentError::config(format!(
                    "{} must be a non-negative integer, got '{}'",
                    MAX_ITERATIONS_ENV, raw
                ))
            })?,
            None => default_max_iterations(),
        };

        let system_prompt = lookup(SYSTEM_PROMPT_ENV).filter(|s| !s.trim().is_empty());

        Ok(Self {
            max_iterations,
            system_prompt,
        })
    }
}

/// Builder for creating AgentConfig
#[derive(Debug, Default)]
pub struct AgentConfigBuilder {
    config: AgentConfig,
}

impl AgentConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Set max iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Build the configuration
    pub fn build(self) -> AgentConfig {
        self.config
    }
}
