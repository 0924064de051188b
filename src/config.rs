//! Configuration management.
//!
//! Configuration is set via environment variables:
//! - `GROQ_API_KEY` - Required. Bearer token for the Groq API.
//! - `GROQ_MODEL` - Optional. Chat model identifier. Defaults to `gemma2-9b-it`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `MAX_STEPS` - Optional. Agent loop step ceiling. Defaults to `8`.
//! - `MAX_PARSE_RETRIES` - Optional. Consecutive unparseable-reply budget. Defaults to `3`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Bounds on a single agent loop run.
#[derive(Debug, Clone, Copy)]
pub struct AgentLimits {
    /// Maximum number of model calls (thinking steps) per run.
    pub max_steps: usize,

    /// Consecutive unparseable model replies tolerated before the run fails.
    pub max_parse_retries: usize,
}

impl Default for AgentLimits {
    fn default() -> Self {
        Self {
            max_steps: 8,
            max_parse_retries: 3,
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Groq API key
    pub api_key: String,

    /// Chat model identifier
    pub model: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Agent loop bounds
    pub limits: AgentLimits,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `GROQ_API_KEY` is not set.
    /// A missing credential halts the process before any agent run starts.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GROQ_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("GROQ_API_KEY".to_string()))?;

        let model = std::env::var("GROQ_MODEL").unwrap_or_else(|_| "gemma2-9b-it".to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let max_steps = std::env::var("MAX_STEPS")
            .unwrap_or_else(|_| "8".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("MAX_STEPS".to_string(), format!("{}", e)))?;

        let max_parse_retries = std::env::var("MAX_PARSE_RETRIES")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("MAX_PARSE_RETRIES".to_string(), format!("{}", e))
            })?;

        Ok(Self {
            api_key,
            model,
            host,
            port,
            limits: AgentLimits {
                max_steps,
                max_parse_retries,
            },
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            host: "127.0.0.1".to_string(),
            port: 3000,
            limits: AgentLimits::default(),
        }
    }
}
