//! Runtime configuration.
//!
//! Values come from the process environment (optionally primed from a `.env`
//! file) using the `CALMLY_` prefix, and are validated before the server starts.

use crate::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;
use validator::Validate;

const ENV_PREFIX: &str = "CALMLY_";

/// Connection settings for the OpenAI-compatible inference API.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

/// Top-level service configuration.
#[derive(Debug, Clone, Validate)]
pub struct AppConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
    #[validate(length(min = 1))]
    pub database_url: String,
    #[validate(length(min = 1))]
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    #[validate(length(min = 1))]
    pub llm_model: String,
    #[validate(range(min = 1, max = 300))]
    pub llm_timeout_secs: u64,
    #[validate(range(min = 1, max = 10000))]
    pub queue_capacity: usize,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            database_url: "sqlite://data/calmly.sqlite".to_string(),
            llm_base_url: "http://localhost:8080/v1".to_string(),
            llm_api_key: None,
            llm_model: "llama-3.3-70b".to_string(),
            llm_timeout_secs: 30,
            queue_capacity: 256,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads `.env` (if any) and then reads the `CALMLY_*` environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        // A missing .env file is the normal production case.
        let _ = dotenv::dotenv();
        Self::from_vars()
    }

    /// Builds the configuration from the current process environment only.
    pub fn from_vars() -> Result<Self, AppError> {
        let defaults = Self::default();
        let config = Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT")?.unwrap_or(defaults.port),
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            llm_base_url: var("LLM_BASE_URL").unwrap_or(defaults.llm_base_url),
            llm_api_key: var("LLM_API_KEY"),
            llm_model: var("LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_timeout_secs: parse_var("LLM_TIMEOUT_SECS")?.unwrap_or(defaults.llm_timeout_secs),
            queue_capacity: parse_var("QUEUE_CAPACITY")?.unwrap_or(defaults.queue_capacity),
            log_level: var("LOG_LEVEL").unwrap_or(defaults.log_level),
        };
        config.check()?;
        Ok(config)
    }

    /// Field validation plus the checks `validator` cannot express.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|e| AppError::Config(format!("Invalid configuration: {}", e)))?;
        Url::parse(&self.llm_base_url)?;
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            base_url: self.llm_base_url.clone(),
            api_key: self.llm_api_key.clone(),
            model: self.llm_model.clone(),
            timeout: Duration::from_secs(self.llm_timeout_secs),
        }
    }
}

/// Reads `CALMLY_<name>`, treating blank values as unset.
fn var(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}{name}"))
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>, AppError> {
    match var(name) {
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            AppError::Config(format!("{ENV_PREFIX}{name} has an invalid value: {raw}"))
        }),
        None => Ok(None),
    }
}
