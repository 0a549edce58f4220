use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// The OpenAI-compatible providers the oracle can talk to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Gemini,
    Groq,
}

impl Provider {
    /// Base URL of the provider's OpenAI-compatible API.
    pub fn api_base(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
            Provider::Groq => "https://api.groq.com/openai/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAI => "gpt-4o",
            Provider::Gemini => "gemini-2.0-flash",
            Provider::Groq => "llama3-8b-8192",
        }
    }

    fn key_var(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::Groq => "GROQ_API_KEY",
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub provider: Provider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub chat_model: String,
    pub rounds: u32,
    pub classroom_path: Option<PathBuf>,
    /// `None` when the per-call deadline is disabled.
    pub oracle_timeout: Option<Duration>,
    pub seed: Option<u64>,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// API keys are not checked here, so offline runs can load a config
    /// without any credentials; see [`Config::api_key`].
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let provider_str = std::env::var("ORACLE_PROVIDER").unwrap_or_else(|_| "groq".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "openai" => Provider::OpenAI,
            "gemini" => Provider::Gemini,
            "groq" => Provider::Groq,
            other => {
                return Err(ConfigError::InvalidValue(
                    "ORACLE_PROVIDER".to_string(),
                    format!("'{}' is not one of openai, gemini, groq", other),
                ));
            }
        };

        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();
        let groq_api_key = std::env::var("GROQ_API_KEY").ok();

        let chat_model = std::env::var("CHAT_MODEL")
            .unwrap_or_else(|_| provider.default_model().to_string());

        let rounds = parse_var("SIMULATION_ROUNDS", 3u32)?;
        if rounds == 0 {
            return Err(ConfigError::InvalidValue(
                "SIMULATION_ROUNDS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let classroom_path = std::env::var("CLASSROOM_PATH").ok().map(PathBuf::from);

        let timeout_secs = parse_var("ORACLE_TIMEOUT_SECS", 60u64)?;
        let oracle_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        let seed = match std::env::var("SIMULATION_SEED") {
            Ok(value) => Some(value.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("SIMULATION_SEED".to_string(), e.to_string())
            })?),
            Err(_) => None,
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            provider,
            openai_api_key,
            gemini_api_key,
            groq_api_key,
            chat_model,
            rounds,
            classroom_path,
            oracle_timeout,
            seed,
            log_level,
        })
    }

    /// The API key for the configured provider.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        let key = match self.provider {
            Provider::OpenAI => &self.openai_api_key,
            Provider::Gemini => &self.gemini_api_key,
            Provider::Groq => &self.groq_api_key,
        };
        key.as_deref().ok_or_else(|| {
            ConfigError::MissingVar(format!(
                "{} must be set for the selected provider",
                self.provider.key_var()
            ))
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
