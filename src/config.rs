use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use teloxide::types::ChatId;

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_DATABASE_PATH: &str = "data.db";
const DEFAULT_PORT: u16 = 10000;
const DEFAULT_LOG_DIR: &str = "logs";

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    Missing(&'static str),
    /// A variable is set but its value can't be used.
    Invalid { var: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(var) => write!(f, "required environment variable {var} is not set"),
            Self::Invalid { var, reason } => write!(f, "invalid value for {var}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    pub telegram_token: String,
    pub groq_api_key: String,
    /// Base URL of the OpenAI-compatible API, without the `/chat/completions` suffix.
    pub groq_api_url: String,
    pub groq_model: String,
    pub completion_timeout: Duration,
    pub database_path: PathBuf,
    /// Port of the liveness endpoint.
    pub port: u16,
    pub log_dir: PathBuf,
    /// Operator chat that receives WARN/ERROR logs.
    pub log_chat_id: Option<ChatId>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let telegram_token = get("TELEGRAM_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_TOKEN"))?;
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        match telegram_token.split_once(':') {
            Some((id, secret)) if id.parse::<u64>().is_ok() && !secret.is_empty() => {}
            _ => {
                return Err(ConfigError::Invalid {
                    var: "TELEGRAM_TOKEN",
                    reason: "expected format 123456789:ABCdefGHI...".into(),
                });
            }
        }

        let groq_api_key = get("GROQ_API_KEY").ok_or(ConfigError::Missing("GROQ_API_KEY"))?;

        let groq_api_url = get("GROQ_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !groq_api_url.starts_with("http://") && !groq_api_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                var: "GROQ_API_URL",
                reason: format!("'{groq_api_url}' is not an http(s) URL"),
            });
        }

        let timeout_secs = match get("COMPLETION_TIMEOUT_SECS") {
            Some(raw) => parse_number::<u64>("COMPLETION_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "COMPLETION_TIMEOUT_SECS",
                reason: "must be at least 1".into(),
            });
        }

        let port = match get("PORT") {
            Some(raw) => parse_number::<u16>("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let log_chat_id = get("LOG_CHAT_ID")
            .map(|raw| parse_number::<i64>("LOG_CHAT_ID", &raw))
            .transpose()?
            .map(ChatId);

        Ok(Self {
            telegram_token,
            groq_api_key,
            groq_api_url,
            groq_model: get("GROQ_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            completion_timeout: Duration::from_secs(timeout_secs),
            database_path: PathBuf::from(
                get("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            ),
            port,
            log_dir: PathBuf::from(get("LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string())),
            log_chat_id,
        })
    }
}

fn parse_number<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        reason: format!("'{raw}': {e}"),
    })
}
