//! Runtime configuration
//!
//! Everything is read once at startup (after `.env` has been loaded) into an
//! immutable [`Config`] that is handed to each component. Nothing here is a
//! global: tests build configs from an in-memory lookup instead of touching
//! the process environment.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use url::Url;

use crate::error::ConfigError;

/// Practicum OAuth token
pub const PRACTICUM_TOKEN: &str = "PRACTICUM_TOKEN";
/// Telegram bot token
pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
/// Chat that receives the notifications
pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

pub const PRACTICUM_ENDPOINT: &str = "PRACTICUM_ENDPOINT";
pub const RETRY_PERIOD_SECS: &str = "RETRY_PERIOD_SECS";
pub const REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";
pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const LOG_FILE_PATH: &str = "LOG_FILE_PATH";

/// Required variables, in the order they are checked.
pub const REQUIRED_VARS: [&str; 3] = [PRACTICUM_TOKEN, TELEGRAM_TOKEN, TELEGRAM_CHAT_ID];

pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// Delay between two polls (in seconds)
pub const DEFAULT_RETRY_PERIOD_SECS: u64 = 600; // 10 minutes

/// Timeout for a single HTTP request (in seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where notifications go: a numeric chat id or a public `@channel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatTarget {
    Id(i64),
    Username(String),
}

impl FromStr for ChatTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<i64>() {
            return Ok(ChatTarget::Id(id));
        }
        match s.strip_prefix('@') {
            Some(name) if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
                Ok(ChatTarget::Username(s.to_string()))
            }
            _ => Err(format!("expected a numeric chat id or @channel, got {:?}", s)),
        }
    }
}

impl fmt::Display for ChatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatTarget::Id(id) => write!(f, "{}", id),
            ChatTarget::Username(name) => f.write_str(name),
        }
    }
}

/// Bot configuration
#[derive(Clone)]
pub struct Config {
    pub practicum_token: String,
    pub telegram_token: String,
    pub chat: ChatTarget,
    pub endpoint: Url,
    pub retry_period: Duration,
    pub request_timeout: Duration,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// A missing required variable is logged at error level (the process
    /// is expected to stop right after) and returned as
    /// [`ConfigError::MissingVar`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let result = Self::build(&lookup);
        if let Err(ref e) = result {
            log::error!("{}. Program is stopped.", e);
        }
        result
    }

    fn build<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let practicum_token = required(lookup, PRACTICUM_TOKEN)?;
        let telegram_token = required(lookup, TELEGRAM_TOKEN)?;
        let chat = required(lookup, TELEGRAM_CHAT_ID)?
            .parse::<ChatTarget>()
            .map_err(|reason| ConfigError::InvalidVar {
                name: TELEGRAM_CHAT_ID,
                reason,
            })?;

        let endpoint = optional(lookup, PRACTICUM_ENDPOINT).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = Url::parse(&endpoint).map_err(|e| ConfigError::InvalidVar {
            name: PRACTICUM_ENDPOINT,
            reason: e.to_string(),
        })?;

        let retry_period = seconds(lookup, RETRY_PERIOD_SECS, DEFAULT_RETRY_PERIOD_SECS)?;
        let request_timeout = seconds(lookup, REQUEST_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS)?;

        Ok(Self {
            practicum_token,
            telegram_token,
            chat,
            endpoint,
            retry_period,
            request_timeout,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("practicum_token", &redact(&self.practicum_token))
            .field("telegram_token", &redact(&self.telegram_token))
            .field("chat", &self.chat)
            .field("endpoint", &self.endpoint.as_str())
            .field("retry_period", &self.retry_period)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Logger settings.
///
/// Kept apart from [`Config`] because the logger has to be up before the
/// required variables are checked, so that a missing token gets logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LevelFilter,
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::Debug,
            file: None,
        }
    }
}

impl LogSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let level = match optional(&lookup, LOG_LEVEL) {
            Some(raw) => raw.parse::<LevelFilter>().map_err(|_| ConfigError::InvalidVar {
                name: LOG_LEVEL,
                reason: format!("unknown log level {:?}", raw),
            })?,
            None => LevelFilter::Debug,
        };
        let file = optional(&lookup, LOG_FILE_PATH).map(PathBuf::from);

        Ok(Self { level, file })
    }
}

/// Masks a secret for logging, keeping only the last four characters.
pub fn redact(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{}", tail)
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or(ConfigError::MissingVar(name))
}

fn seconds<F>(lookup: &F, name: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match optional(lookup, name) {
        Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::InvalidVar {
            name,
            reason: e.to_string(),
        })?,
        None => default,
    };
    if secs == 0 {
        return Err(ConfigError::InvalidVar {
            name,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}
