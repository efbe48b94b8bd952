use thiserror::Error;

/// Broad category of a failure, used by the poll loop for logging and by
/// callers that need to branch on what went wrong without matching text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Transport,
    Protocol,
    Shape,
    Semantic,
    Delivery,
}

/// Startup configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is unset or empty
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A variable is set but its value cannot be used
    #[error("invalid value for {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },
}

/// The API payload does not have the expected structure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("API response is not a JSON object, got {0}")]
    NotAMapping(&'static str),

    #[error("API response has no `homeworks` key")]
    MissingHomeworks,

    #[error("`homeworks` in API response is not a list, got {0}")]
    HomeworksNotAList(&'static str),

    #[error("homework record is malformed: {0}")]
    InvalidRecord(String),
}

/// Every failure the bot can run into.
///
/// Variants map onto a small closed set of [`ErrorKind`]s so the poll loop
/// (and tests) can tell a network hiccup from a payload problem.
#[derive(Error, Debug)]
pub enum BotError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Network or body decoding failure while talking to the API
    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-2xx status
    #[error("API endpoint {endpoint} returned HTTP {status}")]
    Status {
        status: reqwest::StatusCode,
        endpoint: String,
    },

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("no homework name in API response")]
    MissingHomeworkName,

    #[error("no status in API response")]
    MissingStatus,

    #[error("unknown work status: {0}")]
    UnknownStatus(String),

    /// Telegram refused or failed to deliver a message
    #[error("failed to deliver Telegram message: {0}")]
    Delivery(#[from] teloxide::RequestError),
}

impl BotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BotError::Config(_) => ErrorKind::Config,
            BotError::Transport(_) => ErrorKind::Transport,
            BotError::Status { .. } => ErrorKind::Protocol,
            BotError::Shape(_) => ErrorKind::Shape,
            BotError::MissingHomeworkName | BotError::MissingStatus | BotError::UnknownStatus(_) => {
                ErrorKind::Semantic
            }
            BotError::Delivery(_) => ErrorKind::Delivery,
        }
    }
}

/// Type alias for Result with BotError
pub type BotResult<T> = Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_semantic_messages() {
        assert_eq!(
            BotError::MissingHomeworkName.to_string(),
            "no homework name in API response"
        );
        assert_eq!(BotError::MissingStatus.to_string(), "no status in API response");
        assert_eq!(
            BotError::UnknownStatus("bogus".to_string()).to_string(),
            "unknown work status: bogus"
        );
    }

    #[test]
    fn test_status_error_embeds_code() {
        let err = BotError::Status {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            endpoint: "https://example.com/api/".to_string(),
        };
        assert!(err.to_string().contains("503"));
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(BotError::from(ConfigError::MissingVar("X")).kind(), ErrorKind::Config);
        assert_eq!(BotError::from(ShapeError::MissingHomeworks).kind(), ErrorKind::Shape);
        assert_eq!(BotError::UnknownStatus("x".into()).kind(), ErrorKind::Semantic);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::Protocol.to_string(), "protocol");
        assert_eq!(ErrorKind::Delivery.to_string(), "delivery");
    }
}
