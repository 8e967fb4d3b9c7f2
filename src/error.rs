use thiserror::Error;

use crate::tree::search::SearchMode;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types. All of them are startup failures.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from terminal or log file setup.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors from a single backend request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS or body transfer failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Still unauthorized after one credential refresh.
    #[error("unauthorized (token rejected)")]
    Unauthorized,

    /// The request did not finish within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The response body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A directory listing could not be fetched. The cache is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load folder '{}': {}", display_path(.path), .cause)]
pub struct LoadError {
    pub path: String,
    pub cause: String,
}

impl LoadError {
    pub fn new(path: impl Into<String>, cause: impl ToString) -> Self {
        Self {
            path: path.into(),
            cause: cause.to_string(),
        }
    }
}

/// A filename or content search request failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{mode} search failed: {cause}")]
pub struct SearchError {
    pub mode: SearchMode,
    pub cause: String,
}

/// A confirmed move was refused or could not be sent.
#[derive(Debug, Error)]
pub enum MoveError {
    /// The backend replied `success: false`.
    #[error("move failed: {message}")]
    Rejected { message: String },

    /// The request itself failed.
    #[error("move error: {0}")]
    Request(#[from] ApiError),
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "log dir missing");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.to_string().contains("log dir missing"));
    }

    #[test]
    fn terminal_error_display() {
        let err = AppError::Terminal("failed to enter raw mode".into());
        assert_eq!(err.to_string(), "Terminal error: failed to enter raw mode");
    }

    #[test]
    fn config_error_display() {
        let err = AppError::Config("no server url".into());
        assert_eq!(err.to_string(), "Configuration error: no server url");
    }

    #[test]
    fn load_error_names_root_as_slash() {
        let err = LoadError::new("", "HTTP 500");
        assert_eq!(err.to_string(), "failed to load folder '/': HTTP 500");
        let err = LoadError::new("packages", "timeout");
        assert_eq!(err.to_string(), "failed to load folder 'packages': timeout");
    }

    #[test]
    fn search_error_mentions_mode() {
        let err = SearchError {
            mode: SearchMode::Content,
            cause: "HTTP 502".into(),
        };
        assert_eq!(err.to_string(), "content search failed: HTTP 502");
    }

    #[test]
    fn status_error_shows_backend_message() {
        let err = ApiError::Status {
            status: 403,
            message: "Protected".into(),
        };
        assert_eq!(err.to_string(), "Protected");
        let err: MoveError = err.into();
        assert_eq!(err.to_string(), "move error: Protected");
    }

    #[test]
    fn rejected_move_display() {
        let err = MoveError::Rejected {
            message: "Invalid path or exists".into(),
        };
        assert_eq!(err.to_string(), "move failed: Invalid path or exists");
    }
}
