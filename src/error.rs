//! Application error types

use serde_json::Value;
use thiserror::Error;

/// Error raised by the domain API clients.
///
/// Every client maps transport failures, non-2xx responses, and rejected
/// `{success, data}` envelopes into this type so callers can branch on
/// `status_code()` uniformly.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-2xx HTTP response, body parsed best-effort.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    /// 200 response whose envelope carried `success: false`.
    #[error("API rejected request: {message}")]
    Envelope {
        message: String,
        body: Option<Value>,
    },

    /// No usable response was received (DNS, connect, body read, bad JSON).
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// HTTP status of the failed request, when one was received.
    ///
    /// Envelope rejections arrive on a 200 and are business-level failures,
    /// so they report no status either.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ApiError::Http {
                status: status.as_u16(),
                message: err.to_string(),
                body: None,
            },
            None => ApiError::Transport(err.to_string()),
        }
    }
}

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Status code of the underlying API failure, if this is one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AppError::Api(api) => api.status_code(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
