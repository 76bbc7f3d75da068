use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("API error: {0}")]
    ApiError(#[from] ApiError),

    #[error("Token store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("I/O error: {0}")]
    IoError(std::io::Error),
}

impl AppError {
    /// True when the request was cancelled by the caller rather than failed by the server.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::ApiError(ApiError::Cancelled))
    }

    /// HTTP status reported by the server, if this error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AppError::ApiError(e) => e.status(),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ApiError(ApiError::Transport(err))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::ApiError(ApiError::InvalidUrl(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::StoreError(StoreError::Io(err))
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Only the owner can modify this todo")]
    NotOwner,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request was cancelled")]
    Cancelled,

    #[error("Server responded with {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Token refresh failed: {0}")]
    Refresh(Box<ApiError>),

    #[error("Invalid response body: {0}")]
    InvalidBody(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Refresh(inner) => inner.status(),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt store contents: {0}")]
    Corrupt(String),

    #[error("Store lock poisoned")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::StoreError(StoreError::Io(_))));

        let config_err = config::ConfigError::NotFound(String::from("key not found"));
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::ConfigError(_)));

        let url_err = url::Url::parse("not a url").unwrap_err();
        let app_err: AppError = url_err.into();
        assert!(matches!(app_err, AppError::ApiError(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_cancelled_is_distinguishable() {
        let cancelled = AppError::ApiError(ApiError::Cancelled);
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.status(), None);

        let unauthorized = AppError::ApiError(ApiError::Status {
            status: StatusCode::UNAUTHORIZED,
            body: String::new(),
        });
        assert!(!unauthorized.is_cancelled());
        assert_eq!(unauthorized.status(), Some(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_refresh_error_reports_inner_status() {
        let err = ApiError::Refresh(Box::new(ApiError::Status {
            status: StatusCode::FORBIDDEN,
            body: "revoked".into(),
        }));
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_error_display() {
        let err = AppError::ValidationError("test error".to_string());
        assert_eq!(err.to_string(), "Validation error: test error");

        let err = AppError::AuthError(AuthError::NotOwner);
        assert_eq!(
            err.to_string(),
            "Authentication error: Only the owner can modify this todo"
        );

        let err = AppError::ApiError(ApiError::Cancelled);
        assert_eq!(err.to_string(), "API error: Request was cancelled");

        let err = AppError::IoError(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        assert_eq!(err.to_string(), "I/O error: stdin closed");
        assert!(!err.is_cancelled());
    }
}
