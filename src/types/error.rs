use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors reported by an object store backend
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("The specified key does not exist: {key}")]
    NotFound { key: String },

    #[error("{code}: {message}")]
    Service { code: String, message: String },
}

impl StoreError {
    pub fn not_found<S: Into<String>>(key: S) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn service<C: Into<String>, M: Into<String>>(code: C, message: M) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by the filesystem adapter to its callers
#[derive(Debug, Error)]
pub enum FsError {
    #[error("{path}: file does not exist")]
    NotExist { path: String },

    #[error("upstream error {code}: {message}")]
    Upstream { code: String, message: String },

    #[error("content length mismatch: expected {expected} bytes, received {actual}")]
    ContentLengthMismatch { expected: u64, actual: u64 },

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    #[error("invalid seek to offset {offset}")]
    InvalidSeek { offset: i128 },
}

impl FsError {
    pub fn not_exist<S: Into<String>>(path: S) -> Self {
        Self::NotExist { path: path.into() }
    }

    /// Whether this error is worth logging as a failure
    pub fn is_failure(&self) -> bool {
        !matches!(self, FsError::NotExist { .. })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            FsError::NotExist { .. } => StatusCode::NOT_FOUND,
            FsError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            FsError::ContentLengthMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            FsError::UnsupportedOperation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FsError::InvalidSeek { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> String {
        match self {
            FsError::NotExist { .. } => "404 page not found".to_string(),
            FsError::Upstream { code, message } => format!("{}: {}", code, message),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for FsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { key } => FsError::NotExist { path: key },
            StoreError::Service { code, message } => FsError::Upstream { code, message },
        }
    }
}

impl IntoResponse for FsError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            [("content-type", "text/plain; charset=utf-8")],
            self.body(),
        )
            .into_response()
    }
}
