use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("missing credential: {0} must be set")]
    MissingCredential(&'static str),

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("invalid report window: start {start} must be before end {end}")]
    InvalidDateRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid or unexpected response format")]
    InvalidResponse,

    #[error("authentication failed: {0}")]
    Authentication(ApiError),

    #[error("api rejected request: {0}")]
    Api(#[from] ApiError),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request (400): {0}")]
    BadRequest(String),

    #[error("unauthorized (401): {0}")]
    Unauthorized(String),

    #[error("forbidden (403): {0}")]
    Forbidden(String),

    #[error("not found (404): {0}")]
    NotFound(String),

    #[error("rate limited (429): {0}")]
    TooManyRequests(String),

    #[error("server error ({status}): {message}")]
    Server {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("unexpected status {status}: {message}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        message: String,
    },
}

impl ApiError {
    /// Classify a non-success status together with the server's message.
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        use reqwest::StatusCode;
        match status {
            StatusCode::BAD_REQUEST => ApiError::BadRequest(message),
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::FORBIDDEN => ApiError::Forbidden(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ApiError::TooManyRequests(message),
            s if s.is_server_error() => ApiError::Server { status, message },
            _ => ApiError::UnexpectedStatus { status, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn classifies_statuses() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, "nope".into()),
            ApiError::Unauthorized(m) if m == "nope"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, String::new()),
            ApiError::Server { status: StatusCode::BAD_GATEWAY, .. }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, String::new()),
            ApiError::UnexpectedStatus { .. }
        ));
    }
}
