use thiserror::Error;

/// Every failure on the request path. The `Display` text is the message
/// surfaced to callers; no structured codes beyond the variant.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Request cancelled")]
    Cancelled,
}

pub type ApiResult<T> = Result<T, ApiError>;
