#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("State store error: {0}")]
    State(String),
    #[error("Scan failed: {0}")]
    Scan(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
