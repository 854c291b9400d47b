use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
