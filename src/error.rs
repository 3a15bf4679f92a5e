use thiserror::Error;

#[derive(Error, Debug)]
pub enum CohortLensError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Could not decode records from {origin}: {source}")]
    DecodeError {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CohortLensError>;
