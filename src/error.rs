use thiserror::Error;

#[derive(Debug, Error)]
pub enum WasteSortError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Image error: {0}")]
    ImageError(String),
    #[error("Detector error: {0}")]
    DetectorError(String),
    #[error("Service error {status}: {message}")]
    ServiceError { status: u16, message: String },
    #[error("All {attempts} credentials failed; last error: {last}")]
    PoolExhausted {
        attempts: usize,
        last: Box<WasteSortError>,
    },
    #[error("Strategy unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for WasteSortError {
    fn from(err: serde_json::Error) -> Self {
        WasteSortError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for WasteSortError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => WasteSortError::ServiceError {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => WasteSortError::RequestError(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, WasteSortError>;
