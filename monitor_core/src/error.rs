use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Collection failed: {0}")]
    Collection(String),

    #[error("Collection timed out after {0:?}")]
    CollectionTimeout(Duration),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Violation channel full, dropped violation for {0}")]
    ChannelFull(String),

    #[error("Violation channel closed")]
    ChannelClosed,

    #[error("Dispatch to '{destination}' failed: {reason}")]
    Dispatch { destination: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MonitorError {
    pub fn dispatch(destination: impl Into<String>, reason: impl ToString) -> Self {
        MonitorError::Dispatch {
            destination: destination.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
