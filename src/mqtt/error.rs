//! Error definitions for the broker connection

use thiserror::Error;

/// Errors raised while setting up or maintaining the broker connection
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The configured broker URL could not be parsed
    #[error("Invalid broker URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The URL names a transport this relay does not speak
    #[error("Unsupported broker scheme '{0}' (expected mqtt:// or tcp://)")]
    UnsupportedScheme(String),

    /// The publish topic is empty or contains a `+`/`#` wildcard
    #[error("Invalid publish topic '{0}': must be non-empty and free of '+' and '#'")]
    InvalidTopic(String),

    /// The transport reported a failure while polling the connection
    #[error("Broker transport error: {0}")]
    Transport(#[from] rumqttc::ConnectionError),
}

/// Errors returned by a single publish attempt
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// No live broker session, the publish was not attempted
    #[error("Not connected to broker")]
    NotConnected,

    /// The event loop did not take the request (queue full or loop stopped)
    #[error("Outgoing request queue is full")]
    QueueFull,

    /// The transport rejected the message
    #[error("Transport rejected publish: {0}")]
    Transport(String),
}

impl From<rumqttc::ClientError> for PublishError {
    fn from(err: rumqttc::ClientError) -> Self {
        match err {
            rumqttc::ClientError::TryRequest(_) => PublishError::QueueFull,
            other => PublishError::Transport(other.to_string()),
        }
    }
}
