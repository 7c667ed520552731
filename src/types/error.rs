use thiserror::Error;

/// Errors that can occur in the realtime session layer.
#[derive(Error, Debug)]
pub enum SessionError {
    /// WebSocket protocol error (connection failed, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// General connection error with descriptive message
    #[error("connection error: {0}")]
    Connection(String),

    /// Authentication or credential-renewal error
    #[error("authentication error: {0}")]
    Auth(String),

    /// JSON serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request error (credential renewal call)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error (malformed endpoint URL)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// The outbound queue is at capacity; the frame was rejected, queued
    /// frames were not displaced
    #[error("outbound queue full")]
    QueueFull,

    /// Attempted operation while not connected to the server
    #[error("not connected")]
    NotConnected,

    /// Room-level error (not joined, unknown participant, etc.)
    #[error("room error: {0}")]
    Room(String),
}

/// Convenience type alias for `Result<T, SessionError>`.
pub type Result<T> = std::result::Result<T, SessionError>;
