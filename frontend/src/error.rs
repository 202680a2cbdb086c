// frontend/src/error.rs

use observatory_shared::ControlDecodeError;

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid control frame: {0}")]
    Control(#[from] ControlDecodeError),

    /// Application-level failure: the reply carried a non-empty `error`.
    #[error("{0}")]
    Server(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{}", .0.message())]
    Geolocation(crate::tools::GeolocationError),

    #[error("control channel is not connected")]
    NotConnected,

    #[error("protocol error: {0}")]
    Protocol(String),
}
