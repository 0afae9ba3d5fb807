use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification permission was not granted")]
    PermissionDenied,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Backend request failed: {0}")]
    Backend(String),

    #[error("Backend returned HTTP {status}: {body}")]
    BackendStatus { status: u16, body: String },

    #[error("Malformed relay message: {0}")]
    MalformedRelay(String),
}

impl From<reqwest::Error> for NotificationError {
    fn from(e: reqwest::Error) -> Self {
        Self::Backend(e.to_string())
    }
}

impl From<serde_json::Error> for NotificationError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedRelay(e.to_string())
    }
}
