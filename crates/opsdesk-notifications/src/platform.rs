use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::NotificationError;

/// Outcome of a notification permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// The user dismissed the prompt without deciding
    Default,
}

/// The platform push service of the hosting surface.
#[async_trait]
pub trait PushPlatform: Send + Sync {
    /// Whether this surface can receive push messages at all
    fn is_supported(&self) -> bool;

    /// Prompt for permission; returns the stored decision if already made
    async fn request_permission(&self) -> Result<PermissionState, NotificationError>;

    /// Obtain a registration handle scoped to the public key credential
    async fn get_token(&self, vapid_key: &str) -> Result<String, NotificationError>;

    /// Revoke the current registration handle
    async fn delete_token(&self) -> Result<(), NotificationError>;
}

/// Platform for headless hosts that were handed a registration up front.
///
/// Permission is considered granted exactly when a token is configured.
pub struct StaticTokenPlatform {
    token: Mutex<Option<String>>,
}

impl StaticTokenPlatform {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Mutex::new(token.filter(|t| !t.is_empty())),
        }
    }
}

#[async_trait]
impl PushPlatform for StaticTokenPlatform {
    fn is_supported(&self) -> bool {
        true
    }

    async fn request_permission(&self) -> Result<PermissionState, NotificationError> {
        Ok(if self.token.lock().is_some() {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        })
    }

    async fn get_token(&self, _vapid_key: &str) -> Result<String, NotificationError> {
        self.token
            .lock()
            .clone()
            .ok_or(NotificationError::PermissionDenied)
    }

    async fn delete_token(&self) -> Result<(), NotificationError> {
        self.token.lock().take();
        Ok(())
    }
}
