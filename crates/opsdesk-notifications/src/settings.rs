use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::NotificationError;

/// Push subsystem settings, usually the `[push]` table of `opsdesk.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSettings {
    /// Identifies this app on an account profile shared with other apps
    #[serde(default = "default_app_id")]
    pub app_id: String,

    /// Public key credential the registration is scoped to
    #[serde(default)]
    pub vapid_key: Option<String>,

    /// Broadcast topic privileged operators are subscribed to
    #[serde(default = "default_broadcast_topic")]
    pub broadcast_topic: String,

    #[serde(default = "default_privileged_roles")]
    pub privileged_roles: Vec<String>,

    /// How long a toast stays visible without interaction
    #[serde(default = "default_toast_ttl_ms")]
    pub toast_ttl_ms: u64,
}

fn default_app_id() -> String {
    "opsdesk-dashboard".into()
}

fn default_broadcast_topic() -> String {
    "admin_notifications".into()
}

fn default_privileged_roles() -> Vec<String> {
    vec!["admin".into(), "super_admin".into()]
}

fn default_toast_ttl_ms() -> u64 {
    8_000
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            app_id: default_app_id(),
            vapid_key: None,
            broadcast_topic: default_broadcast_topic(),
            privileged_roles: default_privileged_roles(),
            toast_ttl_ms: default_toast_ttl_ms(),
        }
    }
}

impl PushSettings {
    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }

    pub fn validate(&self) -> Result<(), NotificationError> {
        let invalid = |msg: &str| Err(NotificationError::InvalidConfig(msg.to_string()));
        if self.app_id.trim().is_empty() {
            return invalid("push.app_id must not be empty");
        }
        if self.broadcast_topic.trim().is_empty() {
            return invalid("push.broadcast_topic must not be empty");
        }
        if self.toast_ttl_ms == 0 {
            return invalid("push.toast_ttl_ms must be > 0");
        }
        Ok(())
    }
}
