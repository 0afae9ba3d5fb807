//! The two inbound delivery channels.
//!
//! ```text
//!  platform push ──► ForegroundChannel ──┐
//!                                        ├──► MessageListener ──► sink
//!  RelayWorker ────► RelayChannel ───────┘
//! ```
//!
//! Both are broadcast channels: every attached surface gets its own copy, and
//! nothing crosses between the worker and a surface except these messages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::NotificationError;
use crate::types::NotificationEvent;

/// Events beyond this limit are dropped for slow receivers.
const DEFAULT_BUFFER_SIZE: usize = 256;

/// Message posted by the background worker to open surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelayMessage {
    /// Copy of a push the worker intercepted
    #[serde(rename = "FCM_PUSH")]
    Push {
        #[serde(default)]
        title: String,
        #[serde(default)]
        body: String,
        #[serde(default)]
        data: HashMap<String, String>,
    },

    /// The user activated a notification the worker rendered
    #[serde(rename = "FCM_NOTIFICATION_CLICK")]
    NotificationClick { url: String },

    /// Anything else the worker posts; ignored by the listener
    #[serde(other)]
    Other,
}

impl RelayMessage {
    pub fn push(event: NotificationEvent) -> Self {
        Self::Push {
            title: event.title,
            body: event.body,
            data: event.data,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, NotificationError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// In-process delivery used while the surface has focus.
#[derive(Clone)]
pub struct ForegroundChannel {
    sender: broadcast::Sender<NotificationEvent>,
}

impl ForegroundChannel {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_BUFFER_SIZE);
        Self { sender }
    }

    /// Deliver a message; returns how many listeners received it.
    pub fn deliver(&self, event: NotificationEvent) -> usize {
        self.sender.send(event).unwrap_or_default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ForegroundChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Message port between the background worker and every open surface.
#[derive(Clone)]
pub struct RelayChannel {
    sender: broadcast::Sender<RelayMessage>,
}

impl RelayChannel {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_BUFFER_SIZE);
        Self { sender }
    }

    /// Post to all attached surfaces; returns how many received it.
    pub fn post(&self, message: RelayMessage) -> usize {
        self.sender.send(message).unwrap_or_default()
    }

    /// Post a message in its serialized wire form.
    pub fn post_json(&self, raw: &str) -> Result<usize, NotificationError> {
        Ok(self.post(RelayMessage::from_json(raw)?))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RelayMessage> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for RelayChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_push_wire_format() {
        let msg = RelayMessage::from_json(
            r#"{"type":"FCM_PUSH","title":"New order","body":"Order 42 placed","data":{"order_id":"o42"}}"#,
        )
        .unwrap();
        let RelayMessage::Push { title, data, .. } = msg else {
            panic!("expected push");
        };
        assert_eq!(title, "New order");
        assert_eq!(data.get("order_id").map(String::as_str), Some("o42"));
    }

    #[test]
    fn test_relay_click_serializes_with_type_tag() {
        let msg = RelayMessage::NotificationClick {
            url: "/orders?highlight_order=o1".into(),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            serde_json::json!({"type": "FCM_NOTIFICATION_CLICK", "url": "/orders?highlight_order=o1"})
        );
    }

    #[test]
    fn test_unknown_relay_type_is_tolerated() {
        let msg = RelayMessage::from_json(r#"{"type":"SW_UPDATED"}"#).unwrap();
        assert_eq!(msg, RelayMessage::Other);
        assert!(RelayMessage::from_json("not json").is_err());
    }

    #[test]
    fn test_post_without_listeners_is_not_an_error() {
        let relay = RelayChannel::new();
        assert_eq!(relay.post(RelayMessage::Other), 0);
        let foreground = ForegroundChannel::new();
        assert_eq!(foreground.deliver(NotificationEvent::new("t", "b")), 0);
    }
}
