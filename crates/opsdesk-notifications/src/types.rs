use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use time::OffsetDateTime;

/// Push registration handle issued by the platform push service.
///
/// Opaque to this crate; only the token manager creates one.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registration(String);

impl Registration {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Tokens are credentials; keep them out of logs.
        let visible: String = self.0.chars().take(8).collect();
        write!(f, "Registration({visible}…)")
    }
}

/// A notification as delivered by either channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub body: String,

    /// Open key/value payload; see `router` for the recognised keys
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl NotificationEvent {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: HashMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Returns a data value, treating empty strings as absent.
    pub fn data_value(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Which delivery channel produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// In-process delivery while the surface is focused
    Foreground,
    /// Copy forwarded by the background worker
    Relay,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Foreground => f.write_str("foreground"),
            Self::Relay => f.write_str("relay"),
        }
    }
}

/// An event tagged with the channel it arrived on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub origin: Origin,
    pub event: NotificationEvent,
    #[serde(with = "time::serde::rfc3339")]
    pub received_at: OffsetDateTime,
}

impl InboundEvent {
    pub fn new(origin: Origin, event: NotificationEvent) -> Self {
        Self {
            origin,
            event,
            received_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Where a notification should take the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationIntent {
    pub path: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_order_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_milestone_id: Option<String>,
}

impl NavigationIntent {
    pub fn to_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            highlight_order_id: None,
            highlight_milestone_id: None,
        }
    }
}

/// Signed-in identity handed over by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub account_id: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl Session {
    pub fn new<I, S>(account_id: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            account_id: account_id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// True when at least one role appears in `allowlist`.
    pub fn has_any_role<S: AsRef<str>>(&self, allowlist: &[S]) -> bool {
        allowlist
            .iter()
            .any(|role| self.roles.contains(role.as_ref()))
    }
}
