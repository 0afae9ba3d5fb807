//! Classification of notification payloads into navigation intents.
//!
//! Payloads reach the dashboard in two shapes: the structured `data` map of a
//! push message, and the click URL of a notification the background worker
//! rendered. Both decode into [`NotificationIntentKind`] so every call site
//! agrees on where a notification leads.

use std::collections::HashMap;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use url::{Url, form_urlencoded};

use crate::types::{NavigationIntent, NotificationEvent};

pub const TYPE_KEY: &str = "type";
pub const ORDER_ID_KEY: &str = "order_id";
pub const MILESTONE_ID_KEY: &str = "milestone_id";
pub const RECIPIENT_MOBILE_KEY: &str = "recipient_mobile";

pub const MILESTONE_ACHIEVED: &str = "MILESTONE_ACHIEVED";
pub const REFERRAL_REWARD: &str = "REFERRAL_REWARD";

pub const HIGHLIGHT_ORDER_PARAM: &str = "highlight_order";
pub const HIGHLIGHT_MILESTONE_PARAM: &str = "highlight_milestone";

pub const ORDERS_PATH: &str = "/orders";
pub const OFFER_SETTINGS_PATH: &str = "/offer-settings";
pub const NETWORK_PATH_PREFIX: &str = "/user-management/network/";

/// What a notification is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationIntentKind {
    Milestone { milestone_id: String },
    ReferralReward { recipient_mobile: String },
    OrderUpdate { order_id: String },
    Unknown,
}

impl NotificationIntentKind {
    /// Classify a raw payload map. First match wins; unknown keys are ignored.
    pub fn from_data(data: &HashMap<String, String>) -> Self {
        match (
            non_empty(data, TYPE_KEY),
            non_empty(data, MILESTONE_ID_KEY),
            non_empty(data, RECIPIENT_MOBILE_KEY),
        ) {
            (Some(MILESTONE_ACHIEVED), Some(milestone_id), _) => {
                return Self::Milestone {
                    milestone_id: milestone_id.to_string(),
                };
            }
            (Some(REFERRAL_REWARD), _, Some(recipient_mobile)) => {
                return Self::ReferralReward {
                    recipient_mobile: recipient_mobile.to_string(),
                };
            }
            _ => {}
        }

        match non_empty(data, ORDER_ID_KEY) {
            Some(order_id) => Self::OrderUpdate {
                order_id: order_id.to_string(),
            },
            None => Self::Unknown,
        }
    }

    pub fn from_event(event: &NotificationEvent) -> Self {
        Self::from_data(&event.data)
    }

    /// Resolve the kind into the single intent it leads to.
    pub fn intent(&self) -> NavigationIntent {
        match self {
            Self::Milestone { milestone_id } => NavigationIntent {
                path: OFFER_SETTINGS_PATH.to_string(),
                highlight_order_id: None,
                highlight_milestone_id: Some(milestone_id.clone()),
            },
            Self::ReferralReward { recipient_mobile } => {
                NavigationIntent::to_path(format!("{NETWORK_PATH_PREFIX}{recipient_mobile}"))
            }
            Self::OrderUpdate { order_id } => NavigationIntent {
                path: ORDERS_PATH.to_string(),
                highlight_order_id: Some(order_id.clone()),
                highlight_milestone_id: None,
            },
            Self::Unknown => NavigationIntent::to_path(ORDERS_PATH),
        }
    }
}

/// Map a notification to exactly one navigation intent.
///
/// Total: malformed or unrecognised payloads fall back to the orders list.
pub fn route(event: &NotificationEvent) -> NavigationIntent {
    NotificationIntentKind::from_event(event).intent()
}

/// Whether a toast for this event offers a "view" action.
pub fn has_view_target(event: &NotificationEvent) -> bool {
    [ORDER_ID_KEY, MILESTONE_ID_KEY, RECIPIENT_MOBILE_KEY]
        .iter()
        .any(|key| event.data_value(key).is_some())
}

/// Decode the URL attached to a background-rendered notification.
///
/// The path component is percent-decoded; `highlight_order` /
/// `highlight_milestone` query parameters become the highlight fields.
/// Unparseable input falls back to the orders list.
pub fn decode_click_url(raw: &str) -> NavigationIntent {
    let Some(location) = Location::parse(raw) else {
        tracing::debug!(url = raw, "Unparseable notification click URL, using default route");
        return NavigationIntent::to_path(ORDERS_PATH);
    };
    location.into_intent()
}

/// Parse the surface's initial URL on cold open.
///
/// Only yields an intent when the URL carries a highlight parameter; a plain
/// page load is not a notification activation.
pub fn decode_cold_open(raw: &str) -> Option<NavigationIntent> {
    let location = Location::parse(raw)?;
    if location.order.is_none() && location.milestone.is_none() {
        return None;
    }
    Some(location.into_intent())
}

/// Encode an intent as the click URL the background worker attaches.
///
/// The result is a relative reference; [`decode_click_url`] reverses it
/// exactly, whatever characters the path carries.
pub fn encode_click_url(intent: &NavigationIntent) -> String {
    let path = utf8_percent_encode(&intent.path, PATH_ESCAPES).to_string();

    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(order) = &intent.highlight_order_id {
        query.append_pair(HIGHLIGHT_ORDER_PARAM, order);
    }
    if let Some(milestone) = &intent.highlight_milestone_id {
        query.append_pair(HIGHLIGHT_MILESTONE_PARAM, milestone);
    }
    let query = query.finish();

    if query.is_empty() {
        path
    } else {
        format!("{path}?{query}")
    }
}

/// Characters that would end or reinterpret a path if left bare.
const PATH_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn non_empty<'a>(data: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    data.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

/// A click or cold-open location split into the parts routing cares about.
struct Location {
    path: String,
    order: Option<String>,
    milestone: Option<String>,
}

impl Location {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(url) = Url::parse(raw) {
            let (order, milestone) = highlight_params(url.query_pairs());
            return Some(Self {
                path: decode_path(url.path()),
                order,
                milestone,
            });
        }

        // Relative reference: split by hand so dot segments and escapes in
        // the path come back exactly as they were encoded.
        let without_fragment = raw.split_once('#').map_or(raw, |(head, _)| head);
        let (path, query) = without_fragment
            .split_once('?')
            .unwrap_or((without_fragment, ""));
        let (order, milestone) = highlight_params(form_urlencoded::parse(query.as_bytes()));
        let path = decode_path(path);
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        Some(Self {
            path,
            order,
            milestone,
        })
    }

    fn into_intent(self) -> NavigationIntent {
        let path = match self.path.as_str() {
            "" | "/" => ORDERS_PATH.to_string(),
            _ => self.path,
        };
        NavigationIntent {
            path,
            highlight_order_id: self.order,
            highlight_milestone_id: self.milestone,
        }
    }
}

fn decode_path(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

fn highlight_params(pairs: form_urlencoded::Parse<'_>) -> (Option<String>, Option<String>) {
    let mut order = None;
    let mut milestone = None;
    for (key, value) in pairs {
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            HIGHLIGHT_ORDER_PARAM if order.is_none() => order = Some(value.into_owned()),
            HIGHLIGHT_MILESTONE_PARAM if milestone.is_none() => {
                milestone = Some(value.into_owned())
            }
            _ => {}
        }
    }
    (order, milestone)
}
