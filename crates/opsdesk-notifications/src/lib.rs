//! Push-notification delivery and in-app routing for the opsdesk dashboard.
//!
//! # Architecture
//!
//! ```text
//!  sign-in ──► TokenManager ──► TopicSubscriptionManager ──► MessageListener
//!                                                               │      │
//!                              ForegroundChannel ───────────────┘      │
//!                              RelayChannel ◄── RelayWorker            │
//!                                                                      ▼
//!                                      router::route ◄── ToastQueue ◄── sink
//!                                            │
//!                                            ▼
//!                                        Navigator
//! ```
//!
//! [`SessionLifecycle`] ties the pieces to sign-in and sign-out.

pub mod backend;
pub mod channels;
pub mod error;
pub mod listener;
pub mod navigation;
pub mod platform;
pub mod relay;
pub mod router;
pub mod session;
pub mod settings;
pub mod toast;
pub mod token;
pub mod topics;
pub mod types;

pub use backend::{HttpPushBackend, PushBackend};
pub use channels::{ForegroundChannel, RelayChannel, RelayMessage};
pub use error::NotificationError;
pub use listener::{ListenerHandle, MessageListener, NotificationSink};
pub use navigation::Navigator;
pub use platform::{PermissionState, PushPlatform, StaticTokenPlatform};
pub use relay::RelayWorker;
pub use router::{NotificationIntentKind, decode_click_url, decode_cold_open, route};
pub use session::{PendingTeardown, SessionLifecycle};
pub use settings::PushSettings;
pub use toast::{DEFAULT_TOAST_TTL, ToastItem, ToastQueue};
pub use token::TokenManager;
pub use topics::TopicSubscriptionManager;
pub use types::*;
