//! Dual-channel message listener.
//!
//! Merges the foreground and relay channels into one sink. The platform does
//! not make the channels mutually exclusive, so one push can reach the sink
//! twice; events keep their [`Origin`] label and are not deduplicated here.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::channels::{ForegroundChannel, RelayChannel, RelayMessage};
use crate::router::decode_click_url;
use crate::types::{InboundEvent, NavigationIntent, NotificationEvent, Origin};

/// Receiver of merged notification traffic.
///
/// Callbacks run while the listener's attachment gate is held, so they must
/// not stop the listener that invokes them.
pub trait NotificationSink: Send + Sync + 'static {
    /// A push arrived on either channel
    fn on_event(&self, event: InboundEvent);

    /// A worker-rendered notification was clicked; apply immediately
    fn on_click(&self, intent: NavigationIntent);
}

pub struct MessageListener {
    foreground: ForegroundChannel,
    relay: RelayChannel,
}

impl MessageListener {
    pub fn new(foreground: ForegroundChannel, relay: RelayChannel) -> Self {
        Self { foreground, relay }
    }

    /// Attach to both channels.
    ///
    /// Both receivers are registered before this returns, so nothing
    /// delivered afterwards is missed.
    pub fn start(&self, sink: Arc<dyn NotificationSink>) -> ListenerHandle {
        let attached = Arc::new(RwLock::new(true));

        let foreground = tokio::spawn(run_foreground(
            self.foreground.subscribe(),
            Arc::clone(&sink),
            Arc::clone(&attached),
        ));
        let relay = tokio::spawn(run_relay(
            self.relay.subscribe(),
            sink,
            Arc::clone(&attached),
        ));

        debug!("Notification listener attached");
        ListenerHandle {
            attached,
            tasks: Some([foreground, relay]),
        }
    }
}

/// Keeps both channel subscriptions alive until [`ListenerHandle::stop`].
pub struct ListenerHandle {
    /// Read-held across every sink call; detaching takes the write side.
    attached: Arc<RwLock<bool>>,
    tasks: Option<[JoinHandle<()>; 2]>,
}

impl ListenerHandle {
    /// Detach both channels. No event reaches the sink after this returns.
    pub fn stop(mut self) {
        self.detach();
        debug!("Notification listener detached");
    }

    pub fn is_attached(&self) -> bool {
        *self.attached.read()
    }

    fn detach(&mut self) {
        // Waits for an in-flight sink call; none start afterwards.
        *self.attached.write() = false;
        if let Some(tasks) = self.tasks.take() {
            for task in tasks {
                task.abort();
            }
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if self.tasks.is_some() {
            error!("Notification listener dropped while attached; detaching to avoid a leaked subscription");
            self.detach();
        }
    }
}

/// Run `deliver` only while still attached. Returns false once detached.
fn dispatch(attached: &RwLock<bool>, deliver: impl FnOnce()) -> bool {
    let gate = attached.read();
    if !*gate {
        return false;
    }
    deliver();
    true
}

async fn run_foreground(
    mut rx: broadcast::Receiver<NotificationEvent>,
    sink: Arc<dyn NotificationSink>,
    attached: Arc<RwLock<bool>>,
) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                let delivered = dispatch(&attached, || {
                    sink.on_event(InboundEvent::new(Origin::Foreground, event))
                });
                if !delivered {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, origin = %Origin::Foreground, "Listener lagged, notifications dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn run_relay(
    mut rx: broadcast::Receiver<RelayMessage>,
    sink: Arc<dyn NotificationSink>,
    attached: Arc<RwLock<bool>>,
) {
    loop {
        let message = match rx.recv().await {
            Ok(message) => message,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, origin = %Origin::Relay, "Listener lagged, notifications dropped");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        let delivered = dispatch(&attached, || match message {
            RelayMessage::Push { title, body, data } => {
                let event = NotificationEvent { title, body, data };
                sink.on_event(InboundEvent::new(Origin::Relay, event));
            }
            RelayMessage::NotificationClick { url } => {
                sink.on_click(decode_click_url(&url));
            }
            RelayMessage::Other => debug!("Ignoring unrelated relay message"),
        });
        if !delivered {
            break;
        }
    }
}
