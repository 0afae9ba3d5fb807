//! Queue of transient on-screen notifications.
//!
//! Each toast owns one auto-dismiss timer, kept in a map private to the
//! queue. A toast is removed exactly once: whichever of timer expiry and
//! explicit dismissal comes first wins, and the other becomes a no-op.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::navigation::Navigator;
use crate::router::{has_view_target, route};
use crate::types::{InboundEvent, NavigationIntent, NotificationEvent, Origin};

pub const DEFAULT_TOAST_TTL: Duration = Duration::from_secs(8);

/// A toast as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToastItem {
    /// Unique per displayed instance, never taken from the payload
    pub id: String,
    pub origin: Origin,
    pub event: NotificationEvent,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ToastItem {
    /// Whether the toast offers a "view" action.
    pub fn has_view_action(&self) -> bool {
        has_view_target(&self.event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    Dismissed,
    Expired,
}

#[derive(Default)]
struct ToastState {
    items: Vec<ToastItem>,
    timers: HashMap<String, JoinHandle<()>>,
}

struct Inner {
    ttl: Duration,
    state: Mutex<ToastState>,
    snapshot: watch::Sender<Vec<ToastItem>>,
}

impl Inner {
    fn remove(&self, id: &str, reason: Removal) -> bool {
        let mut state = self.state.lock();
        if let Some(timer) = state.timers.remove(id)
            && reason == Removal::Dismissed
        {
            timer.abort();
        }

        let Some(pos) = state.items.iter().position(|t| t.id == id) else {
            return false;
        };
        state.items.remove(pos);
        self.snapshot.send_replace(state.items.clone());
        debug!(toast_id = id, ?reason, remaining = state.items.len(), "Toast removed");
        true
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        for (_, timer) in self.state.get_mut().timers.drain() {
            timer.abort();
        }
    }
}

/// Cloneable handle to one toast queue.
#[derive(Clone)]
pub struct ToastQueue {
    inner: Arc<Inner>,
}

impl ToastQueue {
    pub fn new(ttl: Duration) -> Self {
        let (snapshot, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                ttl,
                state: Mutex::new(ToastState::default()),
                snapshot,
            }),
        }
    }

    /// Show a toast and start its auto-dismiss timer. Returns the toast id.
    pub fn push(&self, inbound: InboundEvent) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let item = ToastItem {
            id: id.clone(),
            origin: inbound.origin,
            event: inbound.event,
            created_at: OffsetDateTime::now_utc(),
        };

        // Timer starts under the lock so expiry can never observe a missing item.
        let mut state = self.inner.state.lock();
        let timer = spawn_expiry(Arc::downgrade(&self.inner), id.clone(), self.inner.ttl);
        state.items.push(item);
        state.timers.insert(id.clone(), timer);
        self.inner.snapshot.send_replace(state.items.clone());
        debug!(toast_id = %id, origin = %inbound.origin, visible = state.items.len(), "Toast shown");

        id
    }

    /// Remove a toast and cancel its timer. Unknown ids are a no-op.
    ///
    /// Returns whether a toast was removed.
    pub fn dismiss(&self, id: &str) -> bool {
        self.inner.remove(id, Removal::Dismissed)
    }

    /// Activate the "view" action of a toast.
    ///
    /// Routes the toast's payload, applies the intent, and dismisses the
    /// toast. Returns `None` if the toast is gone or has no view target.
    pub fn view(&self, id: &str, navigator: &dyn Navigator) -> Option<NavigationIntent> {
        let event = {
            let state = self.inner.state.lock();
            let item = state.items.iter().find(|t| t.id == id)?;
            if !item.has_view_action() {
                return None;
            }
            item.event.clone()
        };

        let intent = route(&event);
        navigator.navigate(&intent);
        self.dismiss(id);
        Some(intent)
    }

    /// Remove every toast and cancel all timers.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        for (_, timer) in state.timers.drain() {
            timer.abort();
        }
        if !state.items.is_empty() {
            state.items.clear();
            self.inner.snapshot.send_replace(Vec::new());
        }
    }

    /// Visible toasts in display order.
    pub fn items(&self) -> Vec<ToastItem> {
        self.inner.state.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live view of the queue, updated on every change.
    pub fn watch(&self) -> watch::Receiver<Vec<ToastItem>> {
        self.inner.snapshot.subscribe()
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.state.lock().timers.len()
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_TTL)
    }
}

fn spawn_expiry(inner: Weak<Inner>, id: String, ttl: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(ttl).await;
        if let Some(inner) = inner.upgrade() {
            inner.remove(&id, Removal::Expired);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound(origin: Origin, pairs: &[(&str, &str)]) -> InboundEvent {
        let event = pairs
            .iter()
            .fold(NotificationEvent::new("Order update", "Details"), |e, (k, v)| {
                e.with_data(*k, *v)
            });
        InboundEvent::new(origin, event)
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_expires_after_ttl() {
        let toasts = ToastQueue::default();
        let id = toasts.push(inbound(Origin::Foreground, &[]));

        tokio::time::sleep(Duration::from_millis(7_999)).await;
        assert_eq!(toasts.items()[0].id, id);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(toasts.is_empty());
        assert_eq!(toasts.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_cancels_timer_and_removes_once() {
        let toasts = ToastQueue::default();
        let id = toasts.push(inbound(Origin::Foreground, &[]));
        let other = toasts.push(inbound(Origin::Relay, &[]));

        assert!(toasts.dismiss(&id));
        assert!(!toasts.dismiss(&id));
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts.pending_timers(), 1);

        // The cancelled timer must not touch the queue when its deadline passes.
        tokio::time::sleep(Duration::from_millis(8_001)).await;
        assert!(toasts.is_empty());
        assert!(!toasts.dismiss(&other));
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_events_get_distinct_ids_in_order() {
        let toasts = ToastQueue::default();
        let a = toasts.push(inbound(Origin::Foreground, &[("order_id", "o1")]));
        let b = toasts.push(inbound(Origin::Relay, &[("order_id", "o1")]));

        assert_ne!(a, b);
        let ids: Vec<_> = toasts.items().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_navigates_and_dismisses() {
        let toasts = ToastQueue::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let navigator = {
            let seen = Arc::clone(&seen);
            move |intent: &NavigationIntent| seen.lock().push(intent.clone())
        };

        let id = toasts.push(inbound(
            Origin::Foreground,
            &[("type", "MILESTONE_ACHIEVED"), ("milestone_id", "m1")],
        ));
        let intent = toasts.view(&id, &navigator).expect("view intent");

        assert_eq!(intent.path, "/offer-settings");
        assert_eq!(*seen.lock(), vec![intent]);
        assert!(toasts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_without_target_is_unavailable() {
        let toasts = ToastQueue::default();
        let id = toasts.push(inbound(Origin::Foreground, &[("type", "BROADCAST")]));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let navigator = {
            let seen = Arc::clone(&seen);
            move |intent: &NavigationIntent| seen.lock().push(intent.clone())
        };

        assert!(toasts.view(&id, &navigator).is_none());
        assert!(seen.lock().is_empty());
        assert_eq!(toasts.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_tracks_changes_and_clear() {
        let toasts = ToastQueue::default();
        let mut live = toasts.watch();

        toasts.push(inbound(Origin::Foreground, &[]));
        toasts.push(inbound(Origin::Relay, &[]));
        assert_eq!(live.borrow_and_update().len(), 2);

        toasts.clear();
        assert!(live.has_changed().unwrap());
        assert!(live.borrow_and_update().is_empty());
        assert_eq!(toasts.pending_timers(), 0);
    }
}
