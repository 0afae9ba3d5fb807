//! Sign-in / sign-out wiring for the push subsystem.
//!
//! Sign-in: acquire and save the registration, subscribe privileged sessions
//! to the broadcast topic, attach the listener. Sign-out reverses all three
//! and clears the toast queue. Neither path ever fails from the caller's
//! point of view; backend trouble only reaches the log.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::PushBackend;
use crate::channels::{ForegroundChannel, RelayChannel};
use crate::listener::{ListenerHandle, MessageListener, NotificationSink};
use crate::navigation::Navigator;
use crate::platform::PushPlatform;
use crate::router::decode_cold_open;
use crate::settings::PushSettings;
use crate::toast::ToastQueue;
use crate::token::TokenManager;
use crate::topics::TopicSubscriptionManager;
use crate::types::{InboundEvent, NavigationIntent, Registration, Session};

/// Feeds merged traffic into the toast queue and applies relay clicks.
struct DashboardSink {
    toasts: ToastQueue,
    navigator: Arc<dyn Navigator>,
}

impl NotificationSink for DashboardSink {
    fn on_event(&self, event: InboundEvent) {
        self.toasts.push(event);
    }

    fn on_click(&self, intent: NavigationIntent) {
        info!(path = %intent.path, "Applying notification click");
        self.navigator.navigate(&intent);
    }
}

#[derive(Default)]
struct LifecycleState {
    /// Bumped by every sign-in and sign-out. A sign-in that finds it moved
    /// on after acquiring its registration must not install itself.
    generation: u64,
    /// Whether the latest bump came from a sign-out.
    signed_out: bool,
    active: Option<ActiveSession>,
}

struct ActiveSession {
    session: Session,
    registration: Registration,
    listener: ListenerHandle,
}

/// Background work left running by sign-out.
///
/// Dropping it is fine; the tasks keep running and only log failures.
#[derive(Default)]
pub struct PendingTeardown {
    pub unsubscribe: Option<JoinHandle<()>>,
    pub revoke: Option<JoinHandle<()>>,
}

impl PendingTeardown {
    /// Wait for the background calls to settle.
    pub async fn finished(self) {
        for task in [self.unsubscribe, self.revoke].into_iter().flatten() {
            if let Err(e) = task.await {
                warn!(error = %e, "Sign-out background task did not complete");
            }
        }
    }
}

pub struct SessionLifecycle {
    tokens: TokenManager,
    topics: TopicSubscriptionManager,
    listener: MessageListener,
    toasts: ToastQueue,
    navigator: Arc<dyn Navigator>,
    state: Mutex<LifecycleState>,
}

impl SessionLifecycle {
    pub fn new(
        settings: &PushSettings,
        platform: Arc<dyn PushPlatform>,
        backend: Arc<dyn PushBackend>,
        foreground: ForegroundChannel,
        relay: RelayChannel,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            tokens: TokenManager::new(
                platform,
                Arc::clone(&backend),
                settings.app_id.clone(),
                settings.vapid_key.clone(),
            ),
            topics: TopicSubscriptionManager::new(
                backend,
                settings.broadcast_topic.clone(),
                settings.privileged_roles.clone(),
            ),
            listener: MessageListener::new(foreground, relay),
            toasts: ToastQueue::new(settings.toast_ttl()),
            navigator,
            state: Mutex::new(LifecycleState::default()),
        }
    }

    /// Start notifications for a signed-in session.
    ///
    /// Returns `None` when push is unavailable; the dashboard carries on
    /// without notifications. A previous session is signed out first. If a
    /// sign-out or newer sign-in lands while the registration is in flight,
    /// this one gives up without subscribing or attaching.
    pub async fn sign_in(&self, session: Session) -> Option<Registration> {
        let (generation, previous) = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.signed_out = false;
            (state.generation, state.active.take())
        };
        if let Some(previous) = previous {
            self.teardown(previous).finished().await;
        }

        let registration = self.tokens.acquire(&session.account_id).await?;

        let mut state = self.state.lock();
        if state.generation != generation {
            if state.signed_out {
                drop(state);
                info!(
                    account_id = %session.account_id,
                    "Signed out while push registration was in flight; revoking it"
                );
                drop(self.tokens.invalidate());
            } else {
                debug!(account_id = %session.account_id, "Sign-in superseded by a newer one");
            }
            return None;
        }

        // Fire-and-forget; failures are logged by the task.
        drop(self.topics.subscribe_session(&session));

        let sink = Arc::new(DashboardSink {
            toasts: self.toasts.clone(),
            navigator: Arc::clone(&self.navigator),
        });
        let listener = self.listener.start(sink);

        info!(
            account_id = %session.account_id,
            topic = self.topics.qualifies(&session).then(|| self.topics.broadcast_topic()),
            "Push notifications active"
        );

        state.active = Some(ActiveSession {
            session,
            registration: registration.clone(),
            listener,
        });
        Some(registration)
    }

    /// Stop notifications for the current session.
    ///
    /// Detaching happens before this returns; the backend calls continue in
    /// the background. Also cancels a sign-in still waiting on its
    /// registration.
    pub fn sign_out(&self) -> PendingTeardown {
        let active = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.signed_out = true;
            state.active.take()
        };
        let Some(active) = active else {
            return PendingTeardown::default();
        };
        info!(account_id = %active.session.account_id, "Stopping push notifications");
        self.teardown(active)
    }

    fn teardown(&self, active: ActiveSession) -> PendingTeardown {
        let ActiveSession {
            session, listener, ..
        } = active;

        listener.stop();
        self.toasts.clear();

        PendingTeardown {
            unsubscribe: self.topics.unsubscribe_session(&session),
            revoke: self.tokens.invalidate(),
        }
    }

    /// Apply routing hints from the surface's initial URL.
    pub fn apply_cold_open(&self, location: &str) -> Option<NavigationIntent> {
        let intent = decode_cold_open(location)?;
        info!(path = %intent.path, "Applying cold-open notification target");
        self.navigator.navigate(&intent);
        Some(intent)
    }

    /// Activate the "view" action of a toast.
    pub fn view_toast(&self, id: &str) -> Option<NavigationIntent> {
        self.toasts.view(id, self.navigator.as_ref())
    }

    pub fn dismiss_toast(&self, id: &str) -> bool {
        self.toasts.dismiss(id)
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active.is_some()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.state.lock().active.as_ref().map(|a| a.session.clone())
    }

    pub fn current_registration(&self) -> Option<Registration> {
        self.state
            .lock()
            .active
            .as_ref()
            .map(|a| a.registration.clone())
    }
}

impl Drop for SessionLifecycle {
    fn drop(&mut self) {
        if let Some(active) = self.state.get_mut().active.take() {
            active.listener.stop();
        }
    }
}
