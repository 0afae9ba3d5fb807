use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::PushBackend;
use crate::types::Session;

/// Issues topic (un)subscribe intents to the backend.
///
/// Subscription state lives on the backend; calls here are fire-and-forget
/// and rely on the backend treating repeats as no-ops.
pub struct TopicSubscriptionManager {
    backend: Arc<dyn PushBackend>,
    broadcast_topic: String,
    privileged_roles: Vec<String>,
}

impl TopicSubscriptionManager {
    pub fn new(
        backend: Arc<dyn PushBackend>,
        broadcast_topic: impl Into<String>,
        privileged_roles: Vec<String>,
    ) -> Self {
        Self {
            backend,
            broadcast_topic: broadcast_topic.into(),
            privileged_roles,
        }
    }

    pub fn broadcast_topic(&self) -> &str {
        &self.broadcast_topic
    }

    /// Whether the session qualifies for the shared broadcast topic.
    pub fn qualifies(&self, session: &Session) -> bool {
        session.has_any_role(&self.privileged_roles)
    }

    pub fn subscribe(&self, account_id: &str, topic: &str) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        let (account_id, topic) = (account_id.to_string(), topic.to_string());
        tokio::spawn(async move {
            match backend.subscribe_topic(&account_id, &topic).await {
                Ok(()) => info!(account_id, topic, "Subscribed to topic"),
                Err(e) => warn!(account_id, topic, error = %e, "Topic subscribe failed"),
            }
        })
    }

    pub fn unsubscribe(&self, account_id: &str, topic: &str) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        let (account_id, topic) = (account_id.to_string(), topic.to_string());
        tokio::spawn(async move {
            match backend.unsubscribe_topic(&account_id, &topic).await {
                Ok(()) => info!(account_id, topic, "Unsubscribed from topic"),
                Err(e) => warn!(account_id, topic, error = %e, "Topic unsubscribe failed"),
            }
        })
    }

    /// Subscribe a privileged session to the broadcast topic.
    ///
    /// Non-privileged sessions issue no call and get `None`.
    pub fn subscribe_session(&self, session: &Session) -> Option<JoinHandle<()>> {
        if !self.qualifies(session) {
            debug!(account_id = %session.account_id, "Session not privileged, skipping topic subscribe");
            return None;
        }
        Some(self.subscribe(&session.account_id, &self.broadcast_topic))
    }

    pub fn unsubscribe_session(&self, session: &Session) -> Option<JoinHandle<()>> {
        if !self.qualifies(session) {
            return None;
        }
        Some(self.unsubscribe(&session.account_id, &self.broadcast_topic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotificationError;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl PushBackend for RecordingBackend {
        async fn save_web_token(&self, _: &str, _: &str, _: &str) -> Result<(), NotificationError> {
            Ok(())
        }

        async fn subscribe_topic(&self, account_id: &str, topic: &str) -> Result<(), NotificationError> {
            self.calls.lock().push(format!("sub:{account_id}:{topic}"));
            if self.fail {
                return Err(NotificationError::Backend("timeout".into()));
            }
            Ok(())
        }

        async fn unsubscribe_topic(&self, account_id: &str, topic: &str) -> Result<(), NotificationError> {
            self.calls.lock().push(format!("unsub:{account_id}:{topic}"));
            Ok(())
        }
    }

    fn manager(backend: Arc<RecordingBackend>) -> TopicSubscriptionManager {
        TopicSubscriptionManager::new(backend, "admin_notifications", vec!["admin".into()])
    }

    #[tokio::test]
    async fn test_privileged_session_subscribes_once() {
        let backend = Arc::new(RecordingBackend::default());
        let topics = manager(backend.clone());

        let task = topics
            .subscribe_session(&Session::new("acc-1", ["admin"]))
            .expect("subscribe task");
        task.await.unwrap();

        assert_eq!(*backend.calls.lock(), vec!["sub:acc-1:admin_notifications"]);
    }

    #[tokio::test]
    async fn test_regular_session_issues_no_calls() {
        let backend = Arc::new(RecordingBackend::default());
        let topics = manager(backend.clone());
        let session = Session::new("acc-2", ["support"]);

        assert!(topics.subscribe_session(&session).is_none());
        assert!(topics.unsubscribe_session(&session).is_none());
        assert!(backend.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_contained_in_task() {
        let backend = Arc::new(RecordingBackend {
            fail: true,
            ..Default::default()
        });
        let topics = manager(backend.clone());

        // The task completes normally; the error only reaches the log.
        topics.subscribe("acc-1", "admin_notifications").await.unwrap();
        assert_eq!(backend.calls.lock().len(), 1);
    }
}
