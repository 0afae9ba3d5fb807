//! Registration token manager.
//!
//! Acquires the push registration for the signed-in account and persists it
//! on the backend. Every failure short of a network error degrades to "no
//! notifications" rather than an error, so sign-in never blocks on push.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::PushBackend;
use crate::platform::{PermissionState, PushPlatform};
use crate::types::Registration;

pub struct TokenManager {
    platform: Arc<dyn PushPlatform>,
    backend: Arc<dyn PushBackend>,
    app_id: String,
    vapid_key: Option<String>,
    current: Mutex<Option<Registration>>,
}

impl TokenManager {
    pub fn new(
        platform: Arc<dyn PushPlatform>,
        backend: Arc<dyn PushBackend>,
        app_id: impl Into<String>,
        vapid_key: Option<String>,
    ) -> Self {
        Self {
            platform,
            backend,
            app_id: app_id.into(),
            vapid_key: vapid_key.filter(|k| !k.is_empty()),
            current: Mutex::new(None),
        }
    }

    /// Acquire a registration for `account_id` and persist it.
    ///
    /// Returns `None` when the platform is unsupported, permission is not
    /// granted, or the credential is missing. A failed backend save is logged
    /// and the registration is still returned.
    pub async fn acquire(&self, account_id: &str) -> Option<Registration> {
        if !self.platform.is_supported() {
            info!("Push notifications unsupported on this surface");
            return None;
        }

        match self.platform.request_permission().await {
            Ok(PermissionState::Granted) => {}
            Ok(state) => {
                info!(?state, "Notification permission not granted");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Notification permission request failed");
                return None;
            }
        }

        let Some(vapid_key) = self.vapid_key.as_deref() else {
            warn!("No VAPID key configured; push registration skipped");
            return None;
        };

        let token = match self.platform.get_token(vapid_key).await {
            Ok(token) if !token.is_empty() => token,
            Ok(_) => {
                warn!("Push platform returned an empty registration");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to obtain push registration");
                return None;
            }
        };

        let registration = Registration::new(token);
        if let Some(previous) = self.current.lock().replace(registration.clone())
            && previous != registration
        {
            debug!(?previous, "Superseded previous push registration");
        }

        match self
            .backend
            .save_web_token(account_id, &self.app_id, registration.as_str())
            .await
        {
            Ok(()) => info!(account_id, app_id = %self.app_id, "Push registration saved"),
            Err(e) => warn!(account_id, error = %e, "Failed to save push registration"),
        }

        Some(registration)
    }

    /// The registration currently treated as authoritative.
    pub fn current(&self) -> Option<Registration> {
        self.current.lock().clone()
    }

    /// Forget the held registration and revoke it in the background.
    ///
    /// The in-memory value is cleared before this returns.
    pub fn invalidate(&self) -> Option<JoinHandle<()>> {
        let previous = self.current.lock().take()?;
        let platform = Arc::clone(&self.platform);
        Some(tokio::spawn(async move {
            match platform.delete_token().await {
                Ok(()) => debug!(registration = ?previous, "Push registration revoked"),
                Err(e) => warn!(error = %e, "Failed to revoke push registration"),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotificationError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakePlatform {
        supported: bool,
        permission: PermissionState,
        tokens: Mutex<Vec<String>>,
        deletes: AtomicUsize,
    }

    impl FakePlatform {
        fn granting(tokens: &[&str]) -> Self {
            Self {
                supported: true,
                permission: PermissionState::Granted,
                tokens: Mutex::new(tokens.iter().rev().map(|t| t.to_string()).collect()),
                deletes: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PushPlatform for FakePlatform {
        fn is_supported(&self) -> bool {
            self.supported
        }

        async fn request_permission(&self) -> Result<PermissionState, NotificationError> {
            Ok(self.permission)
        }

        async fn get_token(&self, _vapid_key: &str) -> Result<String, NotificationError> {
            self.tokens
                .lock()
                .pop()
                .ok_or_else(|| NotificationError::Platform("exhausted".into()))
        }

        async fn delete_token(&self) -> Result<(), NotificationError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeBackend {
        saves: Mutex<Vec<(String, String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl PushBackend for FakeBackend {
        async fn save_web_token(
            &self,
            account_id: &str,
            app_id: &str,
            token: &str,
        ) -> Result<(), NotificationError> {
            self.saves
                .lock()
                .push((account_id.into(), app_id.into(), token.into()));
            if self.fail {
                return Err(NotificationError::Backend("offline".into()));
            }
            Ok(())
        }

        async fn subscribe_topic(&self, _: &str, _: &str) -> Result<(), NotificationError> {
            Ok(())
        }

        async fn unsubscribe_topic(&self, _: &str, _: &str) -> Result<(), NotificationError> {
            Ok(())
        }
    }

    fn manager(platform: FakePlatform, backend: Arc<FakeBackend>) -> TokenManager {
        TokenManager::new(Arc::new(platform), backend, "opsdesk", Some("vapid".into()))
    }

    #[tokio::test]
    async fn test_acquire_saves_once_with_account_and_app_id() {
        let backend = Arc::new(FakeBackend::default());
        let tokens = manager(FakePlatform::granting(&["tok-1"]), backend.clone());

        let reg = tokens.acquire("acc-7").await.expect("registration");
        assert_eq!(reg.as_str(), "tok-1");
        assert_eq!(
            *backend.saves.lock(),
            vec![("acc-7".to_string(), "opsdesk".to_string(), "tok-1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_denied_permission_returns_none_without_save() {
        let backend = Arc::new(FakeBackend::default());
        let platform = FakePlatform {
            permission: PermissionState::Denied,
            ..FakePlatform::granting(&["tok-1"])
        };
        let tokens = manager(platform, backend.clone());

        assert!(tokens.acquire("acc-7").await.is_none());
        assert!(backend.saves.lock().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_or_missing_key_returns_none() {
        let backend = Arc::new(FakeBackend::default());
        let platform = FakePlatform {
            supported: false,
            ..FakePlatform::granting(&["tok-1"])
        };
        assert!(manager(platform, backend.clone()).acquire("a").await.is_none());

        let no_key = TokenManager::new(
            Arc::new(FakePlatform::granting(&["tok-1"])),
            backend.clone(),
            "opsdesk",
            None,
        );
        assert!(no_key.acquire("a").await.is_none());
        assert!(backend.saves.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_still_returns_registration() {
        let backend = Arc::new(FakeBackend {
            fail: true,
            ..Default::default()
        });
        let tokens = manager(FakePlatform::granting(&["tok-1"]), backend);
        assert!(tokens.acquire("acc-1").await.is_some());
        assert!(tokens.current().is_some());
    }

    #[tokio::test]
    async fn test_new_acquisition_supersedes_previous() {
        let backend = Arc::new(FakeBackend::default());
        let tokens = manager(FakePlatform::granting(&["tok-1", "tok-2"]), backend);

        tokens.acquire("acc-1").await;
        tokens.acquire("acc-1").await;
        assert_eq!(tokens.current().unwrap().as_str(), "tok-2");
    }

    #[tokio::test]
    async fn test_invalidate_clears_and_revokes() {
        let backend = Arc::new(FakeBackend::default());
        let platform = Arc::new(FakePlatform::granting(&["tok-1"]));
        let tokens = TokenManager::new(platform.clone(), backend, "opsdesk", Some("k".into()));

        tokens.acquire("acc-1").await;
        let revoke = tokens.invalidate().expect("revoke task");
        assert!(tokens.current().is_none());
        revoke.await.unwrap();
        assert_eq!(platform.deletes.load(Ordering::SeqCst), 1);

        assert!(tokens.invalidate().is_none());
    }
}
