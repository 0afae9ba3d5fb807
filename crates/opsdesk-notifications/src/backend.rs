//! Dashboard backend calls used by the push subsystem.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use url::Url;

use crate::error::NotificationError;

/// Backend endpoints the push subsystem writes to.
///
/// Topic calls must be idempotent on the backend side: subscribing twice or
/// unsubscribing an unsubscribed registration is not an error.
#[async_trait]
pub trait PushBackend: Send + Sync {
    /// Persist the web registration on the account profile, keyed by app id
    async fn save_web_token(
        &self,
        account_id: &str,
        app_id: &str,
        token: &str,
    ) -> Result<(), NotificationError>;

    async fn subscribe_topic(&self, account_id: &str, topic: &str)
        -> Result<(), NotificationError>;

    async fn unsubscribe_topic(
        &self,
        account_id: &str,
        topic: &str,
    ) -> Result<(), NotificationError>;
}

/// JSON-over-HTTP implementation of [`PushBackend`].
pub struct HttpPushBackend {
    http: Client,
    base_url: Url,
    bearer: Option<String>,
}

impl HttpPushBackend {
    pub fn new(base_url: &str, bearer: Option<String>) -> Result<Self, NotificationError> {
        Self::with_client(Client::new(), base_url, bearer)
    }

    pub fn with_client(
        http: Client,
        base_url: &str,
        bearer: Option<String>,
    ) -> Result<Self, NotificationError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            NotificationError::InvalidConfig(format!("backend URL {base_url:?}: {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(NotificationError::InvalidConfig(format!(
                "backend URL {base_url} cannot carry a path"
            )));
        }
        Ok(Self {
            http,
            base_url,
            bearer: bearer.filter(|b| !b.is_empty()),
        })
    }

    /// Append `segments` to the base path, escaping each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, NotificationError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                NotificationError::InvalidConfig(format!(
                    "backend URL {} cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: reqwest::Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder, NotificationError> {
        let req = self.http.request(method, self.endpoint(segments)?);
        Ok(match &self.bearer {
            Some(token) => req.bearer_auth(token),
            None => req,
        })
    }

    async fn post_topic(
        &self,
        endpoint: &str,
        account_id: &str,
        topic: &str,
    ) -> Result<(), NotificationError> {
        let resp = self
            .request(reqwest::Method::POST, &[endpoint])?
            .json(&json!({ "accountId": account_id, "topic": topic }))
            .send()
            .await?;
        check_status(resp).await
    }
}

#[async_trait]
impl PushBackend for HttpPushBackend {
    async fn save_web_token(
        &self,
        account_id: &str,
        app_id: &str,
        token: &str,
    ) -> Result<(), NotificationError> {
        let mut tokens = serde_json::Map::new();
        tokens.insert(app_id.to_string(), json!({ "web": token }));
        let body = json!({ "push_tokens": tokens });
        let resp = self
            .request(reqwest::Method::PUT, &["accounts", account_id])?
            .json(&body)
            .send()
            .await?;
        check_status(resp).await
    }

    async fn subscribe_topic(
        &self,
        account_id: &str,
        topic: &str,
    ) -> Result<(), NotificationError> {
        self.post_topic("subscribe-topic", account_id, topic).await
    }

    async fn unsubscribe_topic(
        &self,
        account_id: &str,
        topic: &str,
    ) -> Result<(), NotificationError> {
        self.post_topic("unsubscribe-topic", account_id, topic).await
    }
}

async fn check_status(resp: reqwest::Response) -> Result<(), NotificationError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    Err(NotificationError::BackendStatus {
        status: status.as_u16(),
        body,
    })
}
