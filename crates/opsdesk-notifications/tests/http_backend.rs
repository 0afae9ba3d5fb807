use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use opsdesk_notifications::{HttpPushBackend, NotificationError, PushBackend};

#[tokio::test]
async fn save_web_token_puts_nested_token_keyed_by_app() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/accounts/acc-1"))
        .and(header("authorization", "Bearer secret"))
        .and(body_json(json!({
            "push_tokens": { "opsdesk-dashboard": { "web": "tok-1" } }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpPushBackend::new(&format!("{}/", server.uri()), Some("secret".into()))
        .expect("valid backend URL");
    backend
        .save_web_token("acc-1", "opsdesk-dashboard", "tok-1")
        .await
        .expect("token saved");
}

#[tokio::test]
async fn topic_calls_post_account_and_topic() {
    let server = MockServer::start().await;
    let body = json!({ "accountId": "acc-1", "topic": "admin_notifications" });
    Mock::given(method("POST"))
        .and(path("/subscribe-topic"))
        .and(body_json(body.clone()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/unsubscribe-topic"))
        .and(body_json(body))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpPushBackend::new(&server.uri(), None).expect("valid backend URL");
    backend
        .subscribe_topic("acc-1", "admin_notifications")
        .await
        .expect("subscribed");
    backend
        .unsubscribe_topic("acc-1", "admin_notifications")
        .await
        .expect("unsubscribed");
}

#[tokio::test]
async fn error_status_is_reported_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/subscribe-topic"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let backend = HttpPushBackend::new(&server.uri(), None).expect("valid backend URL");
    let err = backend
        .subscribe_topic("acc-1", "admin_notifications")
        .await
        .unwrap_err();

    match err {
        NotificationError::BackendStatus { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn account_id_is_escaped_as_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/accounts/team%2F7%3Fx"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpPushBackend::new(&format!("{}/api/", server.uri()), None)
        .expect("valid backend URL");
    backend
        .save_web_token("team/7?x", "opsdesk-dashboard", "tok-1")
        .await
        .expect("token saved");
}

#[test]
fn unusable_base_url_is_rejected() {
    assert!(matches!(
        HttpPushBackend::new("not a url", None),
        Err(NotificationError::InvalidConfig(_))
    ));
    assert!(matches!(
        HttpPushBackend::new("mailto:ops@example.com", None),
        Err(NotificationError::InvalidConfig(_))
    ));
}
