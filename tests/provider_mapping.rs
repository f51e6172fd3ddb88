//! Provider gateway status mapping and auth-style shim
//!
//! Runs the real adapters against a mock HTTP server and verifies the
//! documented status-to-kind mapping, fail-closed shape validation, and the
//! analytical adapter's alternate-auth-style compatibility shim.

use pagepilot::config::ProviderEndpoint;
use pagepilot::providers::{AnalyticalProvider, Provider, ProviderError, RealtimeProvider};
use std::time::Duration;
use wiremock::matchers::{bearer_token, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn analytical(server: &MockServer, key: &str) -> AnalyticalProvider {
    AnalyticalProvider::new(&ProviderEndpoint::new(&server.uri(), "model-a", key))
}

fn realtime(server: &MockServer) -> RealtimeProvider {
    RealtimeProvider::new(&ProviderEndpoint::new(
        &server.uri(),
        "model-r",
        "rt-key",
    ))
}

fn analytical_body(text: &str) -> serde_json::Value {
    serde_json::json!({ "content": [{ "type": "text", "text": text }] })
}

fn realtime_body(text: &str) -> serde_json::Value {
    serde_json::json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] })
}

#[tokio::test]
async fn status_401_maps_to_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = realtime(&server)
        .call("q", None, TIMEOUT)
        .await
        .expect_err("401 must fail");
    assert_eq!(err.kind(), "auth");
}

#[tokio::test]
async fn status_429_maps_to_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = realtime(&server)
        .call("q", None, TIMEOUT)
        .await
        .expect_err("429 must fail");
    assert_eq!(err.kind(), "rate_limit");
}

#[tokio::test]
async fn status_500_maps_to_unknown_with_body_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = realtime(&server)
        .call("q", None, TIMEOUT)
        .await
        .expect_err("500 must fail");
    assert_eq!(err.kind(), "unknown");
    assert!(err.to_string().contains("upstream exploded"));
}

#[tokio::test]
async fn missing_answer_path_fails_closed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
        )
        .mount(&server)
        .await;

    let err = realtime(&server)
        .call("q", None, TIMEOUT)
        .await
        .expect_err("empty choices must fail");
    assert_eq!(err.kind(), "bad_response_shape");
}

#[tokio::test]
async fn empty_answer_text_fails_closed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(realtime_body("   ")))
        .mount(&server)
        .await;

    let err = realtime(&server)
        .call("q", None, TIMEOUT)
        .await
        .expect_err("blank answer must fail");
    assert_eq!(err.kind(), "bad_response_shape");
}

#[tokio::test]
async fn realtime_success_parses_documented_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(bearer_token("rt-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(realtime_body("live answer")))
        .mount(&server)
        .await;

    let reply = realtime(&server)
        .call("q", None, TIMEOUT)
        .await
        .expect("success");
    assert_eq!(reply.text, "live answer");
}

#[tokio::test]
async fn legacy_key_uses_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-legacy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(analytical_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = analytical(&server, "sk-legacy")
        .call("q", None, TIMEOUT)
        .await
        .expect("success");
    assert_eq!(reply.text, "ok");
}

#[tokio::test]
async fn rejected_auth_style_retries_alternate_once() {
    let server = MockServer::start().await;
    // Legacy header style is rejected...
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-rotated"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    // ...but the same key works as a bearer token
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(bearer_token("sk-rotated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(analytical_body("shimmed")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = analytical(&server, "sk-rotated")
        .call("q", None, TIMEOUT)
        .await
        .expect("alternate style should succeed");
    assert_eq!(reply.text, "shimmed");
}

#[tokio::test]
async fn both_auth_styles_rejected_is_terminal_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&server)
        .await;

    let err = analytical(&server, "sk-bad")
        .call("q", None, TIMEOUT)
        .await
        .expect_err("both styles rejected");
    assert!(matches!(err, ProviderError::Auth(_)));
    assert!(err.to_string().contains("both header styles rejected"));
}

#[tokio::test]
async fn unreachable_host_maps_to_network() {
    // Port 1 on loopback: the connection is refused immediately
    let provider = RealtimeProvider::new(&ProviderEndpoint::new(
        "http://127.0.0.1:1",
        "model-r",
        "rt-key",
    ));
    let err = provider
        .call("q", None, Duration::from_secs(2))
        .await
        .expect_err("nothing listens on port 1");
    assert!(
        matches!(err, ProviderError::Network(_) | ProviderError::Timeout(_)),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn context_block_reaches_request_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(realtime_body("ok")))
        .mount(&server)
        .await;

    let ctx = pagepilot::context::PageContext {
        url: "https://example.com".to_string(),
        visible_text: "unique-marker-text for the body".to_string(),
        ..Default::default()
    };
    realtime(&server)
        .call("question", Some(&ctx), TIMEOUT)
        .await
        .expect("success");

    let requests = server.received_requests().await.expect("recording enabled");
    let body = String::from_utf8_lossy(&requests[0].body).to_string();
    assert!(body.contains("unique-marker-text"));
    assert!(body.contains("Webpage content"));
}
