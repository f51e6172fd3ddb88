//! Retry/backoff executor behavior against a mock provider server
//!
//! Verifies the documented retry curve: attempts = 1 + max_retries, delays
//! of 1000 * 2^i milliseconds between attempts (capped at 8000), and a
//! terminal fallback outcome instead of an error.

use pagepilot::config::ProviderEndpoint;
use pagepilot::executor::{Executor, MAX_BACKOFF_MS, RetryPolicy, backoff_ms};
use pagepilot::providers::AnalyticalProvider;
use pagepilot::store::Store;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn analytical_for(server: &MockServer) -> AnalyticalProvider {
    AnalyticalProvider::new(&ProviderEndpoint::new(
        &server.uri(),
        "test-model",
        "sk-test",
    ))
}

fn executor(max_retries: usize, store: Arc<Store>) -> Executor {
    Executor::new(
        RetryPolicy::new(max_retries, Duration::from_secs(5)),
        store,
    )
}

#[test]
fn backoff_curve_matches_documentation() {
    // Delay before retry i (0-indexed): min(1000 * 2^i, 8000)
    assert_eq!(backoff_ms(0), 1000);
    assert_eq!(backoff_ms(1), 2000);
    assert_eq!(backoff_ms(2), 4000);
    assert_eq!(backoff_ms(3), MAX_BACKOFF_MS);
    assert_eq!(backoff_ms(10), MAX_BACKOFF_MS);
}

#[tokio::test]
async fn server_errors_surface_after_one_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(2)
        .mount(&server)
        .await;

    // HTTP 500 maps to the Unknown kind, which is retried once then
    // surfaced: exactly 2 transport attempts regardless of the retry cap.
    let provider = analytical_for(&server);
    let store = Arc::new(Store::in_memory());
    let outcome = executor(3, store.clone()).execute(&provider, "q", None).await;

    assert!(outcome.is_fallback());
    assert_eq!(outcome.attempts(), 2);

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn rate_limited_provider_uses_full_retry_budget_with_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let provider = analytical_for(&server);
    let store = Arc::new(Store::in_memory());

    let started = Instant::now();
    let outcome = executor(2, store.clone()).execute(&provider, "q", None).await;
    let elapsed = started.elapsed();

    // 3 attempts with inter-attempt delays of 1000ms and 2000ms
    assert!(outcome.is_fallback());
    assert_eq!(outcome.attempts(), 3);
    assert!(
        elapsed >= Duration::from_millis(3000),
        "expected >= 3s of backoff, got {elapsed:?}"
    );
    assert!(
        elapsed < Duration::from_millis(6000),
        "backoff took implausibly long: {elapsed:?}"
    );

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 3);

    // Terminal value renders as an apology, never an error
    assert!(outcome.text().contains("I'm sorry"));
}

#[tokio::test]
async fn malformed_body_is_retried_then_recovers() {
    let server = MockServer::start().await;
    // First response has no answer text at the documented path
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": []
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [{ "type": "text", "text": "recovered answer" }]
        })))
        .mount(&server)
        .await;

    let provider = analytical_for(&server);
    let store = Arc::new(Store::in_memory());
    let outcome = executor(2, store.clone()).execute(&provider, "q", None).await;

    assert!(!outcome.is_fallback());
    assert_eq!(outcome.text(), "recovered answer");
    assert_eq!(outcome.attempts(), 2);
}

#[tokio::test]
async fn failures_are_recorded_in_bounded_error_log() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let provider = analytical_for(&server);
    let store = Arc::new(Store::in_memory());
    let _ = executor(1, store.clone()).execute(&provider, "q", None).await;

    let errors = store.recent_errors(10).await;
    assert_eq!(errors.len(), 2, "one entry per failed attempt");
    assert!(errors.iter().all(|e| e.kind == "rate_limit"));
    assert!(errors.iter().all(|e| e.provider == "analytical"));
}
