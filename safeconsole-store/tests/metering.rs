//! End-to-end metering through a real HTTP client.

use std::sync::Arc;

use safeconsole_core::{ApiModule, CallClassifier, ClassifierConfig, UsageLimits};
use safeconsole_fetch::{HttpClient, HttpTransport, ReqwestTransport, TransportSlot};
use reqwest::Method;
use safeconsole_store::UsageMeter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> (HttpClient, Arc<dyn HttpTransport>) {
    let original: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new().unwrap());
    let slot = Arc::new(TransportSlot::new(Arc::clone(&original)));
    let client = HttpClient::new(slot)
        .with_base_url(&server.uri())
        .unwrap();
    (client, original)
}

/// Meter that treats the mock server's host as the backend.
fn meter() -> Arc<UsageMeter> {
    let config = ClassifierConfig {
        backend_hosts: vec!["127.0.0.1".to_string()],
        ..ClassifierConfig::default()
    };
    Arc::new(UsageMeter::new(
        UsageLimits::default(),
        CallClassifier::new(&config),
    ))
}

#[tokio::test]
async fn test_sync_applies_reported_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rate-limit"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"api_calls_limit": 500, "api_calls_used": 120, "daily_used": 9}"#,
        ))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let meter = meter();
    assert!(meter.initialize(&client, "/api/rate-limit").await);

    let counters = meter.snapshot();
    assert_eq!(counters.monthly_limit, 500);
    assert_eq!(counters.monthly_used, 120);
    assert_eq!(counters.daily_limit, 100);
    assert_eq!(counters.daily_used, 9);
    assert!(counters.synced_at.is_some());
    assert_eq!(meter.remaining(), 380);
}

#[tokio::test]
async fn test_sync_accepts_monthly_spelling() {
    let server = MockServer::start().await;
    Mock::given(path("/api/rate-limit"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"monthly_limit": 2000, "monthly_used": 5, "daily_limit": 50}"#),
        )
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let meter = meter();
    meter.initialize(&client, "/api/rate-limit").await;

    assert_eq!(meter.remaining(), 1995);
    assert_eq!(meter.daily_remaining(), 50);
}

#[tokio::test]
async fn test_failed_sync_keeps_defaults() {
    let server = MockServer::start().await;
    Mock::given(path("/api/rate-limit"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(path("/api/rate-limit-garbage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let meter = meter();
    assert!(!meter.initialize(&client, "/api/rate-limit").await);
    assert!(!meter.initialize(&client, "/api/rate-limit-garbage").await);

    let counters = meter.snapshot();
    assert_eq!(counters.monthly_limit, 1000);
    assert_eq!(counters.monthly_used, 0);
    assert!(counters.synced_at.is_none());
}

#[tokio::test]
async fn test_mounted_meter_counts_and_passes_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/incidents"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"id": 1}]"#))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("denied"))
        .mount(&server)
        .await;

    let (client, original) = client_for(&server);
    let meter = meter();
    let guard = meter.mount(client.slot());

    let response = client.get("/api/incidents").await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), r#"[{"id": 1}]"#);

    let mut login = client.request(Method::POST, "/api/auth/login").unwrap();
    *login.body_mut() = Some(r#"{"user": "a"}"#.into());
    let response = client.send(login).await.unwrap();
    assert_eq!(response.status(), 401);
    assert_eq!(response.text().await.unwrap(), "denied");

    let counters = meter.snapshot();
    assert_eq!(counters.monthly_used, 1);
    assert_eq!(
        counters.module_count(ApiModule::Incidents.display_name()),
        1
    );
    assert_eq!(counters.module_usage.len(), 1);

    assert!(UsageMeter::unmount(guard));
    assert!(Arc::ptr_eq(&client.slot().current(), &original));

    client.get("/api/incidents").await.unwrap();
    assert_eq!(meter.snapshot().monthly_used, 1);
}

#[tokio::test]
async fn test_failed_call_is_counted_and_error_passes_through() {
    // Nothing listens on port 9 on the loopback interface
    let original: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new().unwrap());
    let slot = Arc::new(TransportSlot::new(Arc::clone(&original)));
    let client = HttpClient::new(Arc::clone(&slot))
        .with_base_url("http://127.0.0.1:9")
        .unwrap();
    let meter = meter();
    let _guard = meter.mount(&slot);

    let result = client.get("/api/training/sessions").await;
    assert!(result.is_err());
    assert_eq!(meter.snapshot().module_count("Training"), 1);
}

#[tokio::test]
async fn test_dropping_guard_restores_transport() {
    let server = MockServer::start().await;
    let (client, original) = client_for(&server);
    let meter = meter();

    {
        let _guard = meter.mount(client.slot());
        assert!(!Arc::ptr_eq(&client.slot().current(), &original));
    }
    assert!(Arc::ptr_eq(&client.slot().current(), &original));
}

#[tokio::test]
async fn test_unmount_under_another_meter_stops_counting() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/permits"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (client, original) = client_for(&server);
    let first = meter();
    let second = meter();
    let first_guard = first.mount(client.slot());
    let second_guard = second.mount(client.slot());

    client.get("/api/permits").await.unwrap();
    assert_eq!(first.snapshot().monthly_used, 1);
    assert_eq!(second.snapshot().monthly_used, 1);

    // The second meter sits on top, so the first is unlinked from under it
    assert!(!UsageMeter::unmount(first_guard));
    client.get("/api/permits").await.unwrap();
    assert_eq!(first.snapshot().monthly_used, 1);
    assert_eq!(second.snapshot().monthly_used, 2);

    assert!(UsageMeter::unmount(second_guard));
    assert!(Arc::ptr_eq(&client.slot().current(), &original));
    client.get("/api/permits").await.unwrap();
    assert_eq!(first.snapshot().monthly_used, 1);
    assert_eq!(second.snapshot().monthly_used, 2);
}
