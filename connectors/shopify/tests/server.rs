//! HTTP router behaviour.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{FakeCatalog, RecordingNotifier, harness, page, product};
use http_body_util::BodyExt;
use mfa_shopify::config::RequirementsConfig;
use mfa_shopify::scheduler::ScanGuard;
use mfa_shopify::server::{AppState, router, serve};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tower::ServiceExt;
use wiremock::MockServer;

async fn app_state(catalog: FakeCatalog) -> (MockServer, AppState) {
    let (server, state, _notifier) = app_state_with_notifier(catalog).await;
    (server, state)
}

async fn app_state_with_notifier(
    catalog: FakeCatalog,
) -> (MockServer, AppState, Arc<RecordingNotifier>) {
    let server = MockServer::start().await;
    catalog.mount(&server).await;
    let harness = harness(&server, &RequirementsConfig::default());
    let state = AppState {
        scanner: Arc::new(harness.scanner),
        guard: ScanGuard::new(),
    };
    (server, state, harness.notifier)
}

async fn send(state: AppState, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router(state)
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("json body")
}

#[tokio::test]
async fn health_reports_ok() {
    let (_server, state) = app_state(FakeCatalog::new()).await;
    let (status, body) = send(state, Method::GET, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["ok"], true);
}

#[tokio::test]
async fn root_lists_endpoints() {
    let (_server, state) = app_state(FakeCatalog::new()).await;
    let (status, body) = send(state, Method::GET, "/").await;

    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("/health"));
    assert!(text.contains("/scan"));
}

#[tokio::test]
async fn scan_returns_count_and_report_path() {
    let catalog = FakeCatalog::new()
        .with_pages("products", vec![vec![product(1, false)]])
        .with_pages("pages", vec![vec![page(2, true, false)]]);
    let (_server, state) = app_state(catalog).await;

    for method in [Method::GET, Method::POST] {
        let (status, body) = send(state.clone(), method, "/scan").await;
        assert_eq!(status, StatusCode::OK);

        let body = json(&body);
        assert_eq!(body["ok"], true);
        assert_eq!(body["missingCount"], 2);
        assert!(body["reportFilePath"].as_str().unwrap().ends_with(".xlsx"));
    }
    assert!(!state.guard.is_running());
}

#[tokio::test]
async fn failed_scan_is_internal_error() {
    let (_server, state) = app_state(FakeCatalog::new().failing("products")).await;
    let (status, body) = send(state.clone(), Method::POST, "/scan").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = json(&body);
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("500"));
    assert!(!state.guard.is_running());
}

#[tokio::test]
async fn scan_conflicts_while_another_runs() {
    let (server, state) = app_state(FakeCatalog::new()).await;
    let _permit = state.guard.try_acquire().expect("permit");

    let (status, body) = send(state.clone(), Method::GET, "/scan").await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json(&body)["ok"], false);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn scan_completes_after_client_disconnects() {
    let catalog = FakeCatalog::new()
        .with_pages("products", vec![vec![product(1, false)]])
        .with_delay(Duration::from_millis(500));
    let (_server, state, notifier) = app_state_with_notifier(catalog).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, state.clone()));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /scan HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(stream);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while notifier.calls.lock().unwrap().is_empty() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "scan did not finish after the client went away"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let notices = notifier.calls.lock().unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].counts.products, 1);
    drop(notices);

    while state.guard.is_running() {
        assert!(tokio::time::Instant::now() < deadline, "guard never released");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
