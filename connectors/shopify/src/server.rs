//! HTTP surface: help, health and on-demand scans.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::scan::Scanner;
use crate::scheduler::ScanGuard;

const HELP: &str = "shopify-missing-metafields\n\nEndpoints:\n  GET  /health\n  GET  /scan\n  POST /scan\n";

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub scanner: Arc<Scanner>,
    pub guard: ScanGuard,
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(help))
        .route("/health", get(health))
        .route("/scan", get(scan).post(scan))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the listener fails.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "server listening");
    }
    axum::serve(listener, router(state)).await
}

async fn help() -> &'static str {
    HELP
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn scan(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let Some(permit) = state.guard.try_acquire() else {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "ok": false, "error": "scan already in progress" })),
        );
    };

    // Detached so a dropped connection cannot cancel a scan halfway.
    let scanner = Arc::clone(&state.scanner);
    let outcome = tokio::spawn(async move {
        let _permit = permit;
        scanner.run().await
    })
    .await;

    match outcome {
        Ok(Ok(result)) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "missingCount": result.missing_count,
                "reportFilePath": result.report_file_path,
            })),
        ),
        Ok(Err(err)) => {
            error!(error = %err, kind = err.kind(), "scan request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": err.to_string() })),
            )
        }
        Err(err) => {
            error!(error = %err, "scan task aborted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": format!("scan task aborted: {err}") })),
            )
        }
    }
}
