//! HTTP request handlers: telemetry, snapshot debug view, health, root page.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Json, Response};
use tracing::error;

use ktexporter_core::exposition::{CONTENT_TYPE, encode_snapshot};

use crate::state::AppState;

// ============================================================
// Telemetry
// ============================================================

/// Runs one collection cycle and returns it in the Prometheus text format.
pub(crate) async fn handle_metrics(State(state): AppState) -> Response {
    let snapshot = state.collector.collect_snapshot().await;

    match encode_snapshot(&snapshot, state.collector.descriptors()) {
        Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response()
        }
    }
}

// ============================================================
// Snapshot
// ============================================================

/// Runs one collection cycle and returns the raw snapshot as JSON.
pub(crate) async fn handle_snapshot(State(state): AppState) -> Response {
    Json(state.collector.collect_snapshot().await).into_response()
}

// ============================================================
// Health
// ============================================================

pub(crate) async fn handle_health() -> &'static str {
    "ok"
}

// ============================================================
// Root page
// ============================================================

pub(crate) async fn handle_index(State(state): AppState) -> Html<String> {
    Html(format!(
        "<html>
<head><title>KyotoTycoon Exporter</title></head>
<body>
<h1>KyotoTycoon Exporter</h1>
<p><a href='{path}'>Metrics</a></p>
</body>
</html>
",
        path = state.telemetry_path
    ))
}
