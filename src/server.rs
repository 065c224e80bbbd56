//! HTTP surface of the exporter.
//!
//! Serves the scrape endpoint (configurable, `/metrics` by default), a small
//! landing page on `/` and a `/health` check reflecting the validation gate.

use std::{future::Future, io, sync::Arc};

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tracing::{debug, error};

use crate::core::{
    exposition::{content_type, encode},
    scrape::NvmeCollector,
};

#[derive(Clone)]
pub struct AppState {
    collector: Arc<NvmeCollector>,
    endpoint: String,
}

/// Builds the router with the scrape handler mounted at `endpoint`.
pub fn router(collector: Arc<NvmeCollector>, endpoint: &str) -> Router {
    let state = AppState {
        collector,
        endpoint: endpoint.to_string(),
    };

    let mut app = Router::new().route("/health", get(health_handler));
    if endpoint != "/" {
        app = app.route("/", get(root_handler));
    }
    app.route(endpoint, get(metrics_handler)).with_state(state)
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    let families = state.collector.gather().await;
    debug!("Serving {} metric families", families.len());

    match encode(&families) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn root_handler(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>NVMe Exporter</title></head>
<body>
    <h1>NVMe Exporter</h1>
    <p>Version {}</p>
    <ul>
        <li><a href="{endpoint}">{endpoint}</a> - Prometheus metrics</li>
        <li><a href="/health">/health</a> - Environment health</li>
    </ul>
</body>
</html>"#,
        env!("CARGO_PKG_VERSION"),
        endpoint = state.endpoint,
    ))
}

async fn health_handler(State(state): State<AppState>) -> (StatusCode, String) {
    let gate = state.collector.gate().state();
    if gate.is_valid() {
        (StatusCode::OK, "OK".to_string())
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, gate.to_string())
    }
}
