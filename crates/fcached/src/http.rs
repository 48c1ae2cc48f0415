//! HTTP surface of the daemon
//!
//! Endpoints:
//!   POST /filecache        store the request body, respond with its key
//!   GET  /filecache/{key}  fetch a stored file as `<key>.dat`
//!   GET  /healthz          liveness probe (always 200 if process is running)
//!   GET  /readyz           readiness probe (200 if the backend answers)
//!   GET  /metrics          Prometheus text format

use axum::{
    extract::{rejection::BytesRejection, DefaultBodyLimit, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use fcache_store::{ChunkStore, StoreError};
use opendal::Operator;
use prometheus_client::registry::Registry;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};

use crate::metrics::{self, Metrics};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ChunkStore<Operator>>,
    pub metrics: Metrics,
    pub registry: Arc<Registry>,
}

impl AppState {
    pub fn new(store: ChunkStore<Operator>) -> Self {
        let mut registry = Registry::default();
        let metrics = Metrics::register(&mut registry);
        Self {
            store: Arc::new(store),
            metrics,
            registry: Arc::new(registry),
        }
    }

    fn fail(&self, op: &'static str, err: impl Into<ApiError>) -> ApiError {
        let err = err.into();
        self.metrics.record_error(op, err.kind);
        if err.status.is_server_error() {
            error!(op, status = %err.status, "{}", err.message);
        } else {
            warn!(op, status = %err.status, "{}", err.message);
        }
        err
    }
}

/// Build the router. Bodies may be one byte over the size limit so that the
/// store, not the transport, reports the overflow.
pub fn router(state: AppState) -> Router {
    let body_limit = state.store.options().max_file_size.saturating_add(1);
    Router::new()
        .route("/filecache", post(put_file))
        .route("/filecache/{key}", get(get_file))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .route("/metrics", get(metrics_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct PutResponse {
    ok: &'static str,
    key: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    ok: &'static str,
    error: String,
}

/// A failed request, rendered as `{"ok":"false","error":...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let (status, kind) = match &e {
            StoreError::SizeLimitExceeded { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "too-large"),
            StoreError::InvalidChecksum { .. } => (StatusCode::BAD_REQUEST, "invalid-key"),
            StoreError::NotFound { .. } | StoreError::ChunkMissing { .. } => {
                (StatusCode::NOT_FOUND, "not-found")
            }
            StoreError::ChecksumMismatch { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "checksum-mismatch")
            }
            StoreError::CorruptManifest { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "corrupt-manifest")
            }
            StoreError::InvalidOptions(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            StoreError::Backend { .. } => (StatusCode::BAD_GATEWAY, "backend"),
        };
        Self {
            status,
            kind,
            message: e.to_string(),
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(e: BytesRejection) -> Self {
        let kind = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            "too-large"
        } else {
            "bad-request"
        };
        Self {
            status: e.status(),
            kind,
            message: e.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            ok: "false",
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

async fn put_file(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<PutResponse>, ApiError> {
    let body = body.map_err(|e| state.fail("put", e))?;
    let put = state
        .store
        .put(body)
        .await
        .map_err(|e| state.fail("put", e))?;

    state.metrics.puts.inc();
    if put.deduplicated {
        state.metrics.puts_deduplicated.inc();
    } else {
        state.metrics.bytes_stored.inc_by(put.bytes);
    }
    Ok(Json(PutResponse {
        ok: "true",
        key: put.checksum.to_hex(),
    }))
}

async fn get_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let data = state
        .store
        .get(&key)
        .await
        .map_err(|e| state.fail("get", e))?;
    state.metrics.gets.inc();

    // `key` parsed as a checksum, so it is plain hex
    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{key}.dat\""),
        ),
    ];
    Ok((headers, data).into_response())
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match metrics::render(&state.registry) {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            error!("metrics encode failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                e.to_string(),
            )
        }
    }
}

/// Liveness probe: returns 200 if the process is running.
async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Readiness probe: returns 200 if the backend answers, 503 otherwise.
async fn readyz_handler(State(state): State<AppState>) -> impl IntoResponse {
    match fcache_storage::check_health(state.store.backend()).await {
        Ok(()) => (StatusCode::OK, "ready".to_string()),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, format!("backend unreachable: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use fcache_chunks::Checksum;
    use fcache_storage::memory_operator;
    use fcache_store::StoreOptions;
    use tower::ServiceExt;

    fn test_app(max_file_size: usize) -> Router {
        let options = StoreOptions {
            max_file_size,
            ..Default::default()
        };
        let store = ChunkStore::with_options(memory_operator().unwrap(), options);
        router(AppState::new(store))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body)
    }

    fn post(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/filecache")
            .body(body.into())
            .unwrap()
    }

    fn fetch(key: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/filecache/{key}"))
            .body(Body::empty())
            .unwrap()
    }

    fn json(body: &Bytes) -> serde_json::Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn post_then_get_roundtrip() {
        let app = test_app(1 << 20);
        let content = vec![7u8; 300_000];

        let (status, body) = send(&app, post(content.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let reply = json(&body);
        assert_eq!(reply["ok"], "true");
        let key = reply["key"].as_str().unwrap().to_string();
        assert_eq!(key, Checksum::of(&content).to_hex());

        let response = app.clone().oneshot(fetch(&key)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            format!("attachment; filename=\"{key}.dat\"").as_str()
        );
        let data = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(data.as_ref(), &content[..]);
    }

    #[tokio::test]
    async fn oversized_post_is_413() {
        let app = test_app(1000);

        let (status, body) = send(&app, post(vec![0u8; 1001])).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        let reply = json(&body);
        assert_eq!(reply["ok"], "false");
        assert!(reply["error"].as_str().unwrap().contains("by 1 bytes"));

        // Far over the limit the transport refuses the body itself
        let (status, body) = send(&app, post(vec![0u8; 10_000])).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json(&body)["ok"], "false");

        let (status, _) = send(&app, post(vec![0u8; 1000])).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn get_status_codes() {
        let app = test_app(1 << 20);

        let (status, body) = send(&app, fetch("not-hex")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["ok"], "false");

        let missing = Checksum::of(b"never stored").to_hex();
        let (status, _) = send(&app, fetch(&missing)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn probes_and_metrics() {
        let app = test_app(1 << 20);

        let (status, _) = send(
            &app,
            Request::builder().uri("/healthz").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            Request::builder().uri("/readyz").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_ref(), b"ready");

        send(&app, post(b"first".to_vec())).await;
        send(&app, post(b"first".to_vec())).await;
        send(&app, fetch("not-hex")).await;

        let (status, body) = send(
            &app,
            Request::builder().uri("/metrics").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("fcache_puts_total 2"), "{text}");
        assert!(text.contains("fcache_puts_deduplicated_total 1"), "{text}");
        assert!(text.contains("fcache_bytes_stored_total 5"), "{text}");
        assert!(text.contains("kind=\"invalid-key\""), "{text}");
    }
}
