//! Prometheus request counter served at `/metrics`.

use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::AppState;

pub const REQUESTS_TOTAL: &str = "postboard_requests_total";
/// Endpoint label of requests no route matched.
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

pub struct Metrics {
    registry: Registry,
    requests: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let requests = IntCounterVec::new(
            Opts::new(REQUESTS_TOTAL, "Total HTTP requests"),
            &["method", "endpoint"],
        )?;
        registry.register(Box::new(requests.clone()))?;
        Ok(Self { registry, requests })
    }

    pub fn record_request(&self, method: &str, endpoint: &str) {
        self.requests.with_label_values(&[method, endpoint]).inc();
    }

    pub fn request_count(&self, method: &str, endpoint: &str) -> u64 {
        self.requests.with_label_values(&[method, endpoint]).get()
    }

    /// All metrics in Prometheus text format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Middleware counting every request by method and route.
pub async fn count_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map_or(UNMATCHED_ENDPOINT, |path| path.as_str())
        .to_owned();
    state
        .metrics
        .record_request(req.method().as_str(), &endpoint);
    next.run(req).await
}

pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_owned())],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
