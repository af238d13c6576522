use anyhow::Result;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::ApiError;
use crate::AppState;

#[derive(Clone)]
pub struct GatewayMetrics {
    registry: Registry,
    webhook_requests: IntCounterVec,
    session_results: IntCounterVec,
}

impl GatewayMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let webhook_requests = IntCounterVec::new(
            Opts::new(
                "gateway_webhook_requests_total",
                "Webhook deliveries grouped by event and outcome",
            ),
            &["event", "outcome"],
        )?;
        let session_results = IntCounterVec::new(
            Opts::new(
                "gateway_session_results_total",
                "Transaction session results returned to the platform",
            ),
            &["result"],
        )?;
        registry.register(Box::new(webhook_requests.clone()))?;
        registry.register(Box::new(session_results.clone()))?;
        Ok(Self { registry, webhook_requests, session_results })
    }

    pub fn record_webhook(&self, event: &str, outcome: &str) {
        self.webhook_requests.with_label_values(&[event, outcome]).inc();
    }

    pub fn record_session_result(&self, result: &str) {
        self.session_results.with_label_values(&[result]).inc();
    }

    pub fn render(&self) -> Result<Response> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )
            .body(Body::from(buffer))?;
        Ok(response)
    }
}

pub async fn render_metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    state.metrics.render().map_err(ApiError::internal)
}
