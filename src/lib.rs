pub mod config;
pub mod error;
pub mod events;
pub mod manifest;
pub mod metrics;
pub mod money;
pub mod platform;
pub mod processor;
pub mod session;
pub mod store;
pub mod webhook;
pub mod webhook_handlers;

use anyhow::Result;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use config::AppConfig;
use metrics::GatewayMetrics;
use platform::PlatformAuth;
use processor::PaymentProcessor;
use store::TransactionStore;
use webhook::NonceCache;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub processor: Arc<dyn PaymentProcessor>,
    pub store: TransactionStore,
    pub metrics: Arc<GatewayMetrics>,
    pub nonces: NonceCache,
    pub platform_auth: Arc<RwLock<Option<PlatformAuth>>>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let processor = processor::from_config(&config)?;
        let metrics = Arc::new(GatewayMetrics::new()?);
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.platform_timeout_secs))
            .build()?;
        // credentials may also arrive later through /api/register
        let platform_auth = match (&config.platform_api_url, &config.platform_token) {
            (Some(api_url), Some(token)) => {
                Some(PlatformAuth { api_url: api_url.clone(), token: token.clone() })
            }
            _ => None,
        };
        Ok(Self {
            config: Arc::new(config),
            processor,
            store: TransactionStore::new(),
            metrics,
            nonces: NonceCache::default(),
            platform_auth: Arc::new(RwLock::new(platform_auth)),
            http_client,
        })
    }
}

async fn health() -> &'static str {
    "ok"
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics::render_metrics))
        .route("/api/manifest", get(manifest::manifest))
        .route("/api/register", post(manifest::register))
        .route(
            "/api/webhooks/initialize-session",
            post(webhook_handlers::payment_gateway_initialize),
        )
        .route(
            "/api/webhooks/transaction-initialize",
            post(webhook_handlers::transaction_initialize),
        )
        .route(
            "/api/webhooks/transaction-process",
            post(webhook_handlers::transaction_process),
        )
        .route(
            "/api/webhooks/transaction-charge-requested",
            post(webhook_handlers::transaction_charge_requested),
        )
        .route(
            "/api/webhooks/transaction-cancelation-requested",
            post(webhook_handlers::transaction_cancelation_requested),
        )
        .route(
            "/api/webhooks/transaction-refund-requested",
            post(webhook_handlers::transaction_refund_requested),
        )
        .layer(middleware::from_fn_with_state(state.clone(), webhook::verify_webhook))
        .with_state(state)
}
