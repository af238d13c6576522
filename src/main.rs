use anyhow::Result;
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    Method,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use payments_gateway::{config::AppConfig, router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = AppConfig::from_env()?;
    if config.webhook_secret.is_none() {
        warn!("WEBHOOK_SECRET is not set; webhook signature verification is disabled");
    }
    let state = AppState::new(config.clone())?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([ACCEPT, CONTENT_TYPE]);

    let app = router(state).layer(cors);

    let addr = SocketAddr::new(config.host.parse()?, config.port);
    info!(%addr, "starting payments-gateway");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
