//! App installation surface: the manifest document the platform fetches at
//! registration time, and the callback that delivers API credentials.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::platform::PlatformAuth;
use crate::AppState;

pub const PERMISSIONS: &[&str] =
    &["HANDLE_PAYMENTS", "HANDLE_CHECKOUTS", "MANAGE_ORDERS", "MANAGE_USERS"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppManifest {
    pub id: &'static str,
    pub name: &'static str,
    pub version: &'static str,
    pub app_url: String,
    pub token_target_url: String,
    pub permissions: Vec<&'static str>,
    pub webhooks: Vec<WebhookManifest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookManifest {
    pub name: &'static str,
    pub target_url: String,
    pub sync_events: Vec<&'static str>,
    pub is_active: bool,
}

/// (manifest name, delivery path, platform event) per subscription.
const WEBHOOKS: &[(&str, &str, &str)] = &[
    (
        "Payment Gateway Initialize",
        "/api/webhooks/initialize-session",
        "PAYMENT_GATEWAY_INITIALIZE_SESSION",
    ),
    (
        "Transaction Initialize",
        "/api/webhooks/transaction-initialize",
        "TRANSACTION_INITIALIZE_SESSION",
    ),
    (
        "Transaction Process",
        "/api/webhooks/transaction-process",
        "TRANSACTION_PROCESS_SESSION",
    ),
    (
        "Transaction Charge Requested",
        "/api/webhooks/transaction-charge-requested",
        "TRANSACTION_CHARGE_REQUESTED",
    ),
    (
        "Transaction Cancelation Requested",
        "/api/webhooks/transaction-cancelation-requested",
        "TRANSACTION_CANCELATION_REQUESTED",
    ),
    (
        "Transaction Refund Requested",
        "/api/webhooks/transaction-refund-requested",
        "TRANSACTION_REFUND_REQUESTED",
    ),
];

pub fn build_manifest(config: &AppConfig) -> AppManifest {
    let base = &config.app_base_url;
    AppManifest {
        id: "app.payments.dummy-gateway",
        name: "Dummy Payments",
        version: env!("CARGO_PKG_VERSION"),
        app_url: base.clone(),
        token_target_url: format!("{base}/api/register"),
        permissions: PERMISSIONS.to_vec(),
        webhooks: WEBHOOKS
            .iter()
            .map(|&(name, path, event)| WebhookManifest {
                name,
                target_url: format!("{base}{path}"),
                sync_events: vec![event],
                is_active: true,
            })
            .collect(),
    }
}

pub async fn manifest(State(state): State<AppState>) -> Json<AppManifest> {
    Json(build_manifest(&state.config))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub auth_token: String,
    pub api_url: Option<String>,
}

/// Installation callback: the platform posts the API token the app will use
/// for out-of-band transaction-event reports.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<Json<Value>> {
    if request.auth_token.trim().is_empty() {
        return Err(ApiError::bad_request("missing_auth_token"));
    }
    let api_url = request
        .api_url
        .or_else(|| state.config.platform_api_url.clone())
        .ok_or(ApiError::bad_request("missing_api_url"))?;

    info!(api_url = %api_url, "registered platform credentials");
    *state.platform_auth.write().await = Some(PlatformAuth {
        api_url,
        token: request.auth_token,
    });
    Ok(Json(json!({ "success": true })))
}
