//! Webhook signature verification middleware: HMAC-SHA256 over a canonical
//! string with timestamp skew and nonce replay protection. Requests that
//! fail here never reach a handler.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::ApiError;
use crate::AppState;

/// Seen nonces with the timestamp they arrived under. Entries older than the
/// skew window are pruned opportunistically.
pub type NonceCache = Arc<DashMap<String, i64>>;

const MAX_BODY_BYTES: usize = 1024 * 1024;
const NONCE_PRUNE_THRESHOLD: usize = 4096;

fn header(req: &Request, name: &str) -> String {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_default()
}

pub async fn verify_webhook(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if !req.uri().path().starts_with("/api/webhooks/") {
        return next.run(req).await;
    }
    let Some(secret) = state.config.webhook_secret.clone() else {
        // verification disabled by configuration; main() warns at startup
        return next.run(req).await;
    };

    let sig = header(&req, "X-Signature");
    let ts = header(&req, "X-Timestamp");
    let nonce = header(&req, "X-Nonce");
    if sig.is_empty() || ts.is_empty() || nonce.is_empty() {
        return ApiError::unauthorized("sig_missing").into_response();
    }

    // Buffer body (consume and rebuild request)
    let (mut parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(_) => return ApiError::bad_request("malformed_body").into_response(),
    };

    // Canonical string: ts, nonce, body_sha256
    let body_hash = format!("{:x}", Sha256::digest(&bytes));
    let canonical = format!("ts:{}\nnonce:{}\nbody_sha256:{}", ts, nonce, body_hash);

    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(err) => return ApiError::internal(err).into_response(),
    };
    mac.update(canonical.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    let provided = sig.strip_prefix("sha256=").unwrap_or(sig.as_str());
    let eq = ConstantTimeEq::ct_eq(expected.as_bytes(), provided.as_bytes()).unwrap_u8();
    if eq != 1 {
        return ApiError::unauthorized("sig_mismatch").into_response();
    }

    let ts_num: i64 = match ts.parse() {
        Ok(v) => v,
        Err(_) => return ApiError::unauthorized("sig_ts_invalid").into_response(),
    };
    let now = chrono::Utc::now().timestamp();
    let max_skew = state.config.webhook_max_skew_secs;
    if (now - ts_num).abs() > max_skew {
        return ApiError::unauthorized("sig_skew").into_response();
    }

    if state.nonces.insert(nonce, ts_num).is_some() {
        return ApiError::unauthorized("sig_replay").into_response();
    }
    if state.nonces.len() > NONCE_PRUNE_THRESHOLD {
        state.nonces.retain(|_, seen_ts| (now - *seen_ts).abs() <= max_skew);
    }

    if let Ok(cl) = axum::http::HeaderValue::from_str(&bytes.len().to_string()) {
        parts.headers.insert(axum::http::header::CONTENT_LENGTH, cl);
    }
    let req = Request::from_parts(parts, Body::from(bytes));
    next.run(req).await
}

/// Signature value for `X-Signature`, exposed so tests and delivery tooling
/// agree on the canonical string.
pub fn sign(secret: &str, ts: &str, nonce: &str, body: &[u8]) -> String {
    let body_hash = format!("{:x}", Sha256::digest(body));
    let canonical = format!("ts:{}\nnonce:{}\nbody_sha256:{}", ts, nonce, body_hash);
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(canonical.as_bytes());
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}
