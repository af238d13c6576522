//! Signature verification in front of the webhook endpoints.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use payments_gateway::webhook::sign;
use payments_gateway::{config::AppConfig, router, AppState};

const SECRET: &str = "whsec-test-123";

fn signed_state() -> AppState {
    let config = AppConfig { webhook_secret: Some(SECRET.to_string()), ..AppConfig::default() };
    AppState::new(config).unwrap()
}

fn signed_request(body: &str, ts: &str, nonce: &str, signature: &str) -> Request<Body> {
    Request::builder()
        .uri("/api/webhooks/transaction-initialize")
        .method("POST")
        .header("Content-Type", "application/json")
        .header("X-Signature", signature)
        .header("X-Timestamp", ts)
        .header("X-Nonce", nonce)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn valid_body() -> String {
    json!({
        "action": {"amount": "12.50", "currency": "USD", "actionType": "CHARGE"},
        "data": {"status": "CHARGE_SUCCESS"}
    })
    .to_string()
}

#[tokio::test]
async fn valid_signature_reaches_the_handler() {
    let app = router(signed_state());
    let body = valid_body();
    let ts = chrono::Utc::now().timestamp().to_string();
    let signature = sign(SECRET, &ts, "nonce-1", body.as_bytes());
    let resp = app
        .oneshot(signed_request(&body, &ts, "nonce-1", &signature))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_signature_headers_are_rejected() {
    let app = router(signed_state());
    let req = Request::builder()
        .uri("/api/webhooks/transaction-initialize")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(valid_body()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "sig_missing");
}

#[tokio::test]
async fn tampered_body_is_rejected() {
    let app = router(signed_state());
    let body = valid_body();
    let ts = chrono::Utc::now().timestamp().to_string();
    let signature = sign(SECRET, &ts, "nonce-2", body.as_bytes());
    let tampered = body.replace("12.50", "99.99");
    let resp = app
        .oneshot(signed_request(&tampered, &ts, "nonce-2", &signature))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "sig_mismatch");
}

#[tokio::test]
async fn stale_timestamp_is_rejected() {
    let app = router(signed_state());
    let body = valid_body();
    // an hour old, far past the default 300s window
    let ts = (chrono::Utc::now().timestamp() - 3600).to_string();
    let signature = sign(SECRET, &ts, "nonce-3", body.as_bytes());
    let resp = app
        .oneshot(signed_request(&body, &ts, "nonce-3", &signature))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "sig_skew");
}

#[tokio::test]
async fn replayed_nonce_is_rejected() {
    let app = router(signed_state());
    let body = valid_body();
    let ts = chrono::Utc::now().timestamp().to_string();
    let signature = sign(SECRET, &ts, "nonce-4", body.as_bytes());

    let first = app
        .clone()
        .oneshot(signed_request(&body, &ts, "nonce-4", &signature))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let replay = app
        .oneshot(signed_request(&body, &ts, "nonce-4", &signature))
        .await
        .unwrap();
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(replay.headers().get("X-Error-Code").unwrap(), "sig_replay");
}

#[tokio::test]
async fn non_webhook_paths_are_not_guarded() {
    let app = router(signed_state());
    let req = Request::builder().uri("/api/manifest").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn verification_disabled_without_secret() {
    let app = router(AppState::new(AppConfig::default()).unwrap());
    let req = Request::builder()
        .uri("/api/webhooks/transaction-initialize")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(valid_body()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
