use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use payments_gateway::{config::AppConfig, router, AppState};

fn test_state() -> AppState {
    let config = AppConfig { app_base_url: "https://pay.example.com".into(), ..AppConfig::default() };
    AppState::new(config).unwrap()
}

#[tokio::test]
async fn manifest_advertises_all_subscriptions_and_permissions() {
    let app = router(test_state());
    let req = Request::builder().uri("/api/manifest").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(value["tokenTargetUrl"], "https://pay.example.com/api/register");
    let permissions: Vec<&str> =
        value["permissions"].as_array().unwrap().iter().map(|p| p.as_str().unwrap()).collect();
    assert_eq!(
        permissions,
        vec!["HANDLE_PAYMENTS", "HANDLE_CHECKOUTS", "MANAGE_ORDERS", "MANAGE_USERS"]
    );

    let webhooks = value["webhooks"].as_array().unwrap();
    assert_eq!(webhooks.len(), 6);
    let events: Vec<&str> = webhooks
        .iter()
        .map(|hook| hook["syncEvents"].as_array().unwrap()[0].as_str().unwrap())
        .collect();
    for event in [
        "PAYMENT_GATEWAY_INITIALIZE_SESSION",
        "TRANSACTION_INITIALIZE_SESSION",
        "TRANSACTION_PROCESS_SESSION",
        "TRANSACTION_CHARGE_REQUESTED",
        "TRANSACTION_CANCELATION_REQUESTED",
        "TRANSACTION_REFUND_REQUESTED",
    ] {
        assert!(events.contains(&event), "manifest missing {event}");
    }
    for hook in webhooks {
        assert!(hook["targetUrl"]
            .as_str()
            .unwrap()
            .starts_with("https://pay.example.com/api/webhooks/"));
    }
}

#[tokio::test]
async fn register_stores_platform_credentials() {
    let state = test_state();
    let app = router(state.clone());
    let body = json!({"authToken": "tok-123", "apiUrl": "https://platform.example.com/graphql/"});
    let req = Request::builder()
        .uri("/api/register")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let auth = state.platform_auth.read().await.clone().unwrap();
    assert_eq!(auth.token, "tok-123");
    assert_eq!(auth.api_url, "https://platform.example.com/graphql/");
}

#[tokio::test]
async fn register_without_api_url_or_fallback_is_rejected() {
    let app = router(test_state());
    let body = json!({"authToken": "tok-123"});
    let req = Request::builder()
        .uri("/api/register")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "missing_api_url");
}
