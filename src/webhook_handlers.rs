//! One handler per subscribed platform event. Payloads arrive as raw bytes
//! (the signature middleware has already consumed and rebuilt the body) and
//! are parsed manually so every rejection carries a machine-readable code.
//!
//! Processor failures never surface as transport errors: where the platform
//! expects a session result it gets a `*_FAILURE`, and the follow-up events
//! report their outcome out-of-band through the platform client.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bigdecimal::BigDecimal;
use bytes::Bytes;
use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::events::{
    PaymentGatewayInitializeSession, TransactionActionRequested, TransactionInitializeSession,
    TransactionProcessSession,
};
use crate::money;
use crate::platform::{PlatformClient, TransactionEventReport};
use crate::processor::{ChargeIntent, SessionOutcome};
use crate::session::{
    PaymentGatewayInitializeResponse, TransactionSessionResponse, TransactionSessionResult,
};
use crate::store::{StoreError, TransactionRecord, TransactionState};
use crate::AppState;

fn parse_body<T: DeserializeOwned>(state: &AppState, event: &str, body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| {
        state.metrics.record_webhook(event, "rejected");
        ApiError::bad_request_msg("invalid_payload", err.to_string())
    })
}

pub async fn payment_gateway_initialize(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<PaymentGatewayInitializeResponse>> {
    const EVENT: &str = "payment_gateway_initialize_session";
    let payload: PaymentGatewayInitializeSession = parse_body(&state, EVENT, &body)?;
    let data = state
        .processor
        .client_config(payload.source_object.as_ref())
        .await
        .map_err(|err| {
            state.metrics.record_webhook(EVENT, "failed");
            ApiError::internal(err)
        })?;
    state.metrics.record_webhook(EVENT, "ok");
    Ok(Json(PaymentGatewayInitializeResponse { data }))
}

pub async fn transaction_initialize(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<TransactionSessionResponse>> {
    const EVENT: &str = "transaction_initialize_session";
    let payload: TransactionInitializeSession = parse_body(&state, EVENT, &body)?;
    let amount = money::parse_amount(&payload.action.amount).map_err(|err| {
        state.metrics.record_webhook(EVENT, "rejected");
        ApiError::bad_request_msg("invalid_amount", err.to_string())
    })?;
    let intent = ChargeIntent {
        amount: amount.clone(),
        currency: payload.action.currency.clone(),
        action: payload.action.action_type,
    };
    let outcome = match state.processor.initialize_session(&intent, &payload.data).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(error = %err, "processor failed to initialize session");
            SessionOutcome::failure_for(intent.action, err.to_string())
        }
    };
    record_attempt(&state, &outcome, &amount, &intent.currency);

    let response = TransactionSessionResponse::new(outcome.psp_reference, outcome.result, amount)
        .with_data(outcome.data)
        .with_message(outcome.message)
        .with_external_url(outcome.external_url);
    response.ensure_consistent().map_err(ApiError::internal)?;
    state.metrics.record_webhook(EVENT, "ok");
    state.metrics.record_session_result(response.result.as_str());
    Ok(Json(response))
}

/// Persist the attempt and walk the lifecycle to where the outcome landed.
fn record_attempt(state: &AppState, outcome: &SessionOutcome, amount: &BigDecimal, currency: &str) {
    let psp = &outcome.psp_reference;
    state
        .store
        .upsert_initialized(psp, amount.clone(), currency, outcome.external_url.clone());
    let target = TransactionState::from_result(outcome.result);
    if let Err(err) = apply_result_transition(state, psp, target) {
        warn!(error = %err, psp_reference = %psp, "failed to record session outcome");
    }
}

/// INITIALIZED and ACTION_REQUIRED records pass through PENDING on their way
/// to the target state.
fn apply_result_transition(
    state: &AppState,
    psp_reference: &str,
    target: TransactionState,
) -> Result<(), StoreError> {
    let record = state
        .store
        .get(psp_reference)
        .ok_or_else(|| StoreError::UnknownTransaction(psp_reference.to_string()))?;
    if record.state != TransactionState::Pending {
        state.store.transition(psp_reference, TransactionState::Pending)?;
    }
    if target != TransactionState::Pending {
        state.store.transition(psp_reference, target)?;
    }
    Ok(())
}

pub async fn transaction_process(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    const EVENT: &str = "transaction_process_session";
    let payload: TransactionProcessSession = parse_body(&state, EVENT, &body)?;
    let Some(psp_reference) = payload.transaction.and_then(|t| t.psp_reference) else {
        // nothing to look up: acknowledge delivery
        state.metrics.record_webhook(EVENT, "ack");
        return Ok(StatusCode::OK.into_response());
    };
    let response = match state.store.get(&psp_reference) {
        Some(record) => session_response_from_record(&record),
        None => TransactionSessionResponse::new(
            psp_reference,
            TransactionSessionResult::ChargeFailure,
            BigDecimal::from(0),
        )
        .with_message(Some("unknown transaction".to_string())),
    };
    response.ensure_consistent().map_err(ApiError::internal)?;
    state.metrics.record_webhook(EVENT, "ok");
    state.metrics.record_session_result(response.result.as_str());
    Ok(Json(response).into_response())
}

fn session_response_from_record(record: &TransactionRecord) -> TransactionSessionResponse {
    let result = record.state.session_result();
    let external_url = if result.requires_action() { record.external_url.clone() } else { None };
    TransactionSessionResponse::new(record.psp_reference.clone(), result, record.amount.clone())
        .with_external_url(external_url)
}

pub async fn transaction_charge_requested(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Response> {
    const EVENT: &str = "transaction_charge_requested";
    let payload: TransactionActionRequested = parse_body(&state, EVENT, &body)?;
    let Some(psp_reference) = payload.transaction.and_then(|t| t.psp_reference) else {
        state.metrics.record_webhook(EVENT, "ack");
        return Ok(StatusCode::OK.into_response());
    };
    let record = lookup(&state, EVENT, &psp_reference)?;

    let (event_type, message) = match state.processor.charge(&record).await {
        Ok(outcome) => {
            let target = TransactionState::from_result(outcome.result);
            match apply_result_transition(&state, &psp_reference, target) {
                Ok(()) if outcome.result.is_failure() => ("CHARGE_FAILURE", outcome.message),
                Ok(()) => ("CHARGE_SUCCESS", outcome.message),
                Err(err) => ("CHARGE_FAILURE", Some(err.to_string())),
            }
        }
        Err(err) => ("CHARGE_FAILURE", Some(err.to_string())),
    };
    spawn_report(&state, &psp_reference, event_type, record.amount.clone(), message);
    state.metrics.record_webhook(EVENT, "ack");
    Ok(StatusCode::OK.into_response())
}

pub async fn transaction_cancelation_requested(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Response> {
    const EVENT: &str = "transaction_cancelation_requested";
    let payload: TransactionActionRequested = parse_body(&state, EVENT, &body)?;
    let Some(psp_reference) = payload.transaction.and_then(|t| t.psp_reference) else {
        state.metrics.record_webhook(EVENT, "ack");
        return Ok(StatusCode::OK.into_response());
    };
    let record = lookup(&state, EVENT, &psp_reference)?;

    let (event_type, message) = match state.processor.cancel(&record).await {
        Ok(()) => match state.store.transition(&psp_reference, TransactionState::Canceled) {
            Ok(_) => ("CANCEL_SUCCESS", None),
            Err(err) => ("CANCEL_FAILURE", Some(err.to_string())),
        },
        Err(err) => ("CANCEL_FAILURE", Some(err.to_string())),
    };
    spawn_report(&state, &psp_reference, event_type, record.amount.clone(), message);
    state.metrics.record_webhook(EVENT, "ack");
    Ok(StatusCode::OK.into_response())
}

pub async fn transaction_refund_requested(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Response> {
    const EVENT: &str = "transaction_refund_requested";
    let payload: TransactionActionRequested = parse_body(&state, EVENT, &body)?;
    let Some(psp_reference) = payload
        .transaction
        .as_ref()
        .and_then(|t| t.psp_reference.clone())
    else {
        state.metrics.record_webhook(EVENT, "ack");
        return Ok(StatusCode::OK.into_response());
    };
    let record = lookup(&state, EVENT, &psp_reference)?;

    // partial refunds carry their own amount; default to the recorded total
    let amount = payload
        .action
        .as_ref()
        .and_then(|action| money::parse_amount(&action.amount).ok())
        .unwrap_or_else(|| record.amount.clone());

    let (event_type, message) = match refund_flow(&state, &record).await {
        Ok(()) => ("REFUND_SUCCESS", None),
        Err(message) => ("REFUND_FAILURE", Some(message)),
    };
    spawn_report(&state, &psp_reference, event_type, amount, message);
    state.metrics.record_webhook(EVENT, "ack");
    Ok(StatusCode::OK.into_response())
}

async fn refund_flow(state: &AppState, record: &TransactionRecord) -> Result<(), String> {
    state
        .store
        .transition(&record.psp_reference, TransactionState::RefundPending)
        .map_err(|err| err.to_string())?;
    match state.processor.refund(record).await {
        Ok(()) => state
            .store
            .transition(&record.psp_reference, TransactionState::Refunded)
            .map(|_| ())
            .map_err(|err| err.to_string()),
        Err(err) => {
            let _ = state.store.transition(&record.psp_reference, TransactionState::Failure);
            Err(err.to_string())
        }
    }
}

fn lookup(state: &AppState, event: &str, psp_reference: &str) -> Result<TransactionRecord, ApiError> {
    state.store.get(psp_reference).ok_or_else(|| {
        state.metrics.record_webhook(event, "not_found");
        ApiError::not_found("unknown_transaction")
    })
}

/// Outcome reports go out-of-band; a slow or absent platform never delays
/// the acknowledgment.
fn spawn_report(
    state: &AppState,
    psp_reference: &str,
    event_type: &str,
    amount: BigDecimal,
    message: Option<String>,
) {
    let report = TransactionEventReport {
        psp_reference: psp_reference.to_string(),
        event_type: event_type.to_string(),
        amount,
        message,
        time: Utc::now(),
    };
    let state = state.clone();
    tokio::spawn(async move {
        let auth = state.platform_auth.read().await.clone();
        let Some(auth) = auth else {
            debug!(psp_reference = %report.psp_reference, "no platform credentials; skipping transaction event report");
            return;
        };
        let client = PlatformClient::new(state.http_client.clone(), &auth);
        if let Err(err) = client.report_transaction_event(&report).await {
            warn!(error = %err, psp_reference = %report.psp_reference, "failed to report transaction event");
        }
    });
}
