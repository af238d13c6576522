//! Pluggable payment-processor strategy. The handler layer is written
//! against this trait so the dummy policy and real PSP adapters are
//! interchangeable behind configuration.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;
use crate::events::SourceObject;
use crate::session::{TransactionAction, TransactionSessionResult};
use crate::store::TransactionRecord;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("processor request failed: {0}")]
    Upstream(String),
    #[error("processor request timed out")]
    Timeout,
}

/// Parsed, validated request to move money.
#[derive(Debug, Clone)]
pub struct ChargeIntent {
    pub amount: BigDecimal,
    pub currency: String,
    pub action: TransactionAction,
}

/// Outcome of one processor call, ready to be shaped into a
/// `TransactionSessionResponse`.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub psp_reference: String,
    pub result: TransactionSessionResult,
    pub data: Option<Value>,
    pub message: Option<String>,
    pub external_url: Option<String>,
}

impl SessionOutcome {
    /// Failure shaped for the flow that was requested; used when the
    /// processor itself errors, so the platform still gets a definitive
    /// result instead of a transport error.
    pub fn failure_for(action: TransactionAction, message: String) -> Self {
        let result = match action {
            TransactionAction::Charge => TransactionSessionResult::ChargeFailure,
            TransactionAction::Refund | TransactionAction::Cancel => {
                TransactionSessionResult::AuthorizationFailure
            }
        };
        Self {
            psp_reference: uuid::Uuid::new_v4().to_string(),
            result,
            data: None,
            message: Some(message),
            external_url: None,
        }
    }
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Decide the outcome of initiating a transaction. `gateway_data` is the
    /// opaque blob the storefront attached to the session event.
    async fn initialize_session(
        &self,
        intent: &ChargeIntent,
        gateway_data: &Value,
    ) -> Result<SessionOutcome, ProcessorError>;

    /// Capture a previously authorized transaction.
    async fn charge(&self, record: &TransactionRecord) -> Result<SessionOutcome, ProcessorError>;

    async fn cancel(&self, record: &TransactionRecord) -> Result<(), ProcessorError>;

    async fn refund(&self, record: &TransactionRecord) -> Result<(), ProcessorError>;

    /// Client configuration handed to the storefront before a transaction is
    /// created. Must be side-effect-free.
    async fn client_config(&self, source: Option<&SourceObject>) -> Result<Value, ProcessorError>;
}

pub fn from_config(config: &AppConfig) -> anyhow::Result<Arc<dyn PaymentProcessor>> {
    match config.processor.as_str() {
        "dummy" => Ok(Arc::new(DummyProcessor::new())),
        other => anyhow::bail!("unknown payment processor: {other}"),
    }
}

/// Test processor: no money moves. It echoes a fixed reference and derives
/// the result from the `status` tag the storefront sent in the session data.
pub struct DummyProcessor {
    credit_balance: i64,
}

impl DummyProcessor {
    pub const PSP_REFERENCE: &'static str = "1234-dummy";

    pub fn new() -> Self {
        Self { credit_balance: 10_000 }
    }
}

impl Default for DummyProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentProcessor for DummyProcessor {
    async fn initialize_session(
        &self,
        _intent: &ChargeIntent,
        gateway_data: &Value,
    ) -> Result<SessionOutcome, ProcessorError> {
        let status = gateway_data.get("status").and_then(Value::as_str);
        let result = if status == Some("CHARGE_SUCCESS") {
            TransactionSessionResult::ChargeSuccess
        } else {
            TransactionSessionResult::ChargeFailure
        };
        Ok(SessionOutcome {
            psp_reference: Self::PSP_REFERENCE.to_string(),
            result,
            data: Some(json!({
                "paymentResponse": {
                    "resultCode": "Authorised",
                }
            })),
            message: Some("Optional message".to_string()),
            external_url: None,
        })
    }

    async fn charge(&self, record: &TransactionRecord) -> Result<SessionOutcome, ProcessorError> {
        Ok(SessionOutcome {
            psp_reference: record.psp_reference.clone(),
            result: TransactionSessionResult::ChargeSuccess,
            data: None,
            message: None,
            external_url: None,
        })
    }

    async fn cancel(&self, _record: &TransactionRecord) -> Result<(), ProcessorError> {
        Ok(())
    }

    async fn refund(&self, _record: &TransactionRecord) -> Result<(), ProcessorError> {
        Ok(())
    }

    async fn client_config(&self, _source: Option<&SourceObject>) -> Result<Value, ProcessorError> {
        Ok(json!({ "availableCredits": self.credit_balance }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TransactionAction;
    use std::str::FromStr;

    fn intent() -> ChargeIntent {
        ChargeIntent {
            amount: BigDecimal::from_str("12.50").unwrap(),
            currency: "USD".into(),
            action: TransactionAction::Charge,
        }
    }

    #[tokio::test]
    async fn charge_success_status_passes_through() {
        let outcome = DummyProcessor::new()
            .initialize_session(&intent(), &json!({"status": "CHARGE_SUCCESS"}))
            .await
            .unwrap();
        assert_eq!(outcome.result, TransactionSessionResult::ChargeSuccess);
        assert_eq!(outcome.psp_reference, "1234-dummy");
    }

    #[tokio::test]
    async fn any_other_status_fails_the_charge() {
        for data in [json!({"status": "PENDING"}), json!({}), Value::Null] {
            let outcome = DummyProcessor::new()
                .initialize_session(&intent(), &data)
                .await
                .unwrap();
            assert_eq!(outcome.result, TransactionSessionResult::ChargeFailure);
        }
    }

    #[tokio::test]
    async fn client_config_reports_available_credits() {
        let data = DummyProcessor::new().client_config(None).await.unwrap();
        assert_eq!(data["availableCredits"], 10_000);
    }

    #[test]
    fn unknown_processor_name_is_rejected() {
        let config = AppConfig { processor: "acme".into(), ..AppConfig::default() };
        assert!(from_config(&config).is_err());
    }
}
