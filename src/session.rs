//! Wire contract for the transaction-session exchange with the commerce
//! platform. Result strings and field names are fixed by the platform's
//! schema; everything here serializes camelCase with optionals omitted.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionSessionResult {
    AuthorizationActionRequired,
    AuthorizationFailure,
    AuthorizationRequest,
    AuthorizationSuccess,
    ChargeActionRequired,
    ChargeFailure,
    ChargeRequest,
    ChargeSuccess,
}

impl TransactionSessionResult {
    pub fn requires_action(self) -> bool {
        matches!(
            self,
            TransactionSessionResult::AuthorizationActionRequired
                | TransactionSessionResult::ChargeActionRequired
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransactionSessionResult::AuthorizationSuccess
                | TransactionSessionResult::AuthorizationFailure
                | TransactionSessionResult::ChargeSuccess
                | TransactionSessionResult::ChargeFailure
        )
    }

    pub fn is_failure(self) -> bool {
        matches!(
            self,
            TransactionSessionResult::AuthorizationFailure | TransactionSessionResult::ChargeFailure
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionSessionResult::AuthorizationActionRequired => "AUTHORIZATION_ACTION_REQUIRED",
            TransactionSessionResult::AuthorizationFailure => "AUTHORIZATION_FAILURE",
            TransactionSessionResult::AuthorizationRequest => "AUTHORIZATION_REQUEST",
            TransactionSessionResult::AuthorizationSuccess => "AUTHORIZATION_SUCCESS",
            TransactionSessionResult::ChargeActionRequired => "CHARGE_ACTION_REQUIRED",
            TransactionSessionResult::ChargeFailure => "CHARGE_FAILURE",
            TransactionSessionResult::ChargeRequest => "CHARGE_REQUEST",
            TransactionSessionResult::ChargeSuccess => "CHARGE_SUCCESS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionAction {
    Charge,
    Refund,
    Cancel,
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("pspReference must be non-empty")]
    EmptyPspReference,
    #[error("{0:?} requires an externalUrl")]
    MissingExternalUrl(TransactionSessionResult),
    #[error("terminal result {0:?} must not offer follow-up actions")]
    ActionsOnTerminal(TransactionSessionResult),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSessionResponse {
    pub psp_reference: String,
    pub result: TransactionSessionResult,
    pub amount: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<TransactionAction>>,
}

impl TransactionSessionResponse {
    pub fn new(
        psp_reference: impl Into<String>,
        result: TransactionSessionResult,
        amount: BigDecimal,
    ) -> Self {
        Self {
            psp_reference: psp_reference.into(),
            result,
            amount,
            data: None,
            time: Some(Utc::now()),
            external_url: None,
            message: None,
            actions: default_actions_for(result),
        }
    }

    pub fn with_data(mut self, data: Option<Value>) -> Self {
        self.data = data;
        self
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    pub fn with_external_url(mut self, external_url: Option<String>) -> Self {
        self.external_url = external_url;
        self
    }

    /// Invariant check: `*_ACTION_REQUIRED` carries an externalUrl, terminal
    /// results offer no follow-up actions, and pspReference is never empty.
    pub fn ensure_consistent(&self) -> Result<(), SessionError> {
        if self.psp_reference.trim().is_empty() {
            return Err(SessionError::EmptyPspReference);
        }
        if self.result.requires_action() && self.external_url.is_none() {
            return Err(SessionError::MissingExternalUrl(self.result));
        }
        if self.result.is_terminal() && self.actions.as_ref().is_some_and(|a| !a.is_empty()) {
            return Err(SessionError::ActionsOnTerminal(self.result));
        }
        Ok(())
    }
}

/// Follow-up actions valid for a freshly produced result: a still-running
/// attempt can be canceled, a settled one cannot.
pub fn default_actions_for(result: TransactionSessionResult) -> Option<Vec<TransactionAction>> {
    if result.is_terminal() {
        None
    } else {
        Some(vec![TransactionAction::Cancel])
    }
}

/// Gateway configuration returned to the storefront before any transaction
/// exists; the payload is processor-defined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentGatewayInitializeResponse {
    pub data: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn result_serializes_to_exact_platform_strings() {
        for (variant, expected) in [
            (TransactionSessionResult::AuthorizationActionRequired, "\"AUTHORIZATION_ACTION_REQUIRED\""),
            (TransactionSessionResult::ChargeFailure, "\"CHARGE_FAILURE\""),
            (TransactionSessionResult::ChargeSuccess, "\"CHARGE_SUCCESS\""),
        ] {
            assert_eq!(serde_json::to_string(&variant).unwrap(), expected);
            assert_eq!(format!("\"{}\"", variant.as_str()), expected);
        }
    }

    #[test]
    fn action_serializes_upper() {
        assert_eq!(serde_json::to_string(&TransactionAction::Cancel).unwrap(), "\"CANCEL\"");
    }

    #[test]
    fn response_roundtrip_preserves_populated_fields() {
        let original = TransactionSessionResponse::new(
            "psp-42",
            TransactionSessionResult::ChargeSuccess,
            BigDecimal::from_str("12.50").unwrap(),
        )
        .with_message(Some("ok".into()))
        .with_data(Some(serde_json::json!({"k": "v"})));
        let json = serde_json::to_string(&original).unwrap();
        let parsed: TransactionSessionResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn serialized_field_names_are_camel_case() {
        let response = TransactionSessionResponse::new(
            "psp-42",
            TransactionSessionResult::ChargeRequest,
            BigDecimal::from(1),
        )
        .with_external_url(Some("https://psp.example/resume".into()));
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("pspReference").is_some());
        assert!(value.get("externalUrl").is_some());
        // unset optionals are omitted entirely
        assert!(value.get("message").is_none());
    }

    #[test]
    fn action_required_without_url_is_inconsistent() {
        let response = TransactionSessionResponse::new(
            "psp-42",
            TransactionSessionResult::ChargeActionRequired,
            BigDecimal::from(5),
        );
        assert_eq!(
            response.ensure_consistent(),
            Err(SessionError::MissingExternalUrl(TransactionSessionResult::ChargeActionRequired))
        );
    }

    #[test]
    fn terminal_result_rejects_actions() {
        let mut response = TransactionSessionResponse::new(
            "psp-42",
            TransactionSessionResult::ChargeSuccess,
            BigDecimal::from(5),
        );
        assert_eq!(response.actions, None);
        response.actions = Some(vec![TransactionAction::Refund]);
        assert_eq!(
            response.ensure_consistent(),
            Err(SessionError::ActionsOnTerminal(TransactionSessionResult::ChargeSuccess))
        );
    }

    #[test]
    fn empty_psp_reference_is_rejected() {
        let response = TransactionSessionResponse::new(
            " ",
            TransactionSessionResult::ChargeSuccess,
            BigDecimal::from(5),
        );
        assert_eq!(response.ensure_consistent(), Err(SessionError::EmptyPspReference));
    }
}
