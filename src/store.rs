//! In-memory transaction store keyed by pspReference.
//!
//! Each record walks the lifecycle below; transitions are applied under the
//! map's per-entry lock so concurrent deliveries for the same transaction
//! serialize instead of losing updates. The store is process-local on
//! purpose: durable persistence belongs to the order-management side.
//!
//! ```text
//! INITIALIZED -> PENDING -> SUCCESS | FAILURE
//! PENDING -> ACTION_REQUIRED -> PENDING
//! SUCCESS -> REFUND_PENDING -> REFUNDED | FAILURE
//! any non-terminal -> CANCELED
//! ```

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::session::TransactionSessionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Initialized,
    Pending,
    ActionRequired,
    Success,
    Failure,
    RefundPending,
    Refunded,
    Canceled,
}

impl TransactionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransactionState::Success
                | TransactionState::Failure
                | TransactionState::Refunded
                | TransactionState::Canceled
        )
    }

    pub fn can_transition_to(self, to: TransactionState) -> bool {
        use TransactionState::*;
        match (self, to) {
            (Initialized, Pending) => true,
            (Pending, Success | Failure | ActionRequired) => true,
            (ActionRequired, Pending) => true,
            (Success, RefundPending) => true,
            (RefundPending, Refunded | Failure) => true,
            (from, Canceled) => !from.is_terminal(),
            _ => false,
        }
    }

    /// State the machine lands in for a result the processor just produced.
    pub fn from_result(result: TransactionSessionResult) -> Self {
        use TransactionSessionResult::*;
        match result {
            AuthorizationSuccess | ChargeSuccess => TransactionState::Success,
            AuthorizationFailure | ChargeFailure => TransactionState::Failure,
            AuthorizationActionRequired | ChargeActionRequired => TransactionState::ActionRequired,
            AuthorizationRequest | ChargeRequest => TransactionState::Pending,
        }
    }

    /// Result reported back when a session is re-processed from stored state.
    pub fn session_result(self) -> TransactionSessionResult {
        use TransactionState::*;
        match self {
            Initialized | Pending => TransactionSessionResult::ChargeRequest,
            ActionRequired => TransactionSessionResult::ChargeActionRequired,
            Success | RefundPending | Refunded => TransactionSessionResult::ChargeSuccess,
            Failure | Canceled => TransactionSessionResult::ChargeFailure,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub psp_reference: String,
    pub state: TransactionState,
    pub amount: BigDecimal,
    pub currency: String,
    pub external_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("unknown transaction: {0}")]
    UnknownTransaction(String),
    #[error("illegal transition from {from:?} to {to:?}")]
    IllegalTransition { from: TransactionState, to: TransactionState },
}

#[derive(Clone, Default)]
pub struct TransactionStore {
    inner: Arc<DashMap<String, TransactionRecord>>,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly initialized attempt. Platform retries of the same
    /// logical attempt carry the same pspReference, so this replaces any
    /// previous record for the key.
    pub fn upsert_initialized(
        &self,
        psp_reference: &str,
        amount: BigDecimal,
        currency: &str,
        external_url: Option<String>,
    ) -> TransactionRecord {
        let now = Utc::now();
        let record = TransactionRecord {
            psp_reference: psp_reference.to_string(),
            state: TransactionState::Initialized,
            amount,
            currency: currency.to_string(),
            external_url,
            created_at: now,
            updated_at: now,
        };
        self.inner.insert(psp_reference.to_string(), record.clone());
        record
    }

    pub fn get(&self, psp_reference: &str) -> Option<TransactionRecord> {
        self.inner.get(psp_reference).map(|r| r.value().clone())
    }

    /// Compare-and-swap transition: the current state is validated and
    /// replaced while the entry lock is held.
    pub fn transition(
        &self,
        psp_reference: &str,
        to: TransactionState,
    ) -> Result<TransactionRecord, StoreError> {
        match self.inner.entry(psp_reference.to_string()) {
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                if !record.state.can_transition_to(to) {
                    return Err(StoreError::IllegalTransition { from: record.state, to });
                }
                record.state = to;
                record.updated_at = Utc::now();
                Ok(record.clone())
            }
            Entry::Vacant(_) => Err(StoreError::UnknownTransaction(psp_reference.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
