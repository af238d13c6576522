//! Client for the commerce platform's transaction-event API. Built per call
//! site from explicit credentials; there is no process-wide singleton.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Credentials handed over by the platform at installation time.
#[derive(Debug, Clone)]
pub struct PlatformAuth {
    pub api_url: String,
    pub token: String,
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("platform request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("platform rejected report with status {0}")]
    Status(u16),
}

/// Out-of-band outcome report for a requested follow-up action.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEventReport {
    pub psp_reference: String,
    pub event_type: String,
    pub amount: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub time: DateTime<Utc>,
}

pub struct PlatformClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl PlatformClient {
    /// The `http` client carries the bounded request timeout; credentials are
    /// per-connection, passed in by the caller.
    pub fn new(http: reqwest::Client, auth: &PlatformAuth) -> Self {
        Self {
            http,
            api_url: auth.api_url.trim_end_matches('/').to_string(),
            token: auth.token.clone(),
        }
    }

    pub async fn report_transaction_event(
        &self,
        report: &TransactionEventReport,
    ) -> Result<(), PlatformError> {
        let url = format!("{}/transaction-events", self.api_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(report)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PlatformError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
