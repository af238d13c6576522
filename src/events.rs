//! Inbound webhook payload models. Field sets mirror the subscription
//! fragments registered in the manifest; anything the platform may omit is
//! optional so a handler never panics on a thin payload.

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::Value;

use crate::session::TransactionAction;

#[derive(Debug, Clone, Deserialize)]
pub struct Principal {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub id: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TotalPrice {
    pub gross: GrossMoney,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrossMoney {
    pub amount: BigDecimal,
}

/// Commerce object a transaction originates from: a pre-purchase checkout or
/// a placed order.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "__typename")]
pub enum SourceObject {
    #[serde(rename_all = "camelCase")]
    Checkout {
        id: String,
        channel: Channel,
        language_code: Option<String>,
        email: Option<String>,
        total: Option<TotalPrice>,
    },
    #[serde(rename_all = "camelCase")]
    Order {
        id: String,
        channel: Channel,
        language_code_enum: Option<String>,
        user_email: Option<String>,
        total: Option<TotalPrice>,
    },
}

impl SourceObject {
    pub fn id(&self) -> &str {
        match self {
            SourceObject::Checkout { id, .. } | SourceObject::Order { id, .. } => id,
        }
    }

    pub fn channel(&self) -> &Channel {
        match self {
            SourceObject::Checkout { channel, .. } | SourceObject::Order { channel, .. } => channel,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            SourceObject::Checkout { email, .. } => email.as_deref(),
            SourceObject::Order { user_email, .. } => user_email.as_deref(),
        }
    }
}

/// What the platform asks the gateway to do with the money.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionActionRequest {
    /// Raw JSON scalar; parsed losslessly via [`crate::money::parse_amount`].
    pub amount: Value,
    pub currency: String,
    pub action_type: TransactionAction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRef {
    pub psp_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentGatewayInitializeSession {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub amount: Value,
    pub issuing_principal: Option<Principal>,
    pub source_object: Option<SourceObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInitializeSession {
    #[serde(default)]
    pub data: Value,
    pub action: TransactionActionRequest,
    pub issuing_principal: Option<Principal>,
    pub source_object: Option<SourceObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionProcessSession {
    #[serde(default)]
    pub data: Value,
    pub issuing_principal: Option<Principal>,
    pub source_object: Option<SourceObject>,
    pub transaction: Option<TransactionRef>,
}

/// Shared shape of the follow-up request events (charge, cancelation,
/// refund). The reference scheme delivers only the issuing principal; the
/// transaction handle is what a processing implementation keys on.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionActionRequested {
    pub issuing_principal: Option<Principal>,
    pub transaction: Option<TransactionRef>,
    pub action: Option<RequestedAction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedAction {
    #[serde(default)]
    pub amount: Value,
    pub action_type: Option<TransactionAction>,
}
