use bigdecimal::BigDecimal;
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MoneyError {
    #[error("missing amount")]
    Missing,
    #[error("invalid amount: {0}")]
    Invalid(String),
    #[error("negative amount: {0}")]
    Negative(String),
}

/// Parse a monetary amount from an inbound JSON scalar.
///
/// The platform serializes decimals either as strings ("12.50") or as bare
/// numbers. The string path goes straight into `BigDecimal`, so no float
/// round-trip can lose cents on the way in.
pub fn parse_amount(value: &Value) -> Result<BigDecimal, MoneyError> {
    let amount = match value {
        Value::String(s) => {
            BigDecimal::from_str(s.trim()).map_err(|_| MoneyError::Invalid(s.clone()))?
        }
        Value::Number(n) => {
            BigDecimal::from_str(&n.to_string()).map_err(|_| MoneyError::Invalid(n.to_string()))?
        }
        Value::Null => return Err(MoneyError::Missing),
        other => return Err(MoneyError::Invalid(other.to_string())),
    };
    if amount < BigDecimal::from(0) {
        return Err(MoneyError::Negative(amount.to_string()));
    }
    Ok(amount)
}

/// Normalize a monetary value to 2 decimal places.
pub fn normalize_scale(value: &BigDecimal) -> BigDecimal {
    value.with_scale(2)
}
