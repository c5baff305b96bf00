use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PaymentStatus::Pending),
            "success" => Some(PaymentStatus::Success),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

/// One verification attempt. Records are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: Uuid,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    /// Minor units (paise), as reported by the provider.
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Order as returned by the provider's orders API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub id: String,
    #[serde(default)]
    pub entity: String,
    pub amount: i64,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: i64,
}

/// Checkout callback payload, field names fixed by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// Converts a major-unit amount to paise.
pub fn to_minor_units(amount: f64) -> Result<i64, DomainError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(DomainError::Validation(vec!["Invalid amount".to_string()]));
    }
    Ok((amount * 100.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_convert_to_paise() {
        assert_eq!(to_minor_units(200.0).unwrap(), 20000);
        assert_eq!(to_minor_units(99.995).unwrap(), 10000);
        assert!(to_minor_units(0.0).is_err());
        assert!(to_minor_units(-5.0).is_err());
        assert!(to_minor_units(f64::NAN).is_err());
    }

    #[test]
    fn provider_order_parses_with_sparse_fields() {
        let order: PaymentOrder = serde_json::from_value(serde_json::json!({
            "id": "order_9A33XWu170gUtm",
            "amount": 50000,
            "currency": "INR"
        }))
        .unwrap();
        assert_eq!(order.amount, 50000);
        assert!(order.receipt.is_none());
    }
}
