use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use admission_core::models::{
    to_minor_units, PaymentOrder, PaymentRecord, PaymentStatus, PaymentVerification,
};
use admission_core::signature::verify_payment_signature;
use admission_core::DomainError;

use crate::error::{Result, ServiceError};
use crate::AdmissionService;

pub const CURRENCY: &str = "INR";

impl AdmissionService {
    /// Opens a provider order for `amount` rupees.
    pub async fn create_order(&self, amount: f64) -> Result<PaymentOrder> {
        let amount_minor = to_minor_units(amount)?;
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let receipt = format!("receipt_{millis}");

        let order = self
            .payments
            .create_order(amount_minor, CURRENCY, &receipt)
            .await
            .map_err(|e| {
                error!(error = %e, amount_minor, "order creation failed");
                e
            })?;
        info!(order_id = %order.id, amount_minor, "payment order created");
        Ok(order)
    }

    /// Checks the checkout signature and records the attempt. The amount is
    /// taken from the provider's copy of the order; if that lookup fails
    /// nothing is stored. A stored `failed` attempt still returns
    /// `InvalidSignature`.
    pub async fn verify_payment(&self, verification: PaymentVerification) -> Result<PaymentRecord> {
        let PaymentVerification {
            razorpay_order_id,
            razorpay_payment_id,
            razorpay_signature,
        } = verification;

        let missing: Vec<String> = [
            ("razorpay_order_id", &razorpay_order_id),
            ("razorpay_payment_id", &razorpay_payment_id),
            ("razorpay_signature", &razorpay_signature),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| format!("{name} is required"))
        .collect();
        if !missing.is_empty() {
            return Err(DomainError::Validation(missing).into());
        }

        let valid = verify_payment_signature(
            &self.settings.payment_secret,
            &razorpay_order_id,
            &razorpay_payment_id,
            &razorpay_signature,
        );

        let order = self
            .payments
            .fetch_order(&razorpay_order_id)
            .await
            .map_err(|e| {
                error!(order_id = %razorpay_order_id, error = %e, "order lookup failed");
                e
            })?;

        let record = PaymentRecord {
            id: Uuid::new_v4(),
            razorpay_order_id,
            razorpay_payment_id,
            razorpay_signature,
            amount: order.amount,
            currency: CURRENCY.to_string(),
            status: if valid {
                PaymentStatus::Success
            } else {
                PaymentStatus::Failed
            },
            created_at: OffsetDateTime::now_utc(),
        };
        self.store.insert_payment(&record).await?;

        if !valid {
            warn!(order_id = %record.razorpay_order_id, "payment signature mismatch");
            return Err(ServiceError::Domain(DomainError::InvalidSignature));
        }
        info!(order_id = %record.razorpay_order_id, amount = record.amount, "payment verified");
        Ok(record)
    }

    /// Latest stored attempt for an order.
    pub async fn payment_for_order(&self, order_id: &str) -> Result<PaymentRecord> {
        self.store
            .find_payment(order_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Payment not found".to_string()).into())
    }
}
