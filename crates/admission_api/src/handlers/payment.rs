use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use admission_core::models::PaymentVerification;
use admission_core::DomainError;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateOrder {
    #[serde(default)]
    pub amount: Value,
}

impl CreateOrder {
    /// Amounts may arrive as numbers or numeric strings.
    fn rupees(&self) -> Result<f64, DomainError> {
        let parsed = match &self.amount {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| DomainError::Validation(vec!["Invalid amount".to_string()]))
    }
}

pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrder>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let order = state.service.create_order(body.rupees()?).await?;
    Ok(Json(json!({ "success": true, "order": order })))
}

pub async fn verify(
    State(state): State<AppState>,
    payload: Result<Json<PaymentVerification>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let record = state.service.verify_payment(body).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Payment verified and stored",
        "payment": record,
    })))
}

pub async fn order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let record = state.service.payment_for_order(&order_id).await?;
    Ok(Json(json!({ "success": true, "payment": record })))
}
