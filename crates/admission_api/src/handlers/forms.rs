use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use admission_core::models::{ApplicationFields, EnrollmentFields, FormFields, FormRecord};
use admission_core::DomainError;
use admission_service::DirectEnrollment;

use crate::handlers::body::{idempotency_key, FormBody};
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalSubmit {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Serialize)]
struct Created {
    success: bool,
    #[serde(flatten)]
    enrollment: DirectEnrollment,
}

fn envelope<F: FormFields>(message: String, record: Option<FormRecord<F>>) -> Json<Value> {
    let key = F::KIND.envelope_key();
    Json(json!({
        "success": true,
        "message": message,
        key: record,
    }))
}

fn parse_step<F: FormFields>(raw: &str) -> Result<u8, ApiError> {
    raw.parse::<u8>()
        .ok()
        .filter(|step| F::KIND.data_steps().contains(step))
        .ok_or_else(|| DomainError::NotFound(format!("{} step {raw} does not exist", F::KIND.label())).into())
}

fn parse_id<F: FormFields>(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| DomainError::NotFound(format!("{} not found", F::KIND.label())).into())
}

pub async fn application_step(
    State(state): State<AppState>,
    Path(step): Path<String>,
    headers: HeaderMap,
    body: FormBody,
) -> Result<Json<Value>, ApiError> {
    let step = parse_step::<ApplicationFields>(&step)?;
    let submission = body
        .into_step::<ApplicationFields>(step)?
        .with_idempotency_key(idempotency_key(&headers));
    let record = state.service.submit_application_step(submission).await?;
    Ok(envelope(format!("Step {step} saved"), Some(record)))
}

pub async fn enrollment_step(
    State(state): State<AppState>,
    Path(step): Path<String>,
    headers: HeaderMap,
    body: FormBody,
) -> Result<Json<Value>, ApiError> {
    let step = parse_step::<EnrollmentFields>(&step)?;
    let submission = body
        .into_step::<EnrollmentFields>(step)?
        .with_idempotency_key(idempotency_key(&headers));
    let record = state.service.submit_enrollment_step(submission).await?;
    Ok(envelope(format!("Step {step} saved"), Some(record)))
}

pub async fn application_final_submit(
    State(state): State<AppState>,
    payload: Result<Json<FinalSubmit>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let record = state.service.finalize_application(&body.user_id).await?;
    Ok(envelope("Application submitted successfully".to_string(), Some(record)))
}

pub async fn enrollment_final_submit(
    State(state): State<AppState>,
    payload: Result<Json<FinalSubmit>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let record = state.service.finalize_enrollment(&body.user_id).await?;
    Ok(envelope("Enrollment submitted successfully".to_string(), Some(record)))
}

/// A missing application is not an error: the wizard starts fresh.
pub async fn application_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let record = state.service.application_for_user(&user_id).await?;
    let message = if record.is_some() { "Application found" } else { "No application yet" };
    Ok(envelope(message.to_string(), record))
}

pub async fn enrollment_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let record = state
        .service
        .enrollment_for_user(&user_id)
        .await?
        .ok_or_else(|| DomainError::NotFound("Enrollment not found".to_string()))?;
    Ok(envelope("Enrollment found".to_string(), Some(record)))
}

pub async fn application_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id::<ApplicationFields>(&id)?;
    let record = state.service.application_by_id(id).await?;
    Ok(envelope("Application found".to_string(), Some(record)))
}

pub async fn enrollment_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id::<EnrollmentFields>(&id)?;
    let record = state.service.enrollment_by_id(id).await?;
    Ok(envelope("Enrollment found".to_string(), Some(record)))
}

pub async fn enroll_direct(
    State(state): State<AppState>,
    body: FormBody,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.service.enroll_direct(body.into_parts()?).await?;
    Ok((
        StatusCode::CREATED,
        Json(Created {
            success: true,
            enrollment: created,
        }),
    ))
}
