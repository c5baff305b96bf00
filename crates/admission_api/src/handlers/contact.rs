use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use admission_core::models::NewContact;

use crate::{ApiError, AppState};

pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<NewContact>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(contact) = payload?;
    let saved = state.service.submit_contact(contact).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Message sent successfully",
            "data": saved,
        })),
    ))
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let all = state.service.list_contacts().await?;
    Ok(Json(json!({ "success": true, "data": all })))
}
