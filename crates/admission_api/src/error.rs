use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use admission_core::DomainError;
use admission_service::ServiceError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("{0}")]
    BadRequest(String),
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError::Service(ServiceError::Domain(e))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl ApiError {
    fn parts(self) -> (StatusCode, String, Option<Vec<String>>) {
        let domain = match self {
            ApiError::BadRequest(message) => return (StatusCode::BAD_REQUEST, message, None),
            ApiError::Service(ServiceError::Domain(domain)) => domain,
            ApiError::Service(other) => {
                // Upstream details stay in the log.
                error!(error = %other, "request failed");
                let message = match other {
                    ServiceError::Blob(_) | ServiceError::UploadTimeout { .. } => "File upload failed",
                    ServiceError::Provider(_) => "Payment provider request failed",
                    _ => "Internal server error",
                };
                return (StatusCode::INTERNAL_SERVER_ERROR, message.to_string(), None);
            }
        };

        match domain {
            DomainError::Validation(messages) => {
                let message = messages
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "Validation failed".to_string());
                (StatusCode::BAD_REQUEST, message, Some(messages))
            }
            DomainError::NotFound(message) => (StatusCode::NOT_FOUND, message, None),
            DomainError::AlreadySubmitted => (
                StatusCode::CONFLICT,
                DomainError::AlreadySubmitted.to_string(),
                None,
            ),
            DomainError::InvalidSignature => (StatusCode::BAD_REQUEST, "Invalid signature".to_string(), None),
            DomainError::Upload(message) => (StatusCode::BAD_REQUEST, message, None),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, errors) = self.parts();
        let body = match errors {
            Some(errors) => json!({ "success": false, "message": message, "errors": errors }),
            None => json!({ "success": false, "message": message }),
        };
        (status, Json(body)).into_response()
    }
}
