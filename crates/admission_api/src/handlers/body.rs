//! Step bodies arrive as JSON or as multipart form data.

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use serde_json::Value;

use admission_core::models::{FormFields, StagedFile, StepRequest};
use admission_core::DomainError;
use admission_service::{FormPart, StepSubmission};

use crate::{ApiError, IDEMPOTENCY_KEY};

pub enum FormBody {
    Json(Value),
    Parts(Vec<FormPart>),
}

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for FormBody {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if !multipart {
            let Json(value) = Json::<Value>::from_request(req, state).await?;
            return Ok(FormBody::Json(value));
        }

        let mut multipart = Multipart::from_request(req, state).await?;
        let mut parts = Vec::new();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;
                    parts.push(FormPart::File(StagedFile::new(
                        name,
                        filename,
                        content_type,
                        bytes.to_vec(),
                    )));
                }
                None => {
                    let value = field.text().await?;
                    parts.push(FormPart::Text { name, value });
                }
            }
        }
        Ok(FormBody::Parts(parts))
    }
}

impl FormBody {
    pub fn into_step<F: FormFields>(self, step: u8) -> Result<StepSubmission<F>, ApiError> {
        match self {
            FormBody::Json(value) => {
                let request: StepRequest<F> = serde_json::from_value(value)
                    .map_err(|e| DomainError::Validation(vec![format!("Invalid form data: {e}")]))?;
                Ok(StepSubmission::from_json(step, request))
            }
            FormBody::Parts(parts) => Ok(StepSubmission::from_parts(step, parts)?),
        }
    }

    /// Flattens a JSON object into text parts so both encodings share one path.
    pub fn into_parts(self) -> Result<Vec<FormPart>, ApiError> {
        match self {
            FormBody::Parts(parts) => Ok(parts),
            FormBody::Json(Value::Object(map)) => Ok(map
                .into_iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(name, value)| {
                    let value = match value {
                        Value::String(text) => text,
                        other => other.to_string(),
                    };
                    FormPart::Text { name, value }
                })
                .collect()),
            FormBody::Json(_) => Err(ApiError::BadRequest("Expected a JSON object".to_string())),
        }
    }
}

pub fn idempotency_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(IDEMPOTENCY_KEY)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
