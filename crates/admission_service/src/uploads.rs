//! Turning request bodies into step submissions, and staged files into stored objects.

use std::collections::HashMap;

use futures::future::try_join_all;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::{debug, error};
use uuid::Uuid;

use admission_core::models::upload::{extension_for_mime, looks_like_url};
use admission_core::models::{
    FileRef, FormFields, FormKind, ReceiptKey, StagedFile, StepRequest, UploadReceipt,
};
use admission_core::{resolve_upload_folder, DomainError};

use crate::error::{Result, ServiceError};
use crate::AdmissionService;

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text { name: String, value: String },
    File(StagedFile),
}

/// A single wizard step as received from the client.
#[derive(Debug, Clone)]
pub struct StepSubmission<F> {
    pub user_id: String,
    pub step: u8,
    pub fields: F,
    pub files: Vec<StagedFile>,
    pub idempotency_key: Option<String>,
}

impl<F: FormFields> StepSubmission<F> {
    pub fn from_json(step: u8, request: StepRequest<F>) -> Self {
        Self {
            user_id: request.user_id,
            step,
            fields: request.fields,
            files: Vec::new(),
            idempotency_key: request.idempotency_key,
        }
    }

    pub fn from_parts(step: u8, parts: Vec<FormPart>) -> std::result::Result<Self, DomainError> {
        let assembled = assemble::<F>(parts, F::file_fields(step))?;
        Ok(Self {
            user_id: assembled.user_id,
            step,
            fields: assembled.fields,
            files: assembled.files,
            idempotency_key: assembled.idempotency_key,
        })
    }

    pub fn with_idempotency_key(mut self, key: Option<String>) -> Self {
        if self.idempotency_key.is_none() {
            self.idempotency_key = key.filter(|k| !k.trim().is_empty());
        }
        self
    }
}

#[derive(Debug)]
pub struct Assembled<F> {
    pub user_id: String,
    pub idempotency_key: Option<String>,
    pub fields: F,
    pub files: Vec<StagedFile>,
}

/// Splits multipart parts into typed fields and staged files. Text parts
/// under a file field that look like URLs reference earlier uploads and are
/// attached as-is.
pub fn assemble<F: FormFields>(
    parts: Vec<FormPart>,
    file_fields: &[&str],
) -> std::result::Result<Assembled<F>, DomainError> {
    let mut user_id = String::new();
    let mut idempotency_key = None;
    let mut map = Map::new();
    let mut passthrough = Vec::new();
    let mut files = Vec::new();

    for part in parts {
        match part {
            FormPart::Text { name, value } => match name.as_str() {
                "userId" => user_id = value.trim().to_string(),
                "idempotencyKey" => idempotency_key = Some(value.trim().to_string()).filter(|k| !k.is_empty()),
                n if file_fields.contains(&n) => {
                    if looks_like_url(&value) {
                        passthrough.push((name, FileRef::from_url(value.trim())));
                    }
                }
                _ => {
                    map.insert(name, Value::String(value));
                }
            },
            FormPart::File(file) => {
                if file.bytes.is_empty() && file.filename.is_empty() {
                    continue; // no file chosen in the browser
                }
                if !file_fields.contains(&file.field.as_str()) {
                    return Err(DomainError::Validation(vec![format!(
                        "Unexpected file field: {}",
                        file.field
                    )]));
                }
                files.push(file);
            }
        }
    }

    let mut fields: F = serde_json::from_value(Value::Object(map))
        .map_err(|e| DomainError::Validation(vec![format!("Invalid form data: {e}")]))?;
    for (name, file) in passthrough {
        fields.attach_file(&name, file)?;
    }

    Ok(Assembled {
        user_id,
        idempotency_key,
        fields,
        files,
    })
}

/// `{folder}/{user}_{field}-{millis}-{uuid}.{ext}` with whitespace and slashes flattened.
pub fn object_key(kind: FormKind, field: &str, user_id: &str, mime: &str) -> String {
    let folder = resolve_upload_folder(kind, field);
    let prefix = format!("{user_id}_{field}")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace('/', "_");
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!(
        "{folder}/{prefix}-{millis}-{}.{}",
        Uuid::new_v4(),
        extension_for_mime(mime)
    )
}

/// Position of each file among the files sharing its field, in arrival order.
fn positions(files: &[StagedFile]) -> Vec<u32> {
    let mut seen: HashMap<&str, u32> = HashMap::new();
    files
        .iter()
        .map(|f| {
            let slot = seen.entry(f.field.as_str()).or_insert(0);
            let position = *slot;
            *slot += 1;
            position
        })
        .collect()
}

impl AdmissionService {
    /// Stores every staged file concurrently, each bounded by the upload
    /// timeout. With an idempotency key, a file whose content was already
    /// stored under the same key and slot is reused instead of uploaded again.
    pub(crate) async fn store_files(
        &self,
        kind: FormKind,
        user_id: &str,
        step: u8,
        files: Vec<StagedFile>,
        idempotency_key: Option<&str>,
    ) -> Result<Vec<(String, FileRef)>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let receipt_key = idempotency_key.map(|key| ReceiptKey {
            kind,
            user_id: user_id.to_string(),
            step,
            idempotency_key: key.to_string(),
        });
        let receipts = match &receipt_key {
            Some(key) => self.store.find_receipts(key).await?,
            None => Vec::new(),
        };

        let positions = positions(&files);
        let uploads = files.into_iter().zip(positions).map(|(file, position)| {
            let receipt_key = receipt_key.as_ref();
            let digest = file.digest();
            let previous = receipts
                .iter()
                .find(|r| r.field == file.field && r.position == position && r.digest == digest)
                .map(|r| r.url.clone());
            async move {
                let file_ref = |url: String| FileRef {
                    filename: Some(file.filename.clone()),
                    url,
                    mime_type: Some(file.content_type.clone()),
                    size: Some(file.bytes.len() as u64),
                };

                if let Some(url) = previous {
                    debug!(field = %file.field, position, "reusing stored upload");
                    return Ok::<_, ServiceError>((file.field.clone(), file_ref(url)));
                }

                let key = object_key(kind, &file.field, user_id, &file.content_type);
                let put = self.blobs.put(&key, &file.content_type, file.bytes.clone());
                let url = match tokio::time::timeout(self.settings.upload_timeout, put).await {
                    Ok(result) => result?,
                    Err(_) => {
                        error!(field = %file.field, "upload timed out");
                        return Err(ServiceError::UploadTimeout {
                            field: file.field.clone(),
                            after: self.settings.upload_timeout,
                        });
                    }
                };

                if let Some(receipt_key) = receipt_key {
                    let receipt = UploadReceipt {
                        field: file.field.clone(),
                        position,
                        url: url.clone(),
                        digest,
                    };
                    self.store.save_receipt(receipt_key, &receipt).await?;
                }
                Ok((file.field.clone(), file_ref(url)))
            }
        });

        try_join_all(uploads).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admission_core::models::{ApplicationFields, EnrollmentFields};

    fn text(name: &str, value: &str) -> FormPart {
        FormPart::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    #[test]
    fn multipart_parts_become_fields_files_and_links() {
        let parts = vec![
            text("userId", " u1 "),
            text("idempotencyKey", "k-1"),
            text("photo", "https://cdn/photo.png"),
            FormPart::File(StagedFile::new("signature", "sig.png", "image/png", vec![1, 2, 3])),
            FormPart::File(StagedFile::new("experienceProofs", "", "application/octet-stream", vec![])),
        ];
        let sub = StepSubmission::<ApplicationFields>::from_parts(5, parts).unwrap();
        assert_eq!(sub.user_id, "u1");
        assert_eq!(sub.idempotency_key.as_deref(), Some("k-1"));
        assert_eq!(sub.fields.photo_file.as_deref(), Some("https://cdn/photo.png"));
        assert_eq!(sub.files.len(), 1);
        assert_eq!(sub.files[0].field, "signature");
    }

    #[test]
    fn file_on_a_text_only_step_is_rejected() {
        let parts = vec![
            text("userId", "u1"),
            FormPart::File(StagedFile::new("photograph", "p.png", "image/png", vec![1])),
        ];
        assert!(StepSubmission::<EnrollmentFields>::from_parts(1, parts).is_err());
    }

    #[test]
    fn text_values_are_typed() {
        let parts = vec![
            text("userId", "u1"),
            text("fullName", "Ravi Kumar"),
            text("gender", "male"),
            text("infoDeclaration", "true"),
        ];
        let assembled = assemble::<EnrollmentFields>(parts, &[]).unwrap();
        assert_eq!(assembled.fields.full_name.as_deref(), Some("Ravi Kumar"));
        assert_eq!(assembled.fields.info_declaration, Some(true));
    }

    #[test]
    fn object_keys_are_foldered_and_flattened() {
        let key = object_key(FormKind::Enrollment, "aadhaarCard", "Ravi Kumar", "application/pdf");
        assert!(key.starts_with("enrollments/aadhaar/Ravi_Kumar_aadhaarCard-"));
        assert!(key.ends_with(".pdf"));
    }

    #[test]
    fn positions_count_per_field() {
        let files = vec![
            StagedFile::new("experienceProofs", "a.pdf", "application/pdf", vec![1]),
            StagedFile::new("photo", "p.png", "image/png", vec![1]),
            StagedFile::new("experienceProofs", "b.pdf", "application/pdf", vec![1]),
        ];
        assert_eq!(positions(&files), vec![0, 0, 1]);
    }
}
