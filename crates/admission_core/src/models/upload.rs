use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::form::{FormFields, FormKind};
use crate::validation::{Severity, ValidationError};

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];

/// Stored reference to an uploaded file. Binary content never lives in the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl FileRef {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            filename: None,
            url: url.into(),
            mime_type: None,
            size: None,
        }
    }
}

/// A file received from the client and not yet written to the blob store.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedFile {
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl StagedFile {
    pub fn new(
        field: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            field: field.into(),
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Hex SHA-256 of the content; ties an idempotency receipt to the bytes it stored.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}

/// Scope of an idempotent step upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReceiptKey {
    pub kind: FormKind,
    pub user_id: String,
    pub step: u8,
    pub idempotency_key: String,
}

/// URL already stored for one file of an idempotent upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub field: String,
    pub position: u32,
    pub url: String,
    pub digest: String,
}

/// Text values that reference an already-stored upload pass through untouched.
pub fn looks_like_url(value: &str) -> bool {
    let text = value.trim();
    text.starts_with("http://") || text.starts_with("https://") || text.starts_with('/')
}

/// MIME allow-list and size ceiling applied to every staged file.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: usize,
    pub allowed_mime: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::with_max_bytes(MAX_UPLOAD_BYTES)
    }
}

impl UploadPolicy {
    pub fn with_max_bytes(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            allowed_mime: ALLOWED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn check(&self, file: &StagedFile) -> Result<(), ValidationError> {
        if !self.allowed_mime.iter().any(|m| m == &file.content_type) {
            return Err(ValidationError {
                code: "UPLOAD-001".to_string(),
                severity: Severity::Error,
                message: format!("Unsupported file type: {}", file.content_type),
                field: Some(file.field.clone()),
            });
        }
        if file.bytes.len() > self.max_bytes {
            return Err(ValidationError {
                code: "UPLOAD-002".to_string(),
                severity: Severity::Error,
                message: format!(
                    "File too large: {:.1}MB (max {}MB)",
                    file.bytes.len() as f64 / 1024.0 / 1024.0,
                    self.max_bytes / 1024 / 1024
                ),
                field: Some(file.field.clone()),
            });
        }
        Ok(())
    }

    /// File fields sent as text must reference an upload that already exists.
    pub fn check_links<F: FormFields>(&self, fields: &F) -> Vec<ValidationError> {
        fields
            .file_links()
            .into_iter()
            .filter(|(_, url)| !looks_like_url(url))
            .map(|(field, _)| ValidationError {
                code: "UPLOAD-003".to_string(),
                severity: Severity::Error,
                message: format!("Invalid file reference for {field}: upload the file instead."),
                field: Some(field.to_string()),
            })
            .collect()
    }

    /// Checks every file, collecting one error per offending file.
    pub fn check_all<'a>(
        &self,
        files: impl IntoIterator<Item = &'a StagedFile>,
    ) -> Vec<ValidationError> {
        files
            .into_iter()
            .filter_map(|file| self.check(file).err())
            .collect()
    }
}

pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(content_type: &str, len: usize) -> StagedFile {
        StagedFile::new("photo", "upload", content_type, vec![0u8; len])
    }

    #[test]
    fn accepts_allowed_types_within_limit() {
        let policy = UploadPolicy::default();
        assert!(policy.check(&file("image/png", 1024)).is_ok());
        assert!(policy.check(&file("application/pdf", MAX_UPLOAD_BYTES)).is_ok());
    }

    #[test]
    fn rejects_oversized_and_unlisted_files() {
        let policy = UploadPolicy::default();

        let too_big = policy.check(&file("image/jpeg", 6 * 1024 * 1024)).unwrap_err();
        assert_eq!(too_big.code, "UPLOAD-002");
        assert!(too_big.message.contains("max 5MB"));

        let docx = policy
            .check(&file(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                10,
            ))
            .unwrap_err();
        assert_eq!(docx.code, "UPLOAD-001");
    }

    #[test]
    fn text_file_fields_must_be_links() {
        use crate::models::ApplicationFields;

        let fields = ApplicationFields {
            photo_file: Some("https://cdn/photo.png".into()),
            signature_file: Some("C:\\fakepath\\sig.exe".into()),
            experience_proof_files: Some(vec!["/uploads/a.pdf".into(), "proof.pdf".into()]),
            other_document_file: Some("  ".into()),
            ..Default::default()
        };
        let fields: Vec<String> = UploadPolicy::default()
            .check_links(&fields)
            .into_iter()
            .filter_map(|e| e.field)
            .collect();
        assert_eq!(fields, ["signature", "experienceProofs"]);
    }

    #[test]
    fn url_detection_matches_pass_through_forms() {
        assert!(looks_like_url("https://bucket.s3/x.png"));
        assert!(looks_like_url("  /uploads/x.png"));
        assert!(!looks_like_url("photo.png"));
    }
}
