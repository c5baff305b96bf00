use std::fmt::Debug;
use std::ops::RangeInclusive;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::upload::FileRef;

// ---------------------------------------------------------------------------
// Which wizard a record belongs to
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    Application,
    Enrollment,
}

impl FormKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FormKind::Application => "application",
            FormKind::Enrollment => "enrollment",
        }
    }

    /// Steps that carry data. Finalization sits after the last one.
    pub fn data_steps(self) -> RangeInclusive<u8> {
        match self {
            FormKind::Application => 1..=7,
            FormKind::Enrollment => 1..=6,
        }
    }

    pub fn last_data_step(self) -> u8 {
        *self.data_steps().end()
    }

    /// Document key that holds the applicant's phone number.
    pub fn mobile_field(self) -> &'static str {
        match self {
            FormKind::Application => "mobile",
            FormKind::Enrollment => "mobileNumber",
        }
    }

    pub fn upload_root(self) -> &'static str {
        match self {
            FormKind::Application => "applications",
            FormKind::Enrollment => "enrollments",
        }
    }

    /// Key used for the record in response envelopes.
    pub fn envelope_key(self) -> &'static str {
        self.as_str()
    }

    pub fn label(self) -> &'static str {
        match self {
            FormKind::Application => "Application",
            FormKind::Enrollment => "Enrollment",
        }
    }
}

// ---------------------------------------------------------------------------
// Per-wizard field groups
// ---------------------------------------------------------------------------
pub trait FormFields:
    Serialize + DeserializeOwned + Default + Clone + Debug + PartialEq + Send + Sync + 'static
{
    const KIND: FormKind;

    /// Copy of `self` holding only the fields owned by `step`.
    fn restrict_to_step(&self, step: u8) -> Self;

    /// Multipart field names that carry files for `step`.
    fn file_fields(step: u8) -> &'static [&'static str];

    /// Whether a file field accepts several files.
    fn is_multi_file(_field: &str) -> bool {
        false
    }

    /// Stores an uploaded (or passed-through) file reference on the matching field.
    fn attach_file(&mut self, field: &str, file: FileRef) -> Result<(), DomainError>;

    /// Whether a stored reference exists for a file field.
    fn has_file(&self, field: &str) -> bool;

    /// Every non-blank file reference, paired with its upload field.
    fn file_links(&self) -> Vec<(&'static str, &str)>;

    fn mobile(&self) -> Option<&str>;

    /// Recomputes values derived from this step's inputs.
    fn apply_derived(&mut self, _step: u8, _today: Date) {}

    /// Replaces secrets with their stored form before a write.
    fn seal(&mut self, _user_id: &str) {}

    /// Strips values that must never leave the server.
    fn redacted(self) -> Self {
        self
    }
}

/// Serializes the populated fields into a top-level JSON patch.
pub fn to_patch<F: Serialize>(fields: &F) -> serde_json::Result<Map<String, Value>> {
    match serde_json::to_value(fields)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

/// Field-level last-write-wins merge, the same semantics the document store applies.
pub fn merge_fields<F: FormFields>(base: &F, patch: &F) -> serde_json::Result<F> {
    let mut merged = to_patch(base)?;
    merged.extend(to_patch(patch)?);
    serde_json::from_value(Value::Object(merged))
}

/// Deserializers for values that arrive as text from multipart bodies.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrText {
        Bool(bool),
        Text(String),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    pub fn bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(match Option::<BoolOrText>::deserialize(d)? {
            None => None,
            Some(BoolOrText::Bool(b)) => Some(b),
            Some(BoolOrText::Text(t)) => Some(t.trim() == "true"),
        })
    }

    /// Blank or non-numeric text reads as absent.
    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<NumberOrText>::deserialize(d)? {
            None => None,
            Some(NumberOrText::Number(n)) => Some(n),
            Some(NumberOrText::Text(t)) => t.trim().parse::<f64>().ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// Persisted record: field groups plus progress metadata
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormRecord<F> {
    pub id: Uuid,
    pub user_id: String,

    #[serde(flatten)]
    pub fields: F,

    pub current_step: u8,
    pub is_final_submitted: bool,

    #[serde(with = "time::serde::rfc3339::option", default)]
    pub final_submitted_at: Option<OffsetDateTime>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl<F: FormFields> FormRecord<F> {
    pub fn redacted(self) -> Self {
        Self {
            fields: self.fields.redacted(),
            ..self
        }
    }
}

/// A stored form before it is typed: the field document plus progress metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredForm {
    pub id: Uuid,
    pub kind: FormKind,
    pub user_id: String,
    pub document: Map<String, Value>,
    pub current_step: u8,
    pub is_final_submitted: bool,
    pub final_submitted_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl StoredForm {
    pub fn into_record<F: FormFields>(self) -> serde_json::Result<FormRecord<F>> {
        Ok(FormRecord {
            id: self.id,
            user_id: self.user_id,
            fields: serde_json::from_value(Value::Object(self.document))?,
            current_step: self.current_step,
            is_final_submitted: self.is_final_submitted,
            final_submitted_at: self.final_submitted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Body of a JSON step submission: `{userId, ...stepFields}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRequest<F> {
    #[serde(default)]
    pub user_id: String,

    /// Client-generated key that makes file uploads safe to retry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,

    #[serde(flatten)]
    pub fields: F,
}
