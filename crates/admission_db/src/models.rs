use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use admission_core::models::{
    ContactSubmission, FormKind, NewContact, PaymentRecord, PaymentStatus, StoredForm,
};

use crate::error::{Error, Result};

pub fn table(kind: FormKind) -> &'static str {
    match kind {
        FormKind::Application => "applications",
        FormKind::Enrollment => "enrollments",
    }
}

#[derive(Debug, FromRow)]
pub struct FormRow {
    pub id: Uuid,
    pub user_id: String,
    pub document: Json<Map<String, Value>>,
    pub current_step: i16,
    pub is_final_submitted: bool,
    pub final_submitted_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl FormRow {
    pub fn into_stored(self, kind: FormKind) -> StoredForm {
        StoredForm {
            id: self.id,
            kind,
            user_id: self.user_id,
            document: self.document.0,
            current_step: self.current_step.clamp(0, i16::from(u8::MAX)) as u8,
            is_final_submitted: self.is_final_submitted,
            final_submitted_at: self.final_submitted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub created_at: OffsetDateTime,
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = Error;

    fn try_from(row: PaymentRow) -> Result<Self> {
        let status = PaymentStatus::parse(&row.status)
            .ok_or_else(|| Error::Document(format!("unknown payment status '{}'", row.status)))?;
        Ok(PaymentRecord {
            id: row.id,
            razorpay_order_id: row.razorpay_order_id,
            razorpay_payment_id: row.razorpay_payment_id,
            razorpay_signature: row.razorpay_signature,
            amount: row.amount,
            currency: row.currency,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct ContactRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
    pub course: Option<String>,
    pub location: Option<String>,
    pub created_at: OffsetDateTime,
}

impl From<ContactRow> for ContactSubmission {
    fn from(row: ContactRow) -> Self {
        ContactSubmission {
            id: row.id,
            contact: NewContact {
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
                phone: row.phone,
                subject: row.subject,
                message: row.message,
                course: row.course,
                location: row.location,
            },
            created_at: row.created_at,
        }
    }
}

/// SQL for the two form tables. Table names come from `table`, never from input.
pub struct FormQuery;

const FORM_COLUMNS: &str =
    "id, user_id, document, current_step, is_final_submitted, final_submitted_at, created_at, updated_at";

impl FormQuery {
    /// Shallow JSONB merge and monotonic step in one statement. A finalized
    /// row is left untouched and no row comes back.
    pub fn upsert_step(kind: FormKind) -> String {
        let t = table(kind);
        format!(
            r#"
            INSERT INTO {t} (id, user_id, document, current_step)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET document = {t}.document || EXCLUDED.document,
                current_step = GREATEST({t}.current_step, EXCLUDED.current_step),
                updated_at = now()
            WHERE {t}.is_final_submitted = FALSE
            RETURNING {FORM_COLUMNS}
            "#
        )
    }

    pub fn find_by_user(kind: FormKind) -> String {
        format!("SELECT {FORM_COLUMNS} FROM {} WHERE user_id = $1", table(kind))
    }

    pub fn find_by_id(kind: FormKind) -> String {
        format!("SELECT {FORM_COLUMNS} FROM {} WHERE id = $1", table(kind))
    }

    pub fn finalized_mobile_exists(kind: FormKind) -> String {
        format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE is_final_submitted AND document ->> $2 = $1)",
            table(kind)
        )
    }

    pub fn finalize(kind: FormKind) -> String {
        let t = table(kind);
        format!(
            r#"
            UPDATE {t}
            SET is_final_submitted = TRUE, final_submitted_at = now(), updated_at = now()
            WHERE user_id = $1 AND is_final_submitted = FALSE
            RETURNING {FORM_COLUMNS}
            "#
        )
    }

    pub fn insert_finalized(kind: FormKind) -> String {
        format!(
            r#"
            INSERT INTO {} (id, user_id, document, current_step, is_final_submitted, final_submitted_at)
            VALUES ($1, $2, $3, $4, TRUE, now())
            RETURNING {FORM_COLUMNS}
            "#,
            table(kind)
        )
    }
}
