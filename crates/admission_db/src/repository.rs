use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use admission_core::models::{
    ContactSubmission, FormKind, PaymentRecord, ReceiptKey, StoredForm, UploadReceipt,
};

use crate::error::{Error, Result};
use crate::models::{ContactRow, FormQuery, FormRow, PaymentRow};

fn db(e: sqlx::Error) -> Error {
    Error::Database(e.to_string())
}

/// Postgres persistence for both wizards, payments, contacts and upload receipts.
#[derive(Clone)]
pub struct FormRepository {
    pool: PgPool,
}

impl FormRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map_err(db)?;
        Ok(())
    }

    // ---------------------------------------------------------
    // Forms
    // ---------------------------------------------------------

    /// Returns `None` when the row exists and is already finalized.
    pub async fn upsert_step(
        &self,
        kind: FormKind,
        user_id: &str,
        patch: Map<String, Value>,
        step: u8,
    ) -> Result<Option<StoredForm>> {
        let row: Option<FormRow> = sqlx::query_as(&FormQuery::upsert_step(kind))
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(Json(patch))
            .bind(i16::from(step))
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;
        Ok(row.map(|r| r.into_stored(kind)))
    }

    pub async fn find_by_user(&self, kind: FormKind, user_id: &str) -> Result<Option<StoredForm>> {
        let row: Option<FormRow> = sqlx::query_as(&FormQuery::find_by_user(kind))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;
        Ok(row.map(|r| r.into_stored(kind)))
    }

    pub async fn find_by_id(&self, kind: FormKind, id: Uuid) -> Result<Option<StoredForm>> {
        let row: Option<FormRow> = sqlx::query_as(&FormQuery::find_by_id(kind))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;
        Ok(row.map(|r| r.into_stored(kind)))
    }

    pub async fn finalized_mobile_exists(&self, kind: FormKind, mobile: &str) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(&FormQuery::finalized_mobile_exists(kind))
            .bind(mobile)
            .bind(kind.mobile_field())
            .fetch_one(&self.pool)
            .await
            .map_err(db)?;
        Ok(exists)
    }

    /// Returns `None` when there is no open row for the user.
    pub async fn finalize(&self, kind: FormKind, user_id: &str) -> Result<Option<StoredForm>> {
        let row: Option<FormRow> = sqlx::query_as(&FormQuery::finalize(kind))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db)?;
        Ok(row.map(|r| r.into_stored(kind)))
    }

    pub async fn insert_finalized(
        &self,
        kind: FormKind,
        user_id: &str,
        document: Map<String, Value>,
        step: u8,
    ) -> Result<StoredForm> {
        let row: FormRow = sqlx::query_as(&FormQuery::insert_finalized(kind))
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(Json(document))
            .bind(i16::from(step))
            .fetch_one(&self.pool)
            .await
            .map_err(db)?;
        Ok(row.into_stored(kind))
    }

    // ---------------------------------------------------------
    // Payments
    // ---------------------------------------------------------

    pub async fn insert_payment(&self, record: &PaymentRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments
            (id, razorpay_order_id, razorpay_payment_id, razorpay_signature, amount, currency, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(&record.razorpay_order_id)
        .bind(&record.razorpay_payment_id)
        .bind(&record.razorpay_signature)
        .bind(record.amount)
        .bind(&record.currency)
        .bind(record.status.as_str())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(())
    }

    /// Latest attempt recorded for an order.
    pub async fn find_payment_by_order(&self, order_id: &str) -> Result<Option<PaymentRecord>> {
        let row: Option<PaymentRow> = sqlx::query_as(
            r#"
            SELECT id, razorpay_order_id, razorpay_payment_id, razorpay_signature,
                   amount, currency, status, created_at
            FROM payments
            WHERE razorpay_order_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;
        row.map(PaymentRecord::try_from).transpose()
    }

    // ---------------------------------------------------------
    // Contact form
    // ---------------------------------------------------------

    pub async fn insert_contact(&self, submission: &ContactSubmission) -> Result<()> {
        let c = &submission.contact;
        sqlx::query(
            r#"
            INSERT INTO contact_submissions
            (id, first_name, last_name, email, phone, subject, message, course, location, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(submission.id)
        .bind(&c.first_name)
        .bind(&c.last_name)
        .bind(&c.email)
        .bind(&c.phone)
        .bind(&c.subject)
        .bind(&c.message)
        .bind(&c.course)
        .bind(&c.location)
        .bind(submission.created_at)
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(())
    }

    pub async fn list_contacts(&self) -> Result<Vec<ContactSubmission>> {
        let rows: Vec<ContactRow> = sqlx::query_as(
            r#"
            SELECT id, first_name, last_name, email, phone, subject, message, course, location, created_at
            FROM contact_submissions
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;
        Ok(rows.into_iter().map(ContactSubmission::from).collect())
    }

    // ---------------------------------------------------------
    // Upload receipts
    // ---------------------------------------------------------

    pub async fn find_receipts(&self, key: &ReceiptKey) -> Result<Vec<UploadReceipt>> {
        let rows: Vec<(String, i32, String, String)> = sqlx::query_as(
            r#"
            SELECT field, position, url, digest
            FROM upload_receipts
            WHERE user_id = $1 AND form_kind = $2 AND step = $3 AND idempotency_key = $4
            ORDER BY field, position
            "#,
        )
        .bind(&key.user_id)
        .bind(key.kind.as_str())
        .bind(i16::from(key.step))
        .bind(&key.idempotency_key)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        Ok(rows
            .into_iter()
            .map(|(field, position, url, digest)| UploadReceipt {
                field,
                position: position.max(0) as u32,
                url,
                digest,
            })
            .collect())
    }

    /// For the same content the first write wins, so a concurrent retry keeps
    /// the earlier URL. Different content under the same key replaces it.
    pub async fn save_receipt(&self, key: &ReceiptKey, receipt: &UploadReceipt) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO upload_receipts (user_id, form_kind, step, idempotency_key, field, position, url, digest)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, form_kind, step, idempotency_key, field, position)
            DO UPDATE SET url = EXCLUDED.url, digest = EXCLUDED.digest, created_at = now()
            WHERE upload_receipts.digest <> EXCLUDED.digest
            "#,
        )
        .bind(&key.user_id)
        .bind(key.kind.as_str())
        .bind(i16::from(key.step))
        .bind(&key.idempotency_key)
        .bind(&receipt.field)
        .bind(i32::try_from(receipt.position).unwrap_or(i32::MAX))
        .bind(&receipt.url)
        .bind(&receipt.digest)
        .execute(&self.pool)
        .await
        .map_err(db)?;
        Ok(())
    }
}
