//! Seams between the admission workflow and the outside world. Each port has
//! a production adapter and an in-memory one for tests.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use admission_core::models::{
    ContactSubmission, FormKind, PaymentOrder, PaymentRecord, ReceiptKey, StoredForm,
    UploadReceipt,
};

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct StoreError(pub String);

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct BlobError(pub String);

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct ProviderError(pub String);

/// Per-user form documents plus the append-only side tables.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Merges `patch` into the user's document and raises `current_step` to
    /// at least `step`, creating the row if needed. `None` means the row is
    /// already finalized and was left untouched.
    async fn upsert_step(
        &self,
        kind: FormKind,
        user_id: &str,
        patch: Map<String, Value>,
        step: u8,
    ) -> Result<Option<StoredForm>, StoreError>;

    async fn find_by_user(&self, kind: FormKind, user_id: &str) -> Result<Option<StoredForm>, StoreError>;

    async fn find_by_id(&self, kind: FormKind, id: Uuid) -> Result<Option<StoredForm>, StoreError>;

    async fn finalized_mobile_exists(&self, kind: FormKind, mobile: &str) -> Result<bool, StoreError>;

    /// Marks the user's open row as finally submitted. `None` when there is no open row.
    async fn finalize(&self, kind: FormKind, user_id: &str) -> Result<Option<StoredForm>, StoreError>;

    async fn insert_finalized(
        &self,
        kind: FormKind,
        user_id: &str,
        document: Map<String, Value>,
        step: u8,
    ) -> Result<StoredForm, StoreError>;

    async fn insert_payment(&self, record: &PaymentRecord) -> Result<(), StoreError>;

    async fn find_payment(&self, order_id: &str) -> Result<Option<PaymentRecord>, StoreError>;

    async fn insert_contact(&self, submission: &ContactSubmission) -> Result<(), StoreError>;

    /// Newest first.
    async fn list_contacts(&self) -> Result<Vec<ContactSubmission>, StoreError>;

    async fn find_receipts(&self, key: &ReceiptKey) -> Result<Vec<UploadReceipt>, StoreError>;

    async fn save_receipt(&self, key: &ReceiptKey, receipt: &UploadReceipt) -> Result<(), StoreError>;
}

/// Object storage for uploaded files. Returns the public URL of the stored object.
#[async_trait]
pub trait BlobStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, BlobError>;
}

/// Checkout provider's orders API.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn create_order(&self, amount_minor: i64, currency: &str, receipt: &str) -> Result<PaymentOrder, ProviderError>;

    async fn fetch_order(&self, order_id: &str) -> Result<PaymentOrder, ProviderError>;
}
