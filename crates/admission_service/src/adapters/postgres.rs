use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use admission_core::models::{
    ContactSubmission, FormKind, PaymentRecord, ReceiptKey, StoredForm, UploadReceipt,
};
use admission_db::FormRepository;

use crate::ports::{DocumentStore, StoreError};

impl From<admission_db::Error> for StoreError {
    fn from(e: admission_db::Error) -> Self {
        StoreError(e.to_string())
    }
}

#[async_trait]
impl DocumentStore for FormRepository {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(FormRepository::ping(self).await?)
    }

    async fn upsert_step(
        &self,
        kind: FormKind,
        user_id: &str,
        patch: Map<String, Value>,
        step: u8,
    ) -> Result<Option<StoredForm>, StoreError> {
        Ok(FormRepository::upsert_step(self, kind, user_id, patch, step).await?)
    }

    async fn find_by_user(&self, kind: FormKind, user_id: &str) -> Result<Option<StoredForm>, StoreError> {
        Ok(FormRepository::find_by_user(self, kind, user_id).await?)
    }

    async fn find_by_id(&self, kind: FormKind, id: Uuid) -> Result<Option<StoredForm>, StoreError> {
        Ok(FormRepository::find_by_id(self, kind, id).await?)
    }

    async fn finalized_mobile_exists(&self, kind: FormKind, mobile: &str) -> Result<bool, StoreError> {
        Ok(FormRepository::finalized_mobile_exists(self, kind, mobile).await?)
    }

    async fn finalize(&self, kind: FormKind, user_id: &str) -> Result<Option<StoredForm>, StoreError> {
        Ok(FormRepository::finalize(self, kind, user_id).await?)
    }

    async fn insert_finalized(
        &self,
        kind: FormKind,
        user_id: &str,
        document: Map<String, Value>,
        step: u8,
    ) -> Result<StoredForm, StoreError> {
        Ok(FormRepository::insert_finalized(self, kind, user_id, document, step).await?)
    }

    async fn insert_payment(&self, record: &PaymentRecord) -> Result<(), StoreError> {
        Ok(FormRepository::insert_payment(self, record).await?)
    }

    async fn find_payment(&self, order_id: &str) -> Result<Option<PaymentRecord>, StoreError> {
        Ok(self.find_payment_by_order(order_id).await?)
    }

    async fn insert_contact(&self, submission: &ContactSubmission) -> Result<(), StoreError> {
        Ok(FormRepository::insert_contact(self, submission).await?)
    }

    async fn list_contacts(&self) -> Result<Vec<ContactSubmission>, StoreError> {
        Ok(FormRepository::list_contacts(self).await?)
    }

    async fn find_receipts(&self, key: &ReceiptKey) -> Result<Vec<UploadReceipt>, StoreError> {
        Ok(FormRepository::find_receipts(self, key).await?)
    }

    async fn save_receipt(&self, key: &ReceiptKey, receipt: &UploadReceipt) -> Result<(), StoreError> {
        Ok(FormRepository::save_receipt(self, key, receipt).await?)
    }
}
