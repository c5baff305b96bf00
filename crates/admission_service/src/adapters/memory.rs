use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use admission_core::models::{
    ContactSubmission, FormKind, PaymentOrder, PaymentRecord, ReceiptKey, StoredForm,
    UploadReceipt,
};

use crate::ports::{
    BlobError, BlobStore, DocumentStore, PaymentProvider, ProviderError, StoreError,
};

/// Process-local document store with the same merge semantics as Postgres.
#[derive(Default)]
pub struct MemoryStore {
    pub forms: Mutex<HashMap<(FormKind, String), StoredForm>>,
    pub payments: Mutex<Vec<PaymentRecord>>,
    pub contacts: Mutex<Vec<ContactSubmission>>,
    pub receipts: Mutex<HashMap<ReceiptKey, Vec<UploadReceipt>>>,
    /// Number of mutating calls, for asserting that rejected requests wrote nothing.
    pub writes: AtomicU64,
}

impl MemoryStore {
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn upsert_step(
        &self,
        kind: FormKind,
        user_id: &str,
        patch: Map<String, Value>,
        step: u8,
    ) -> Result<Option<StoredForm>, StoreError> {
        self.record_write();
        let now = OffsetDateTime::now_utc();
        let mut forms = self.forms.lock().await;
        let entry = forms
            .entry((kind, user_id.to_string()))
            .or_insert_with(|| StoredForm {
                id: Uuid::new_v4(),
                kind,
                user_id: user_id.to_string(),
                document: Map::new(),
                current_step: 0,
                is_final_submitted: false,
                final_submitted_at: None,
                created_at: now,
                updated_at: now,
            });
        if entry.is_final_submitted {
            return Ok(None);
        }
        entry.document.extend(patch);
        entry.current_step = entry.current_step.max(step);
        entry.updated_at = now;
        Ok(Some(entry.clone()))
    }

    async fn find_by_user(&self, kind: FormKind, user_id: &str) -> Result<Option<StoredForm>, StoreError> {
        Ok(self.forms.lock().await.get(&(kind, user_id.to_string())).cloned())
    }

    async fn find_by_id(&self, kind: FormKind, id: Uuid) -> Result<Option<StoredForm>, StoreError> {
        Ok(self
            .forms
            .lock()
            .await
            .values()
            .find(|f| f.kind == kind && f.id == id)
            .cloned())
    }

    async fn finalized_mobile_exists(&self, kind: FormKind, mobile: &str) -> Result<bool, StoreError> {
        let field = kind.mobile_field();
        Ok(self.forms.lock().await.values().any(|f| {
            f.kind == kind
                && f.is_final_submitted
                && f.document.get(field).and_then(Value::as_str) == Some(mobile)
        }))
    }

    async fn finalize(&self, kind: FormKind, user_id: &str) -> Result<Option<StoredForm>, StoreError> {
        self.record_write();
        let now = OffsetDateTime::now_utc();
        let mut forms = self.forms.lock().await;
        match forms.get_mut(&(kind, user_id.to_string())) {
            Some(form) if !form.is_final_submitted => {
                form.is_final_submitted = true;
                form.final_submitted_at = Some(now);
                form.updated_at = now;
                Ok(Some(form.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn insert_finalized(
        &self,
        kind: FormKind,
        user_id: &str,
        document: Map<String, Value>,
        step: u8,
    ) -> Result<StoredForm, StoreError> {
        self.record_write();
        let now = OffsetDateTime::now_utc();
        let mut forms = self.forms.lock().await;
        let key = (kind, user_id.to_string());
        if forms.contains_key(&key) {
            return Err(StoreError(format!("duplicate user_id {user_id}")));
        }
        let form = StoredForm {
            id: Uuid::new_v4(),
            kind,
            user_id: user_id.to_string(),
            document,
            current_step: step,
            is_final_submitted: true,
            final_submitted_at: Some(now),
            created_at: now,
            updated_at: now,
        };
        forms.insert(key, form.clone());
        Ok(form)
    }

    async fn insert_payment(&self, record: &PaymentRecord) -> Result<(), StoreError> {
        self.record_write();
        self.payments.lock().await.push(record.clone());
        Ok(())
    }

    async fn find_payment(&self, order_id: &str) -> Result<Option<PaymentRecord>, StoreError> {
        Ok(self
            .payments
            .lock()
            .await
            .iter()
            .rev()
            .find(|p| p.razorpay_order_id == order_id)
            .cloned())
    }

    async fn insert_contact(&self, submission: &ContactSubmission) -> Result<(), StoreError> {
        self.record_write();
        self.contacts.lock().await.push(submission.clone());
        Ok(())
    }

    async fn list_contacts(&self) -> Result<Vec<ContactSubmission>, StoreError> {
        let mut all = self.contacts.lock().await.clone();
        all.reverse();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn find_receipts(&self, key: &ReceiptKey) -> Result<Vec<UploadReceipt>, StoreError> {
        Ok(self.receipts.lock().await.get(key).cloned().unwrap_or_default())
    }

    async fn save_receipt(&self, key: &ReceiptKey, receipt: &UploadReceipt) -> Result<(), StoreError> {
        let mut receipts = self.receipts.lock().await;
        let list = receipts.entry(key.clone()).or_default();
        match list
            .iter_mut()
            .find(|r| r.field == receipt.field && r.position == receipt.position)
        {
            Some(existing) if existing.digest != receipt.digest => *existing = receipt.clone(),
            Some(_) => {}
            None => list.push(receipt.clone()),
        }
        Ok(())
    }
}

/// Keeps uploaded objects in memory; URLs use the `memory://` scheme.
#[derive(Default)]
pub struct MemoryBlobStore {
    pub objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
    pub puts: AtomicU64,
    pub fail: AtomicBool,
    pub delay: Duration,
}

impl MemoryBlobStore {
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, BlobError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(BlobError("blob store unavailable".to_string()));
        }
        self.objects
            .lock()
            .await
            .insert(key.to_string(), (content_type.to_string(), bytes));
        Ok(format!("memory://{key}"))
    }
}

/// Scripted orders API.
#[derive(Default)]
pub struct FakePaymentProvider {
    pub orders: Mutex<HashMap<String, PaymentOrder>>,
    pub next_id: AtomicU64,
    pub fail_fetch: AtomicBool,
}

impl FakePaymentProvider {
    pub async fn with_order(self, id: &str, amount: i64) -> Self {
        self.orders.lock().await.insert(
            id.to_string(),
            PaymentOrder {
                id: id.to_string(),
                entity: "order".into(),
                amount,
                amount_paid: 0,
                amount_due: amount,
                currency: "INR".into(),
                receipt: None,
                status: "created".into(),
                created_at: OffsetDateTime::now_utc().unix_timestamp(),
            },
        );
        self
    }
}

#[async_trait]
impl PaymentProvider for FakePaymentProvider {
    fn backend_tag(&self) -> &'static str {
        "fake"
    }

    async fn create_order(&self, amount_minor: i64, currency: &str, receipt: &str) -> Result<PaymentOrder, ProviderError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let order = PaymentOrder {
            id: format!("order_fake{n}"),
            entity: "order".into(),
            amount: amount_minor,
            amount_paid: 0,
            amount_due: amount_minor,
            currency: currency.to_string(),
            receipt: Some(receipt.to_string()),
            status: "created".into(),
            created_at: OffsetDateTime::now_utc().unix_timestamp(),
        };
        self.orders.lock().await.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &str) -> Result<PaymentOrder, ProviderError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ProviderError("provider unavailable".to_string()));
        }
        self.orders
            .lock()
            .await
            .get(order_id)
            .cloned()
            .ok_or_else(|| ProviderError(format!("order {order_id} not found")))
    }
}
