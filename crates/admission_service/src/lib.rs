pub mod adapters;
pub mod config;
pub mod contacts;
pub mod error;
pub mod forms;
pub mod payments;
pub mod ports;
pub mod uploads;

use std::sync::Arc;
use std::time::Duration;

use admission_core::models::{ApplicationFields, EnrollmentFields, UploadPolicy};
use admission_core::validation::ValidationEngine;
use admission_core::{application_validator, enrollment_validator};

pub use config::Config;
pub use error::{Result, ServiceError};
pub use forms::DirectEnrollment;
pub use ports::{BlobStore, DocumentStore, PaymentProvider};
pub use uploads::{FormPart, StepSubmission};

#[derive(Clone, Debug)]
pub struct ServiceSettings {
    pub upload_policy: UploadPolicy,
    pub upload_timeout: Duration,
    /// Shared secret for checkout signatures.
    pub payment_secret: String,
}

impl ServiceSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            upload_policy: UploadPolicy::with_max_bytes(config.max_upload_bytes),
            upload_timeout: config.upload_timeout,
            payment_secret: config.razorpay.secret.clone(),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            upload_policy: UploadPolicy::default(),
            upload_timeout: Duration::from_secs(30),
            payment_secret: String::new(),
        }
    }
}

/// Admission workflow over pluggable store, blob and payment backends.
pub struct AdmissionService {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    payments: Arc<dyn PaymentProvider>,
    settings: ServiceSettings,
    application_rules: ValidationEngine<ApplicationFields>,
    enrollment_rules: ValidationEngine<EnrollmentFields>,
}

impl AdmissionService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        payments: Arc<dyn PaymentProvider>,
        settings: ServiceSettings,
    ) -> Self {
        tracing::info!(
            store = store.backend_tag(),
            blobs = blobs.backend_tag(),
            payments = payments.backend_tag(),
            "admission service ready"
        );
        Self {
            store,
            blobs,
            payments,
            settings,
            application_rules: application_validator(),
            enrollment_rules: enrollment_validator(),
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub async fn health(&self) -> Result<()> {
        Ok(self.store.ping().await?)
    }
}
