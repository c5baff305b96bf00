use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use admission_core::models::{ContactSubmission, NewContact};

use crate::error::Result;
use crate::AdmissionService;

impl AdmissionService {
    pub async fn submit_contact(&self, contact: NewContact) -> Result<ContactSubmission> {
        contact.validate()?;
        let submission = ContactSubmission {
            id: Uuid::new_v4(),
            contact,
            created_at: OffsetDateTime::now_utc(),
        };
        self.store.insert_contact(&submission).await?;
        info!(id = %submission.id, subject = %submission.contact.subject, "contact message stored");
        Ok(submission)
    }

    /// Newest first.
    pub async fn list_contacts(&self) -> Result<Vec<ContactSubmission>> {
        Ok(self.store.list_contacts().await?)
    }
}
