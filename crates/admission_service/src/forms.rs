use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use admission_core::models::{
    merge_fields, to_patch, ApplicationFields, ApplicationRecord, EnrollmentFields,
    EnrollmentRecord, FormFields, FormKind, FormRecord, StoredForm,
};
use admission_core::validation::{ensure_valid, ValidationEngine};
use admission_core::DomainError;

use crate::error::{Result, ServiceError};
use crate::uploads::{assemble, FormPart, StepSubmission};
use crate::AdmissionService;

const MISSING_USER: &str = "User not found with this userId!! First login";

/// Response body of a one-shot enrollment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectEnrollment {
    pub message: String,
    pub enrollment_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

fn required_user(user_id: &str) -> Result<String> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ServiceError::validation(MISSING_USER));
    }
    Ok(user_id.to_string())
}

impl AdmissionService {
    pub async fn submit_application_step(
        &self,
        submission: StepSubmission<ApplicationFields>,
    ) -> Result<ApplicationRecord> {
        self.submit_step(&self.application_rules, submission).await
    }

    pub async fn submit_enrollment_step(
        &self,
        submission: StepSubmission<EnrollmentFields>,
    ) -> Result<EnrollmentRecord> {
        self.submit_step(&self.enrollment_rules, submission).await
    }

    pub async fn finalize_application(&self, user_id: &str) -> Result<ApplicationRecord> {
        self.finalize(&self.application_rules, user_id).await
    }

    pub async fn finalize_enrollment(&self, user_id: &str) -> Result<EnrollmentRecord> {
        self.finalize(&self.enrollment_rules, user_id).await
    }

    pub async fn application_for_user(&self, user_id: &str) -> Result<Option<ApplicationRecord>> {
        self.find_for_user(user_id).await
    }

    pub async fn enrollment_for_user(&self, user_id: &str) -> Result<Option<EnrollmentRecord>> {
        self.find_for_user(user_id).await
    }

    pub async fn application_by_id(&self, id: Uuid) -> Result<ApplicationRecord> {
        self.find_by_id(id).await
    }

    pub async fn enrollment_by_id(&self, id: Uuid) -> Result<EnrollmentRecord> {
        self.find_by_id(id).await
    }

    /// Rejects writes to a finally submitted record. On step 1 the mobile
    /// number is also checked against every finalized record of the same kind.
    pub(crate) async fn ensure_open(
        &self,
        kind: FormKind,
        existing: Option<&StoredForm>,
        mobile: Option<&str>,
    ) -> Result<()> {
        if let Some(form) = existing.filter(|f| f.is_final_submitted) {
            warn!(kind = kind.as_str(), user_id = %form.user_id, "write to finalized record refused");
            return Err(DomainError::AlreadySubmitted.into());
        }
        if let Some(mobile) = mobile {
            if self.store.finalized_mobile_exists(kind, mobile).await? {
                warn!(kind = kind.as_str(), "mobile number already used by a finalized record");
                return Err(DomainError::AlreadySubmitted.into());
            }
        }
        Ok(())
    }

    async fn submit_step<F: FormFields>(
        &self,
        rules: &ValidationEngine<F>,
        submission: StepSubmission<F>,
    ) -> Result<FormRecord<F>> {
        let kind = F::KIND;
        let StepSubmission {
            user_id,
            step,
            fields,
            files,
            idempotency_key,
        } = submission;
        let user_id = required_user(&user_id)?;
        if !kind.data_steps().contains(&step) {
            return Err(DomainError::NotFound(format!("{} step {step} does not exist", kind.label())).into());
        }

        let existing = self.store.find_by_user(kind, &user_id).await?;
        let mobile = if step == 1 {
            fields.mobile().map(str::trim).filter(|m| !m.is_empty())
        } else {
            None
        };
        self.ensure_open(kind, existing.as_ref(), mobile).await?;

        let stored: F = match existing {
            Some(form) => form.into_record::<F>()?.fields,
            None => F::default(),
        };
        let mut patch = fields.restrict_to_step(step);

        // Files and fields are both judged before anything is uploaded or written.
        let mut problems = self.settings.upload_policy.check_all(&files);
        problems.extend(self.settings.upload_policy.check_links(&patch));
        let attachments: Vec<String> = files.iter().map(|f| f.field.clone()).collect();
        problems.extend(rules.run_step(step, &merge_fields(&stored, &patch)?, &attachments));
        if let Err(err) = ensure_valid(problems) {
            warn!(kind = kind.as_str(), %user_id, step, error = %err, "step rejected");
            return Err(err.into());
        }

        let uploaded = self
            .store_files(kind, &user_id, step, files, idempotency_key.as_deref())
            .await?;
        for (field, file) in uploaded {
            patch.attach_file(&field, file)?;
        }
        patch.seal(&user_id);

        let mut merged = merge_fields(&stored, &patch)?;
        merged.apply_derived(step, OffsetDateTime::now_utc().date());
        let document = to_patch(&merged.restrict_to_step(step))?;

        let saved = self
            .store
            .upsert_step(kind, &user_id, document, step)
            .await?
            .ok_or(DomainError::AlreadySubmitted)?;

        info!(kind = kind.as_str(), %user_id, step, current_step = saved.current_step, "step saved");
        Ok(saved.into_record::<F>()?.redacted())
    }

    async fn finalize<F: FormFields>(&self, rules: &ValidationEngine<F>, user_id: &str) -> Result<FormRecord<F>> {
        let kind = F::KIND;
        let user_id = required_user(user_id)?;

        let existing = self
            .store
            .find_by_user(kind, &user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("{} not found", kind.label())))?;
        self.ensure_open(kind, Some(&existing), None).await?;

        // Every step is re-checked so a record cannot skip straight to the last one.
        let record = existing.into_record::<F>()?;
        if let Err(err) = ensure_valid(rules.run_all(&record.fields, &[])) {
            warn!(kind = kind.as_str(), %user_id, error = %err, "finalization rejected");
            return Err(err.into());
        }

        let done = self
            .store
            .finalize(kind, &user_id)
            .await?
            .ok_or(DomainError::AlreadySubmitted)?;

        info!(kind = kind.as_str(), %user_id, "record finally submitted");
        Ok(done.into_record::<F>()?.redacted())
    }

    async fn find_for_user<F: FormFields>(&self, user_id: &str) -> Result<Option<FormRecord<F>>> {
        let user_id = required_user(user_id)?;
        match self.store.find_by_user(F::KIND, &user_id).await? {
            Some(form) => Ok(Some(form.into_record::<F>()?.redacted())),
            None => Ok(None),
        }
    }

    async fn find_by_id<F: FormFields>(&self, id: Uuid) -> Result<FormRecord<F>> {
        let form = self
            .store
            .find_by_id(F::KIND, id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("{} not found", F::KIND.label())))?;
        Ok(form.into_record::<F>()?.redacted())
    }

    /// Validates every enrollment step at once and stores an already
    /// finalized record under a fresh user id.
    pub async fn enroll_direct(&self, parts: Vec<FormPart>) -> Result<DirectEnrollment> {
        let kind = FormKind::Enrollment;
        let file_fields: Vec<&str> = EnrollmentFields::all_file_fields().collect();
        let assembled = assemble::<EnrollmentFields>(parts, &file_fields)?;
        let mut fields = assembled.fields;

        let mut problems = self.settings.upload_policy.check_all(&assembled.files);
        let attachments: Vec<String> = assembled.files.iter().map(|f| f.field.clone()).collect();
        problems.extend(self.enrollment_rules.run_all(&fields, &attachments));
        if let Err(err) = ensure_valid(problems) {
            warn!(error = %err, "direct enrollment rejected");
            return Err(err.into());
        }
        self.ensure_open(kind, None, fields.mobile().map(str::trim)).await?;

        let user_id = format!("direct-{}", Uuid::new_v4());
        let step = kind.last_data_step();
        for (field, file) in self.store_files(kind, &user_id, step, assembled.files, None).await? {
            fields.attach_file(&field, file)?;
        }

        let saved = self
            .store
            .insert_finalized(kind, &user_id, to_patch(&fields)?, step)
            .await?;

        info!(%user_id, enrollment_id = %saved.id, "direct enrollment stored");
        Ok(DirectEnrollment {
            message: "Enrollment submitted successfully".to_string(),
            enrollment_id: saved.id,
            created_at: saved.created_at,
        })
    }
}
