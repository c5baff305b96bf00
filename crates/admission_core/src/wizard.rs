//! Client-side wizard: one draft per form, advanced step by step against a
//! remote step endpoint.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::models::{merge_fields, FormFields, FormRecord, StagedFile};
use crate::validation::{ensure_valid, ValidationEngine};
use crate::DomainError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// The server answered with an error envelope.
    #[error("{message} (status {status})")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

/// Transport for one wizard kind.
#[async_trait]
pub trait StepGateway: Send + Sync {
    type Fields: FormFields;

    async fn fetch(&self, user_id: &str) -> Result<Option<FormRecord<Self::Fields>>, GatewayError>;

    async fn submit_step(
        &self,
        user_id: &str,
        step: u8,
        fields: &Self::Fields,
        files: Vec<StagedFile>,
    ) -> Result<FormRecord<Self::Fields>, GatewayError>;

    async fn finalize(&self, user_id: &str) -> Result<FormRecord<Self::Fields>, GatewayError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    /// `resume` has not run yet.
    NotLoaded,
    Editing(u8),
    /// Terminal: the record is finally submitted.
    Submitted,
}

#[derive(Error, Debug)]
pub enum WizardError {
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("The wizard cannot {action} while {state:?}")]
    WrongState {
        action: &'static str,
        state: WizardState,
    },
}

pub struct WizardController<G: StepGateway> {
    gateway: G,
    user_id: String,
    validator: ValidationEngine<G::Fields>,
    state: WizardState,
    draft: G::Fields,
    staged: Vec<StagedFile>,
    record: Option<FormRecord<G::Fields>>,
}

impl<G: StepGateway> WizardController<G> {
    pub fn new(gateway: G, user_id: impl Into<String>, validator: ValidationEngine<G::Fields>) -> Self {
        Self {
            gateway,
            user_id: user_id.into(),
            validator,
            state: WizardState::NotLoaded,
            draft: G::Fields::default(),
            staged: Vec::new(),
            record: None,
        }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn draft(&self) -> &G::Fields {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut G::Fields {
        &mut self.draft
    }

    pub fn record(&self) -> Option<&FormRecord<G::Fields>> {
        self.record.as_ref()
    }

    /// Queues a file for the current step; sent with the next `next()`.
    pub fn stage_file(&mut self, file: StagedFile) {
        self.staged.push(file);
    }

    /// Loads the stored record and positions the wizard on its saved step.
    pub async fn resume(&mut self) -> Result<WizardState, WizardError> {
        let kind = <G::Fields as FormFields>::KIND;
        let record = self.gateway.fetch(&self.user_id).await?;

        self.state = match &record {
            Some(rec) if rec.is_final_submitted => WizardState::Submitted,
            Some(rec) => {
                let step = rec.current_step.clamp(1, kind.last_data_step());
                WizardState::Editing(step)
            }
            None => WizardState::Editing(1),
        };
        self.draft = record
            .as_ref()
            .map(|rec| rec.fields.clone())
            .unwrap_or_default();
        self.staged.clear();
        self.record = record;

        debug!(user_id = %self.user_id, kind = kind.as_str(), state = ?self.state, "wizard resumed");
        Ok(self.state)
    }

    /// Validates and saves the current step, then moves forward.
    /// On any failure the wizard stays where it was.
    pub async fn next(&mut self) -> Result<WizardState, WizardError> {
        let step = self.editing_step("advance")?;
        let kind = <G::Fields as FormFields>::KIND;

        let mut candidate = self.draft.clone();
        candidate.apply_derived(step, OffsetDateTime::now_utc().date());

        let attachments: Vec<String> = self.staged.iter().map(|f| f.field.clone()).collect();
        if let Err(err) = ensure_valid(self.validator.run_step(step, &candidate, &attachments)) {
            warn!(user_id = %self.user_id, step, "step rejected locally");
            return Err(err.into());
        }

        let record = self
            .gateway
            .submit_step(
                &self.user_id,
                step,
                &candidate.restrict_to_step(step),
                self.staged.clone(),
            )
            .await?;

        let merged = merge_fields(&candidate, &record.fields)
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        self.draft = merged;
        self.staged.clear();
        self.record = Some(record);
        if step < kind.last_data_step() {
            self.state = WizardState::Editing(step + 1);
        }
        Ok(self.state)
    }

    /// Local transition only; nothing is sent.
    pub fn back(&mut self) -> Result<WizardState, WizardError> {
        let step = self.editing_step("go back")?;
        self.state = WizardState::Editing(step.saturating_sub(1).max(1));
        Ok(self.state)
    }

    /// Finalizes from the last data step.
    pub async fn submit_final(&mut self) -> Result<WizardState, WizardError> {
        let kind = <G::Fields as FormFields>::KIND;
        let step = self.editing_step("submit")?;
        if step != kind.last_data_step() {
            return Err(WizardError::WrongState {
                action: "submit",
                state: self.state,
            });
        }
        ensure_valid(self.validator.run_all(&self.draft, &[]))?;

        let record = self.gateway.finalize(&self.user_id).await?;
        self.record = Some(record);
        self.state = WizardState::Submitted;
        Ok(self.state)
    }

    fn editing_step(&self, action: &'static str) -> Result<u8, WizardError> {
        match self.state {
            WizardState::Editing(step) => Ok(step),
            state => Err(WizardError::WrongState { action, state }),
        }
    }
}
