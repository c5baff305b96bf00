use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use admission_core::models::{
    merge_fields, ApplicationFields, EnrollmentFields, FormFields, FormKind, StagedFile,
};
use admission_core::validation::ValidationEngine;
use admission_core::wizard::{StepGateway, WizardController, WizardState};
use admission_core::{application_validator, enrollment_validator};

use super::KindArg;
use crate::config::Config;
use crate::gateway::HttpGateway;

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub field: String,
    pub path: PathBuf,
}

impl Attachment {
    pub fn load(&self) -> Result<StagedFile> {
        let bytes = fs::read(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let filename = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.field.clone());
        Ok(StagedFile::new(&self.field, filename, mime_for_path(&self.path), bytes))
    }
}

/// `FIELD=PATH`
pub fn parse_attachment(raw: &str) -> Result<Attachment, String> {
    match raw.split_once('=') {
        Some((field, path)) if !field.trim().is_empty() && !path.trim().is_empty() => Ok(Attachment {
            field: field.trim().to_string(),
            path: PathBuf::from(path.trim()),
        }),
        _ => Err(format!("expected FIELD=PATH, got '{raw}'")),
    }
}

/// Unknown extensions fall through as octet-stream and the server refuses them.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Args)]
pub struct ResumeArgs {
    #[arg(short, long, value_enum)]
    pub kind: KindArg,

    #[arg(short, long)]
    pub user: String,

    /// JSON draft merged over the saved record before advancing
    #[arg(short, long)]
    pub draft: Option<PathBuf>,

    /// File for an upload field, as FIELD=PATH (repeatable)
    #[arg(long = "attach", value_parser = parse_attachment)]
    pub attachments: Vec<Attachment>,

    /// Finally submit once the last step is saved
    #[arg(long)]
    pub submit: bool,
}

pub async fn execute(config: &Config, args: ResumeArgs) -> Result<()> {
    let draft = match &args.draft {
        Some(path) => Some(
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => None,
    };

    let state = match FormKind::from(args.kind) {
        FormKind::Application => {
            let wizard = controller::<ApplicationFields>(config, &args.user, application_validator())?;
            drive(wizard, parse_draft(draft.as_deref())?, args.attachments, args.submit).await?
        }
        FormKind::Enrollment => {
            let wizard = controller::<EnrollmentFields>(config, &args.user, enrollment_validator())?;
            drive(wizard, parse_draft(draft.as_deref())?, args.attachments, args.submit).await?
        }
    };
    println!("📍 Wizard is now {state:?}");
    Ok(())
}

fn controller<F: FormFields>(
    config: &Config,
    user: &str,
    validator: ValidationEngine<F>,
) -> Result<WizardController<HttpGateway<F>>> {
    let gateway = HttpGateway::<F>::new(&config.api_url)?;
    Ok(WizardController::new(gateway, user, validator))
}

fn parse_draft<F: FormFields>(raw: Option<&str>) -> Result<Option<F>> {
    raw.map(|text| serde_json::from_str(text).context("Draft is not valid form JSON"))
        .transpose()
}

/// Resumes the wizard, applies the draft, then saves each remaining step in
/// order, staging the attachments that belong to it. Stops at the first
/// rejected step.
pub async fn drive<G: StepGateway>(
    mut wizard: WizardController<G>,
    draft: Option<G::Fields>,
    attachments: Vec<Attachment>,
    submit: bool,
) -> Result<WizardState> {
    let kind = <G::Fields as FormFields>::KIND;
    let state = wizard.resume().await?;
    println!("📂 Resumed {} at {state:?}", kind.as_str());
    if state == WizardState::Submitted {
        println!("🔒 Already submitted; nothing to do.");
        return Ok(state);
    }

    if let Some(draft) = draft {
        *wizard.draft_mut() = merge_fields(wizard.draft(), &draft)?;
    }

    let mut pending = attachments;
    while let WizardState::Editing(step) = wizard.state() {
        let (now, later): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|a| <G::Fields as FormFields>::file_fields(step).contains(&a.field.as_str()));
        for attachment in &now {
            wizard.stage_file(attachment.load()?);
        }
        pending = later;

        wizard
            .next()
            .await
            .with_context(|| format!("Step {step} was not saved"))?;
        println!("✅ Step {step} saved");
        if step == kind.last_data_step() {
            break;
        }
    }

    if submit {
        wizard.submit_final().await?;
        println!("🎉 Final submission accepted.");
    }
    Ok(wizard.state())
}
