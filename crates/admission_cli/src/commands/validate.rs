use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use admission_core::models::{ApplicationFields, EnrollmentFields, FormFields, FormKind};
use admission_core::validation::{ValidationEngine, ValidationError};
use admission_core::{application_validator, enrollment_validator};

use super::KindArg;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[arg(short, long, value_enum)]
    pub kind: KindArg,

    /// JSON draft holding the form fields
    #[arg(short, long)]
    pub file: PathBuf,

    /// Check a single step instead of every step
    #[arg(short, long)]
    pub step: Option<u8>,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    println!("🔍 Validating: {:?}", args.file);
    let raw = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let errors = match FormKind::from(args.kind) {
        FormKind::Application => check::<ApplicationFields>(&raw, &application_validator(), args.step)?,
        FormKind::Enrollment => check::<EnrollmentFields>(&raw, &enrollment_validator(), args.step)?,
    };

    if errors.is_empty() {
        println!("🎉 VALIDATION PASSED!");
        return Ok(());
    }

    println!("⚠️  VALIDATION FAILED: Found {} errors.", errors.len());
    println!("{:-<50}", "-");
    for err in errors {
        println!("🛑 [{}] {}", err.code, err.message);
        if let Some(field) = err.field {
            println!("   Field: {}", field);
        }
    }
    Ok(())
}

/// Parses a draft and runs either one step or all steps against it.
pub fn check<F: FormFields>(
    raw: &str,
    engine: &ValidationEngine<F>,
    step: Option<u8>,
) -> Result<Vec<ValidationError>> {
    let fields: F = serde_json::from_str(raw).context("Draft is not valid form JSON")?;
    Ok(match step {
        Some(step) => engine.run_step(step, &fields, &[]),
        None => engine.run_all(&fields, &[]),
    })
}
