use anyhow::{bail, Context, Result};
use clap::Args;
use uuid::Uuid;

use admission_core::models::{ApplicationFields, EnrollmentFields, FormKind, StoredForm};
use admission_db::FormRepository;

use super::KindArg;

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[arg(short, long, value_enum)]
    pub kind: KindArg,

    /// Look the record up by owner
    #[arg(short, long, conflicts_with = "id")]
    pub user: Option<String>,

    /// Look the record up by primary key
    #[arg(long)]
    pub id: Option<Uuid>,
}

pub async fn execute(repo: FormRepository, args: ShowArgs) -> Result<()> {
    let kind = FormKind::from(args.kind);
    let stored = match (&args.user, args.id) {
        (Some(user), _) => repo.find_by_user(kind, user).await?,
        (None, Some(id)) => repo.find_by_id(kind, id).await?,
        (None, None) => bail!("pass --user or --id"),
    };

    let Some(stored) = stored else {
        println!("❌ No {} found.", kind.as_str());
        return Ok(());
    };
    println!("{}", render(stored)?);
    Ok(())
}

/// Pretty JSON of the record as the API would return it.
pub fn render(stored: StoredForm) -> Result<String> {
    let value = match stored.kind {
        FormKind::Application => serde_json::to_value(stored.into_record::<ApplicationFields>()?.redacted())?,
        FormKind::Enrollment => serde_json::to_value(stored.into_record::<EnrollmentFields>()?.redacted())?,
    };
    serde_json::to_string_pretty(&value).context("Failed to render record")
}
