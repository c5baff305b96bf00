use anyhow::Result;
use clap::Args;
use sqlx::PgPool;

use admission_db::apply_schema;

const DROP_TABLES: &str = "DROP TABLE IF EXISTS upload_receipts, contact_submissions, payments, enrollments, applications CASCADE";

#[derive(Debug, Args)]
pub struct RebuildArgs {
    /// DANGER: drop every admission table before rebuilding
    #[arg(long)]
    pub reset: bool,
}

pub async fn execute(pool: PgPool, args: RebuildArgs) -> Result<()> {
    println!("🏗️  Rebuilding database schema...");

    if args.reset {
        println!("🔥 Reset requested. Dropping admission tables...");
        sqlx::query(DROP_TABLES).execute(&pool).await?;
    }

    apply_schema(&pool).await?;

    println!("✅ Database schema applied.");
    Ok(())
}
