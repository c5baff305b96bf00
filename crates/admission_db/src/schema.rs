use rust_embed::RustEmbed;
use sqlx::{Executor, PgPool};
use std::str;
use tracing::{debug, info};

use crate::error::{Error, Result};

#[derive(RustEmbed)]
#[folder = "schema/"]
struct SchemaAssets;

const BUILD_ORDER: &str = "00_build_order.sql";

/// Reads the build order and applies all SQL files in a single transaction.
/// Every included file is idempotent, so this is safe to run on each start.
pub async fn apply_schema(pool: &PgPool) -> Result<()> {
    let script = assemble_script()?;

    let mut tx = pool.begin().await.map_err(|e| Error::Database(e.to_string()))?;
    tx.execute(script.as_str())
        .await
        .map_err(|e| Error::Schema(e.to_string()))?;
    tx.commit().await.map_err(|e| Error::Database(e.to_string()))?;

    info!("schema applied");
    Ok(())
}

/// Concatenates the manifest's `-- @include` targets in order.
pub fn assemble_script() -> Result<String> {
    let manifest = get_file_content(BUILD_ORDER)?;
    let mut full_script = String::new();

    for line in manifest.lines() {
        let trimmed = line.trim();

        if let Some(path) = parse_include_directive(trimmed) {
            debug!(file = path, "including schema file");
            full_script.push_str(&get_file_content(path)?);
            full_script.push('\n');
        } else if !trimmed.starts_with("--") {
            full_script.push_str(line);
            full_script.push('\n');
        }
    }

    Ok(full_script)
}

fn get_file_content(path: &str) -> Result<String> {
    let file = SchemaAssets::get(path)
        .ok_or_else(|| Error::Schema(format!("Missing schema file: {path}")))?;
    str::from_utf8(file.data.as_ref())
        .map(str::to_string)
        .map_err(|e| Error::Schema(format!("{path}: {e}")))
}

fn parse_include_directive(line: &str) -> Option<&str> {
    if line.starts_with("--") && line.contains("@include") {
        line.split_whitespace().last()
    } else {
        None
    }
}
