pub mod error;
pub mod models;
pub mod repository;
pub mod schema;

pub use error::{Error, Result};
pub use repository::FormRepository;
pub use schema::apply_schema;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Opens the shared pool used by the API server and the CLI.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| Error::Database(e.to_string()))
}
