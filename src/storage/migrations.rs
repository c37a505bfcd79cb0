//! Schema migrations.
//!
//! The `migrations/` directory is embedded at compile time so the binary can
//! bring any database file up to date without the source tree present.

use sqlx::migrate::Migrator;
use sqlx::{Pool, Sqlite};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applies all pending migrations to the database.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), anyhow::Error> {
    MIGRATOR.run(pool).await?;
    log::debug!("Applied {} schema migration(s)", MIGRATOR.iter().count());
    Ok(())
}
