/// Embedded schema migrations
///
/// Migrations live in the workspace `migrations/` directory as reversible
/// `{timestamp}_{name}.up.sql` / `.down.sql` pairs and are compiled into the
/// binary, so a deployed server needs no files next to it.

use sqlx::{
    migrate::{MigrateError, Migrator},
    postgres::PgPool,
};
use tracing::{info, warn};

/// Migrations compiled from `../migrations` (relative to this crate's manifest)
pub static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Applies all pending migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    info!(
        available = MIGRATOR.iter().count(),
        "Running database migrations"
    );

    MIGRATOR.run(pool).await.map_err(|e| {
        warn!(error = %e, "Migration failed");
        e
    })?;

    info!("Database schema is up to date");
    Ok(())
}
