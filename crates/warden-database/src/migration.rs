//! Schema migrations and their applied/pending status.

use std::collections::HashSet;

use serde::Serialize;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use warden_core::error::AppError;

use crate::error::db_error;

/// Migrations embedded from the workspace `migrations/` directory.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// One embedded migration and whether the database has it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationState {
    /// Timestamp version from the file name.
    pub version: i64,
    /// Description from the file name.
    pub description: String,
    /// Recorded as successfully applied.
    pub applied: bool,
}

/// Status of every embedded migration, in version order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    /// Per-migration state.
    pub migrations: Vec<MigrationState>,
}

impl MigrationReport {
    /// Pair embedded migrations with the versions the database recorded.
    pub fn new<'a>(
        embedded: impl IntoIterator<Item = (i64, &'a str)>,
        applied: &HashSet<i64>,
    ) -> Self {
        let mut migrations: Vec<MigrationState> = embedded
            .into_iter()
            .map(|(version, description)| MigrationState {
                version,
                description: description.to_string(),
                applied: applied.contains(&version),
            })
            .collect();
        migrations.sort_by_key(|m| m.version);
        Self { migrations }
    }

    /// Migrations not yet applied.
    pub fn pending(&self) -> impl Iterator<Item = &MigrationState> {
        self.migrations.iter().filter(|m| !m.applied)
    }

    /// Whether the schema is current.
    pub fn is_current(&self) -> bool {
        self.pending().next().is_none()
    }
}

/// Compare the embedded migrations with the database without changing it.
pub async fn migration_report(pool: &PgPool) -> Result<MigrationReport, AppError> {
    let applied = applied_versions(pool).await?;
    let embedded = MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| (m.version, m.description.as_ref()));
    Ok(MigrationReport::new(embedded, &applied))
}

/// Apply pending migrations and return how many were applied.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, AppError> {
    let before = migration_report(pool).await?;
    for pending in before.pending() {
        info!(
            version = pending.version,
            description = %pending.description,
            "Applying migration"
        );
    }

    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to run migrations: {e}")))?;

    let applied = before.pending().count();
    info!(applied, "Permission schema is current");
    Ok(applied)
}

/// Versions recorded by sqlx, or none when the bookkeeping table is absent.
async fn applied_versions(pool: &PgPool) -> Result<HashSet<i64>, AppError> {
    let table: Option<String> =
        sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations')::text")
            .fetch_one(pool)
            .await
            .map_err(|e| db_error("Failed to inspect migration table", e))?;
    if table.is_none() {
        return Ok(HashSet::new());
    }

    let versions: Vec<i64> =
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success")
            .fetch_all(pool)
            .await
            .map_err(|e| db_error("Failed to list applied migrations", e))?;
    Ok(versions.into_iter().collect())
}
