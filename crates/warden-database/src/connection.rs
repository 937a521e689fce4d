//! PostgreSQL connection pool management.

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

use warden_core::config::DatabaseConfig;
use warden_core::error::{AppError, ErrorKind};

use crate::migration::{self, MigrationReport};

/// Shared handle to the permission database.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Open a pool using the configured limits.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            url = %mask_password(&config.url),
            max_connections = config.max_connections,
            "Opening permission database pool"
        );

        config.validate()?;
        let pool = pool_options(config)
            .connect_with(connect_options(config)?)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to connect to database: {e}"),
                    e,
                )
            })?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Borrow the underlying sqlx pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending migrations. Returns how many were applied.
    pub async fn migrate(&self) -> Result<usize, AppError> {
        migration::run_migrations(&self.pool).await
    }

    /// Applied and pending migrations, without changing the schema.
    pub async fn migration_status(&self) -> Result<MigrationReport, AppError> {
        migration::migration_report(&self.pool).await
    }
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
}

/// Parse the URL and apply per-session settings.
fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, AppError> {
    let options = PgConnectOptions::from_str(&config.url)
        .map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid database.url", e)
        })?
        .application_name(&config.application_name);

    Ok(match config.statement_timeout() {
        Some(timeout) => {
            options.options([("statement_timeout", format!("{}ms", timeout.as_millis()))])
        }
        None => options,
    })
}

/// Mask the password portion of a database URL for logging.
fn mask_password(url: &str) -> String {
    let Some(at_pos) = url.rfind('@') else {
        return url.to_string();
    };
    let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
    if at_pos < scheme_end {
        return url.to_string();
    }
    match url[scheme_end..at_pos].find(':') {
        Some(offset) => {
            let colon_pos = scheme_end + offset;
            format!("{}:****@{}", &url[..colon_pos], &url[at_pos + 1..])
        }
        None => url.to_string(),
    }
}
