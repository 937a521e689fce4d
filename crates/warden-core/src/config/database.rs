//! Permission store connection settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// How the engine reaches the PostgreSQL permission store.
///
/// Every authorization check reads the store directly, so the pool and
/// the per-statement timeout bound the latency of a single check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Upper bound on pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connections kept open while idle.
    #[serde(default)]
    pub min_connections: u32,
    /// How long a caller waits for a free connection, in seconds.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
    /// Idle connections are closed after this many seconds.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    /// Server-side `statement_timeout` in milliseconds; `0` leaves the
    /// server default in place.
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_ms: u64,
    /// Reported as `application_name` in `pg_stat_activity`.
    #[serde(default = "default_application_name")]
    pub application_name: String,
}

impl DatabaseConfig {
    /// Reject settings the pool cannot honor.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.url.trim().is_empty() {
            return Err(AppError::configuration("database.url must be set"));
        }
        if self.max_connections == 0 {
            return Err(AppError::configuration(
                "database.max_connections must be at least 1",
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(AppError::configuration(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }

    /// Pool acquire timeout.
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }

    /// Idle timeout.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }

    /// Statement timeout, if one is configured.
    pub fn statement_timeout(&self) -> Option<Duration> {
        (self.statement_timeout_ms > 0).then(|| Duration::from_millis(self.statement_timeout_ms))
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_idle_timeout() -> u64 {
    300
}

fn default_statement_timeout() -> u64 {
    5_000
}

fn default_application_name() -> String {
    "warden".to_string()
}
