//! Audit log repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use warden_core::result::AppResult;
use warden_entity::audit::AuditLogEntry;

use crate::error::db_error;

/// Repository for audit log entries.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    /// Create a new audit log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append an entry.
    pub async fn create(&self, entry: &AuditLogEntry) -> AppResult<AuditLogEntry> {
        sqlx::query_as::<_, AuditLogEntry>(
            "INSERT INTO audit_log \
             (id, actor_id, action, target_type, target_id, details, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(entry.id)
        .bind(entry.actor_id)
        .bind(&entry.action)
        .bind(&entry.target_type)
        .bind(entry.target_id)
        .bind(&entry.details)
        .bind(entry.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create audit entry", e))
    }

    /// Most recent entries about one target, newest first.
    pub async fn list_for_target(
        &self,
        target_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<AuditLogEntry>> {
        sqlx::query_as::<_, AuditLogEntry>(
            "SELECT * FROM audit_log WHERE target_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(target_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list audit entries", e))
    }
}
