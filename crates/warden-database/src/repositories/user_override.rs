//! Per-principal override repository.

use sqlx::PgPool;

use warden_core::result::AppResult;
use warden_core::types::{ActionId, OverrideId, UserId};
use warden_entity::user_override::{UpsertOverride, UserActionOverride};

use crate::error::db_error;

/// Repository for the `user_action_overrides` table.
#[derive(Debug, Clone)]
pub struct OverrideRepository {
    pool: PgPool,
}

impl OverrideRepository {
    /// Create a new override repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The override for `(principal, action)`, if any.
    pub async fn find(
        &self,
        user_id: UserId,
        action_id: ActionId,
    ) -> AppResult<Option<UserActionOverride>> {
        sqlx::query_as::<_, UserActionOverride>(
            "SELECT * FROM user_action_overrides WHERE user_id = $1 AND action_id = $2",
        )
        .bind(user_id)
        .bind(action_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find override", e))
    }

    /// All overrides of a principal.
    pub async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<UserActionOverride>> {
        sqlx::query_as::<_, UserActionOverride>(
            "SELECT * FROM user_action_overrides WHERE user_id = $1 ORDER BY granted_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list overrides", e))
    }

    /// Insert or update the single row for `(principal, action)`.
    ///
    /// The row id survives updates.
    pub async fn upsert(&self, data: &UpsertOverride) -> AppResult<UserActionOverride> {
        sqlx::query_as::<_, UserActionOverride>(
            "INSERT INTO user_action_overrides \
             (id, user_id, action_id, is_granted, note, granted_by, granted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
             ON CONFLICT (user_id, action_id) DO UPDATE SET \
                 is_granted = EXCLUDED.is_granted, \
                 note = EXCLUDED.note, \
                 granted_by = EXCLUDED.granted_by, \
                 granted_at = EXCLUDED.granted_at \
             RETURNING *",
        )
        .bind(OverrideId::new())
        .bind(data.user_id)
        .bind(data.action_id)
        .bind(data.is_granted)
        .bind(&data.note)
        .bind(data.granted_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to upsert override", e))
    }

    /// Insert a new row. A second row for the same pair is a conflict.
    pub async fn insert(&self, data: &UpsertOverride) -> AppResult<UserActionOverride> {
        sqlx::query_as::<_, UserActionOverride>(
            "INSERT INTO user_action_overrides \
             (id, user_id, action_id, is_granted, note, granted_by, granted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) RETURNING *",
        )
        .bind(OverrideId::new())
        .bind(data.user_id)
        .bind(data.action_id)
        .bind(data.is_granted)
        .bind(&data.note)
        .bind(data.granted_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create override", e))
    }

    /// Delete the override for `(principal, action)`. Returns whether one existed.
    pub async fn delete(&self, user_id: UserId, action_id: ActionId) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM user_action_overrides WHERE user_id = $1 AND action_id = $2",
        )
        .bind(user_id)
        .bind(action_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to delete override", e))?;
        Ok(result.rows_affected() > 0)
    }
}
