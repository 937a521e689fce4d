//! Action catalog repository.

use sqlx::PgPool;

use warden_core::result::AppResult;
use warden_core::types::ActionId;
use warden_entity::action::{Action, ActionKey};

use crate::error::db_error;

/// Repository for the `actions` table.
#[derive(Debug, Clone)]
pub struct ActionRepository {
    pool: PgPool,
}

impl ActionRepository {
    /// Create a new action repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an action by ID, active or not.
    pub async fn find_by_id(&self, id: ActionId) -> AppResult<Option<Action>> {
        sqlx::query_as::<_, Action>("SELECT * FROM actions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find action", e))
    }

    /// Find an action by its normalized identity, active or not.
    pub async fn find_by_key(&self, key: &ActionKey) -> AppResult<Option<Action>> {
        sqlx::query_as::<_, Action>(
            "SELECT * FROM actions WHERE resource = $1 AND action_code = $2",
        )
        .bind(key.resource())
        .bind(key.action_code())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find action", e))
    }

    /// List the catalog ordered by resource then action code.
    pub async fn list(&self, include_inactive: bool) -> AppResult<Vec<Action>> {
        sqlx::query_as::<_, Action>(
            "SELECT * FROM actions WHERE ($1 OR is_active) ORDER BY resource ASC, action_code ASC",
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list actions", e))
    }

    /// List the active actions of one resource.
    pub async fn list_active_by_resource(&self, resource: &str) -> AppResult<Vec<Action>> {
        sqlx::query_as::<_, Action>(
            "SELECT * FROM actions WHERE resource = $1 AND is_active ORDER BY action_code ASC",
        )
        .bind(resource)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list actions for resource", e))
    }

    /// Insert a new action row.
    pub async fn create(&self, action: &Action) -> AppResult<Action> {
        sqlx::query_as::<_, Action>(
            "INSERT INTO actions \
             (id, resource, action_code, action_name, description, is_active, \
              created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(action.id)
        .bind(&action.resource)
        .bind(&action.action_code)
        .bind(&action.action_name)
        .bind(&action.description)
        .bind(action.is_active)
        .bind(action.created_at)
        .bind(action.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(&format!("Failed to create action {}", action.identity()), e))
    }

    /// Activate or deactivate an action. Returns the updated row.
    pub async fn set_active(&self, id: ActionId, is_active: bool) -> AppResult<Option<Action>> {
        sqlx::query_as::<_, Action>(
            "UPDATE actions SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update action", e))
    }
}
