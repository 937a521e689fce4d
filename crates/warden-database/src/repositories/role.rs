//! Role and role grant repository.

use sqlx::PgPool;

use warden_core::result::AppResult;
use warden_core::types::{ActionId, RoleId};
use warden_entity::action::Action;
use warden_entity::role::{Role, RoleGrant};

use crate::error::db_error;

/// Repository for the `roles` and `role_actions` tables.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    /// Create a new role repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a role by ID.
    pub async fn find_by_id(&self, id: RoleId) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find role", e))
    }

    /// Find a role by name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find role", e))
    }

    /// List all roles ordered by name.
    pub async fn list(&self) -> AppResult<Vec<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list roles", e))
    }

    /// Insert a role.
    pub async fn create(&self, role: &Role) -> AppResult<Role> {
        sqlx::query_as::<_, Role>(
            "INSERT INTO roles (id, name, description, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(&format!("Failed to create role '{}'", role.name), e))
    }

    /// Change a role's description, the only mutable role attribute.
    pub async fn update_description(
        &self,
        id: RoleId,
        description: Option<&str>,
    ) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, Role>("UPDATE roles SET description = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(description)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to update role", e))
    }

    /// Whether the role has an in-effect grant row for the action.
    pub async fn has_grant(&self, role_id: RoleId, action_id: ActionId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM role_actions \
             WHERE role_id = $1 AND action_id = $2 AND is_granted)",
        )
        .bind(role_id)
        .bind(action_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to check role grant", e))
    }

    /// The grant row for `(role, action)`, in effect or not.
    pub async fn find_grant(
        &self,
        role_id: RoleId,
        action_id: ActionId,
    ) -> AppResult<Option<RoleGrant>> {
        sqlx::query_as::<_, RoleGrant>(
            "SELECT * FROM role_actions WHERE role_id = $1 AND action_id = $2",
        )
        .bind(role_id)
        .bind(action_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find role grant", e))
    }

    /// Actions the role confers. Rows with `is_granted = false` are skipped.
    pub async fn list_granted_actions(&self, role_id: RoleId) -> AppResult<Vec<Action>> {
        sqlx::query_as::<_, Action>(
            "SELECT a.* FROM actions a \
             JOIN role_actions ra ON ra.action_id = a.id \
             WHERE ra.role_id = $1 AND ra.is_granted \
             ORDER BY a.resource ASC, a.action_code ASC",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list role actions", e))
    }

    /// Create or replace the grant row for `(role, action)`.
    pub async fn upsert_grant(
        &self,
        role_id: RoleId,
        action_id: ActionId,
        is_granted: bool,
    ) -> AppResult<RoleGrant> {
        sqlx::query_as::<_, RoleGrant>(
            "INSERT INTO role_actions (role_id, action_id, is_granted, created_at) \
             VALUES ($1, $2, $3, NOW()) \
             ON CONFLICT (role_id, action_id) DO UPDATE SET is_granted = EXCLUDED.is_granted \
             RETURNING *",
        )
        .bind(role_id)
        .bind(action_id)
        .bind(is_granted)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to write role grant", e))
    }

    /// Remove the grant row for `(role, action)`. Returns whether a row existed.
    pub async fn delete_grant(&self, role_id: RoleId, action_id: ActionId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM role_actions WHERE role_id = $1 AND action_id = $2")
            .bind(role_id)
            .bind(action_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete role grant", e))?;
        Ok(result.rows_affected() > 0)
    }
}
