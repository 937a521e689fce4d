//! Role assignment repository.

use sqlx::PgPool;

use warden_core::result::AppResult;
use warden_core::types::{OrgUnitId, RoleAssignmentId, RoleId, UserId};
use warden_entity::role::{AssignedRole, ScopeFilter};

use crate::error::db_error;

const ASSIGNMENT_COLUMNS: &str = "ur.id AS assignment_id, ur.user_id, ur.role_id, \
     r.name AS role_name, r.description AS role_description, ur.org_unit_id, ur.created_at";

/// Repository for the `user_roles` table.
#[derive(Debug, Clone)]
pub struct RoleAssignmentRepository {
    pool: PgPool,
}

impl RoleAssignmentRepository {
    /// Create a new role assignment repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Assignments held by a principal, restricted by `filter`.
    ///
    /// This is a raw query; the scope-fallback policy is applied by the
    /// caller.
    pub async fn find_for_user(
        &self,
        user_id: UserId,
        filter: ScopeFilter,
    ) -> AppResult<Vec<AssignedRole>> {
        let scope_clause = match filter {
            ScopeFilter::Any => "",
            ScopeFilter::Global => "AND ur.org_unit_id IS NULL",
            ScopeFilter::Unit(_) => "AND ur.org_unit_id = $2",
        };
        let sql = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM user_roles ur \
             JOIN roles r ON r.id = ur.role_id \
             WHERE ur.user_id = $1 {scope_clause} \
             ORDER BY r.name ASC, ur.created_at ASC"
        );

        let mut query = sqlx::query_as::<_, AssignedRole>(&sql).bind(user_id);
        if let ScopeFilter::Unit(unit) = filter {
            query = query.bind(unit);
        }

        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list role assignments", e))
    }

    /// Record that a principal holds a role at a scope.
    pub async fn create(
        &self,
        user_id: UserId,
        role_id: RoleId,
        org_unit_id: Option<OrgUnitId>,
    ) -> AppResult<AssignedRole> {
        let sql = format!(
            "WITH ur AS ( \
                 INSERT INTO user_roles (id, user_id, role_id, org_unit_id, created_at) \
                 VALUES ($1, $2, $3, $4, NOW()) RETURNING * \
             ) \
             SELECT {ASSIGNMENT_COLUMNS} FROM ur JOIN roles r ON r.id = ur.role_id"
        );

        sqlx::query_as::<_, AssignedRole>(&sql)
            .bind(RoleAssignmentId::new())
            .bind(user_id)
            .bind(role_id)
            .bind(org_unit_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to assign role", e))
    }

    /// Remove the exact `(principal, role, scope)` assignment.
    pub async fn delete(
        &self,
        user_id: UserId,
        role_id: RoleId,
        org_unit_id: Option<OrgUnitId>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM user_roles \
             WHERE user_id = $1 AND role_id = $2 AND org_unit_id IS NOT DISTINCT FROM $3",
        )
        .bind(user_id)
        .bind(role_id)
        .bind(org_unit_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to unassign role", e))?;
        Ok(result.rows_affected() > 0)
    }
}
