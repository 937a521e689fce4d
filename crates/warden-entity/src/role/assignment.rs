//! Role assignment models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use warden_core::types::{OrgUnitId, RoleAssignmentId, RoleId, UserId};

/// A role held by a principal, joined with the role's name.
///
/// A principal may hold the same role at several scopes; `org_unit_id =
/// None` is a global assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AssignedRole {
    /// Assignment row identifier.
    pub assignment_id: RoleAssignmentId,
    /// The principal holding the role.
    pub user_id: UserId,
    /// The role held.
    pub role_id: RoleId,
    /// Role name.
    pub role_name: String,
    /// Role description.
    pub role_description: Option<String>,
    /// Organizational unit the assignment is limited to (`None` = global).
    pub org_unit_id: Option<OrgUnitId>,
    /// When the assignment was made.
    pub created_at: DateTime<Utc>,
}

impl AssignedRole {
    /// Whether this is a global (unscoped) assignment.
    pub fn is_global(&self) -> bool {
        self.org_unit_id.is_none()
    }
}

/// Which assignments a raw assignment query should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeFilter {
    /// Every assignment of the principal, whatever its scope.
    Any,
    /// Only assignments with no scope.
    Global,
    /// Only assignments scoped to exactly this unit.
    Unit(OrgUnitId),
}
