//! Role grant row model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use warden_core::types::{ActionId, RoleId};

/// A static rule that a role confers (or explicitly does not confer) an action.
///
/// A row with `is_granted = false` confers nothing, exactly like a missing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RoleGrant {
    /// The role.
    pub role_id: RoleId,
    /// The granted action.
    pub action_id: ActionId,
    /// Whether the grant is in effect.
    pub is_granted: bool,
    /// When the grant was created.
    pub created_at: DateTime<Utc>,
}
