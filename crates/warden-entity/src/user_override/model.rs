//! Override row model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use warden_core::types::{ActionId, OverrideId, UserId};

/// A per-principal exception that grants or revokes one action regardless
/// of role grants.
///
/// At most one row exists per `(user_id, action_id)`; a new decision
/// updates the row in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserActionOverride {
    /// Override identifier (stable across upserts).
    pub id: OverrideId,
    /// The principal the override applies to.
    pub user_id: UserId,
    /// The overridden action.
    pub action_id: ActionId,
    /// `true` grants the action, `false` revokes it.
    pub is_granted: bool,
    /// Administrator's reason.
    pub note: Option<String>,
    /// Administrator who made the decision.
    pub granted_by: UserId,
    /// When the decision was made.
    pub granted_at: DateTime<Utc>,
}

impl UserActionOverride {
    /// Whether this override grants or revokes.
    pub fn override_type(&self) -> OverrideType {
        OverrideType::from_granted(self.is_granted)
    }
}

/// Display form of an override decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideType {
    /// Explicit grant.
    Grant,
    /// Explicit revoke.
    Revoke,
}

impl OverrideType {
    /// Map an override's `is_granted` flag.
    pub fn from_granted(granted: bool) -> Self {
        if granted { Self::Grant } else { Self::Revoke }
    }

    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::Revoke => "revoke",
        }
    }
}

impl std::fmt::Display for OverrideType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Data written by an override upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertOverride {
    /// The principal.
    pub user_id: UserId,
    /// The action.
    pub action_id: ActionId,
    /// Desired decision.
    pub is_granted: bool,
    /// Administrator's reason.
    pub note: Option<String>,
    /// Acting administrator.
    pub granted_by: UserId,
}
