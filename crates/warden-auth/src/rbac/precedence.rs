//! The single precedence rule shared by the resolver and the matrix.

use serde::{Deserialize, Serialize};

use warden_entity::user_override::UserActionOverride;

/// Where a decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// An override decided, whatever the roles say.
    Override,
    /// At least one applicable role grants the action.
    Role,
    /// No override and no role grants the action.
    NoGrant,
    /// The action is unknown or inactive.
    Unresolvable,
}

/// An allow/deny answer with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the principal may perform the action.
    pub granted: bool,
    /// What produced the answer.
    pub source: DecisionSource,
}

impl Decision {
    /// Deny for an action that cannot be resolved.
    pub fn unresolvable() -> Self {
        Self {
            granted: false,
            source: DecisionSource::Unresolvable,
        }
    }

    /// The decision an existing override imposes.
    pub fn from_override(row: &UserActionOverride) -> Self {
        Self {
            granted: row.is_granted,
            source: DecisionSource::Override,
        }
    }

    /// The role-derived decision.
    pub fn from_roles(via_role: bool) -> Self {
        Self {
            granted: via_role,
            source: if via_role {
                DecisionSource::Role
            } else {
                DecisionSource::NoGrant
            },
        }
    }
}

/// Combine an override (if any) with the role-derived value.
pub fn decide(row: Option<&UserActionOverride>, via_role: bool) -> Decision {
    match row {
        Some(row) => Decision::from_override(row),
        None => Decision::from_roles(via_role),
    }
}
