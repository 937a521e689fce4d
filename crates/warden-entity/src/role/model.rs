//! Role row model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use warden_core::types::RoleId;

/// A named bundle of action grants.
///
/// Only the description may change once a role is referenced by grants or
/// assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    /// Role identifier.
    pub id: RoleId,
    /// Unique role name (e.g. `student`, `staff`, `admin`).
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// When the role was created.
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Build a new role row.
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into().trim().to_string(),
            description,
            created_at: Utc::now(),
        }
    }
}
