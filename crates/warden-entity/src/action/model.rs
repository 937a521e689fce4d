//! Action catalog row model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use warden_core::types::ActionId;

use super::key::ActionKey;

/// A resolvable `(resource, action_code)` pair.
///
/// Inactive actions stay in the catalog for administrative listing but
/// are never grantable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Action {
    /// Catalog identifier.
    pub id: ActionId,
    /// Lower-cased resource name (e.g. `activity`).
    pub resource: String,
    /// Upper-cased action code (e.g. `APPROVE`).
    pub action_code: String,
    /// Display name.
    pub action_name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Whether the action can currently be granted.
    pub is_active: bool,
    /// When the action was registered.
    pub created_at: DateTime<Utc>,
    /// When the action was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Action {
    /// The normalized identity of this action.
    pub fn key(&self) -> ActionKey {
        ActionKey::from_row(&self.resource, &self.action_code)
    }

    /// `resource:ACTION` form used in logs and CLI output.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.resource, self.action_code)
    }
}

/// Data required to register a new action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAction {
    /// Normalized identity.
    pub key: ActionKey,
    /// Display name.
    pub action_name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Initial active flag.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl NewAction {
    /// Create an active action with the given display name.
    pub fn new(key: ActionKey, action_name: impl Into<String>) -> Self {
        Self {
            key,
            action_name: action_name.into(),
            description: None,
            is_active: true,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Build the catalog row this request describes.
    pub fn into_action(self) -> Action {
        let now = Utc::now();
        Action {
            id: ActionId::new(),
            resource: self.key.resource().to_string(),
            action_code: self.key.action_code().to_string(),
            action_name: self.action_name,
            description: self.description,
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
        }
    }
}

fn default_active() -> bool {
    true
}
