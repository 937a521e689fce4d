//! Principal row model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use warden_core::types::UserId;

/// A user account whose permissions are evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Principal {
    /// Principal identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Human-readable name.
    pub display_name: Option<String>,
    /// When the principal was registered.
    pub created_at: DateTime<Utc>,
}

impl Principal {
    /// Build a new principal row.
    pub fn new(username: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            display_name,
            created_at: Utc::now(),
        }
    }

    /// Display name, falling back to the username.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}
