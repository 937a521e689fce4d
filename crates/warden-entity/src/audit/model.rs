//! Audit log entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use warden_core::types::{AuditLogId, UserId};

/// An immutable record of an administrative permission change.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    /// Unique audit entry identifier.
    pub id: AuditLogId,
    /// The administrator who performed the change.
    pub actor_id: UserId,
    /// What was done (e.g. `"override.grant"`, `"role.assign"`).
    pub action: String,
    /// The kind of target (`"principal"`, `"role"`, `"action"`).
    pub target_type: String,
    /// The target's identifier.
    pub target_id: Option<Uuid>,
    /// Change details (JSON).
    pub details: Option<serde_json::Value>,
    /// When the change occurred.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditLogEntry {
    /// The acting administrator.
    pub actor_id: UserId,
    /// What was done.
    pub action: String,
    /// Target kind.
    pub target_type: String,
    /// Target identifier.
    pub target_id: Option<Uuid>,
    /// Change details.
    pub details: Option<serde_json::Value>,
}

impl CreateAuditLogEntry {
    /// Start an entry for the given actor and action.
    pub fn new(
        actor_id: UserId,
        action: impl Into<String>,
        target_type: impl Into<String>,
    ) -> Self {
        Self {
            actor_id,
            action: action.into(),
            target_type: target_type.into(),
            target_id: None,
            details: None,
        }
    }

    /// Set the target identifier.
    pub fn target(mut self, target_id: impl Into<Uuid>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    /// Attach JSON details.
    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Materialize the row this request describes.
    pub fn into_entry(self) -> AuditLogEntry {
        AuditLogEntry {
            id: AuditLogId::new(),
            actor_id: self.actor_id,
            action: self.action,
            target_type: self.target_type,
            target_id: self.target_id,
            details: self.details,
            created_at: Utc::now(),
        }
    }
}
