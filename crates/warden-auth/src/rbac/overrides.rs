//! Single-change override administration.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use warden_core::config::EngineConfig;
use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_core::types::{ActionId, UserId};
use warden_entity::action::{Action, ActionRef};
use warden_entity::audit::CreateAuditLogEntry;
use warden_entity::user_override::{UpsertOverride, UserActionOverride};

use crate::store::PermissionStores;

use super::resolver::PermissionResolver;

/// What an administrative change did to the override store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionTaken {
    /// Nothing was written.
    None,
    /// A new override row was written.
    CreatedOverride,
    /// An existing override flipped.
    OverrideChanged,
    /// An override was deleted; the role-derived value applies again.
    DeletedOverride,
    /// A grant request found a role already granting, so the override was
    /// dropped.
    RemovedDenyOverride,
}

impl ActionTaken {
    /// Wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::CreatedOverride => "CREATED_OVERRIDE",
            Self::OverrideChanged => "OVERRIDE_CHANGED",
            Self::DeletedOverride => "DELETED_OVERRIDE",
            Self::RemovedDenyOverride => "REMOVED_DENY_OVERRIDE",
        }
    }

    /// Whether the store was written.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for ActionTaken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one override change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideOutcome {
    /// The action affected.
    pub action_id: ActionId,
    /// What happened.
    pub action_taken: ActionTaken,
    /// Human-readable summary.
    pub message: String,
    /// The override row after the change, if one remains.
    pub override_row: Option<UserActionOverride>,
}

impl OverrideOutcome {
    fn new(action: &Action, action_taken: ActionTaken, message: impl Into<String>) -> Self {
        Self {
            action_id: action.id,
            action_taken,
            message: message.into(),
            override_row: None,
        }
    }

    fn with_row(mut self, row: UserActionOverride) -> Self {
        self.override_row = Some(row);
        self
    }
}

/// Grants, revokes, and resets per-principal overrides, auditing every write.
#[derive(Debug, Clone)]
pub struct OverrideManager {
    stores: PermissionStores,
    resolver: PermissionResolver,
    max_note_length: usize,
}

impl OverrideManager {
    /// Create a manager over the given stores.
    pub fn new(stores: PermissionStores, config: &EngineConfig) -> Self {
        Self {
            resolver: PermissionResolver::new(stores.clone()),
            stores,
            max_note_length: config.max_note_length,
        }
    }

    /// Give the principal the action.
    ///
    /// If a held role already confers it, any override is dropped instead
    /// of writing a redundant grant.
    pub async fn grant(
        &self,
        user_id: UserId,
        action: &ActionRef,
        granted_by: UserId,
        note: Option<String>,
    ) -> AppResult<OverrideOutcome> {
        let note = self.validate_note(note)?;
        let action = self.resolve_target(user_id, action).await?;

        if self.resolver.via_role(user_id, action.id, None).await? {
            let removed = self.remove(user_id, &action, granted_by).await?;
            return Ok(if removed {
                OverrideOutcome::new(
                    &action,
                    ActionTaken::RemovedDenyOverride,
                    "Permission already granted via role; override removed",
                )
            } else {
                OverrideOutcome::new(
                    &action,
                    ActionTaken::None,
                    "Permission already granted via role",
                )
            });
        }

        let existing = self.stores.overrides.get(user_id, action.id).await?;
        match existing {
            Some(row) if row.is_granted => Ok(OverrideOutcome::new(
                &action,
                ActionTaken::None,
                "Permission already granted to user",
            )
            .with_row(row)),
            Some(_) => {
                let row = self.write(user_id, &action, true, note, granted_by).await?;
                Ok(OverrideOutcome::new(
                    &action,
                    ActionTaken::OverrideChanged,
                    "Permission granted to user",
                )
                .with_row(row))
            }
            None => {
                let row = self.write(user_id, &action, true, note, granted_by).await?;
                Ok(OverrideOutcome::new(
                    &action,
                    ActionTaken::CreatedOverride,
                    "Permission granted to user",
                )
                .with_row(row))
            }
        }
    }

    /// Take the action away from the principal.
    ///
    /// A revoke is recorded even when no role confers the action.
    pub async fn revoke(
        &self,
        user_id: UserId,
        action: &ActionRef,
        granted_by: UserId,
        note: Option<String>,
    ) -> AppResult<OverrideOutcome> {
        let note = self.validate_note(note)?;
        let action = self.resolve_target(user_id, action).await?;

        let existing = self.stores.overrides.get(user_id, action.id).await?;
        match existing {
            Some(row) if !row.is_granted => Ok(OverrideOutcome::new(
                &action,
                ActionTaken::None,
                "Permission already denied to user",
            )
            .with_row(row)),
            Some(_) => {
                let row = self.write(user_id, &action, false, note, granted_by).await?;
                Ok(OverrideOutcome::new(
                    &action,
                    ActionTaken::OverrideChanged,
                    "Permission revoked from user",
                )
                .with_row(row))
            }
            None => {
                let row = self.write(user_id, &action, false, note, granted_by).await?;
                Ok(OverrideOutcome::new(
                    &action,
                    ActionTaken::CreatedOverride,
                    "Permission revoked from user",
                )
                .with_row(row))
            }
        }
    }

    /// Delete the override so the role-derived value applies again.
    pub async fn reset(
        &self,
        user_id: UserId,
        action: &ActionRef,
        granted_by: UserId,
    ) -> AppResult<OverrideOutcome> {
        let action = self.resolve_target(user_id, action).await?;

        if self.remove(user_id, &action, granted_by).await? {
            Ok(OverrideOutcome::new(
                &action,
                ActionTaken::DeletedOverride,
                "Override removed, reverted to role-based permissions",
            ))
        } else {
            Ok(OverrideOutcome::new(&action, ActionTaken::None, "No override found to delete"))
        }
    }

    /// Trim a note, drop it when blank, and enforce the length limit.
    pub fn validate_note(&self, note: Option<String>) -> AppResult<Option<String>> {
        let Some(note) = note else {
            return Ok(None);
        };
        let note = note.trim();
        if note.is_empty() {
            return Ok(None);
        }
        if note.chars().count() > self.max_note_length {
            return Err(AppError::validation(format!(
                "Note exceeds {} characters",
                self.max_note_length
            )));
        }
        Ok(Some(note.to_string()))
    }

    /// Upsert the override and audit it.
    pub(crate) async fn write(
        &self,
        user_id: UserId,
        action: &Action,
        is_granted: bool,
        note: Option<String>,
        granted_by: UserId,
    ) -> AppResult<UserActionOverride> {
        let row = self
            .stores
            .overrides
            .upsert(UpsertOverride {
                user_id,
                action_id: action.id,
                is_granted,
                note,
                granted_by,
            })
            .await?;

        let event = if is_granted { "override.grant" } else { "override.revoke" };
        self.stores
            .audit
            .record(
                CreateAuditLogEntry::new(granted_by, event, "principal")
                    .target(user_id)
                    .details(json!({
                        "action": action.identity(),
                        "action_id": action.id,
                        "is_granted": is_granted,
                        "note": row.note,
                    })),
            )
            .await?;

        info!(
            user_id = %user_id,
            action = %action.identity(),
            is_granted,
            granted_by = %granted_by,
            "Override written"
        );
        Ok(row)
    }

    /// Delete the override, auditing only when a row existed.
    pub(crate) async fn remove(
        &self,
        user_id: UserId,
        action: &Action,
        granted_by: UserId,
    ) -> AppResult<bool> {
        let removed = self.stores.overrides.delete(user_id, action.id).await?;
        if removed {
            self.stores
                .audit
                .record(
                    CreateAuditLogEntry::new(granted_by, "override.delete", "principal")
                        .target(user_id)
                        .details(json!({
                            "action": action.identity(),
                            "action_id": action.id,
                        })),
                )
                .await?;
            info!(
                user_id = %user_id,
                action = %action.identity(),
                granted_by = %granted_by,
                "Override deleted"
            );
        }
        Ok(removed)
    }

    async fn resolve_target(
        &self,
        user_id: UserId,
        action: &ActionRef,
    ) -> AppResult<Action> {
        self.stores.principals.require(user_id).await?;
        self.stores.actions.require(action).await
    }
}
