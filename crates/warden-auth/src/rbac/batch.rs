//! Desired-state batch application over the override store.
//!
//! Items are applied one at a time with no transaction spanning the
//! batch: a failed item is reported and the rest still run.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use warden_core::config::EngineConfig;
use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_core::types::{ActionId, UserId};
use warden_entity::action::ActionRef;

use crate::store::PermissionStores;

use super::matrix::{MatrixBuilder, PermissionMatrix};
use super::overrides::{ActionTaken, OverrideManager};
use super::resolver::PermissionResolver;

/// One desired end state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionChange {
    /// The action, by id or `resource:ACTION`.
    #[serde(alias = "action_id")]
    pub action: ActionRef,
    /// Whether the principal should end up with the action.
    pub desired_effective: bool,
    /// Reason recorded on any override written.
    #[serde(default)]
    pub note: Option<String>,
}

impl PermissionChange {
    /// Build a change without a note.
    pub fn new(action: impl Into<ActionRef>, desired_effective: bool) -> Self {
        Self {
            action: action.into(),
            desired_effective,
            note: None,
        }
    }

    /// Attach a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Per-item outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeResult {
    /// The action as requested.
    pub action: ActionRef,
    /// The resolved catalog id, when resolution succeeded.
    pub action_id: Option<ActionId>,
    /// Whether the item was applied (a no-op counts as success).
    pub success: bool,
    /// What was written, absent on failure.
    pub action_taken: Option<ActionTaken>,
    /// Human-readable summary or failure reason.
    pub message: String,
}

/// Result of a whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// One result per input item, in input order.
    pub changes: Vec<ChangeResult>,
    /// The principal's matrix after the batch.
    pub updated_matrix: PermissionMatrix,
}

impl BatchOutcome {
    /// Number of failed items.
    pub fn failed(&self) -> usize {
        self.changes.iter().filter(|c| !c.success).count()
    }

    /// Number of items that wrote to the store.
    pub fn mutations(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| c.action_taken.is_some_and(|t| t.is_mutation()))
            .count()
    }
}

/// Moves a principal's overrides to a desired state with minimal writes.
#[derive(Debug, Clone)]
pub struct BatchApplier {
    stores: PermissionStores,
    resolver: PermissionResolver,
    overrides: OverrideManager,
    matrix: MatrixBuilder,
    max_batch_size: usize,
}

impl BatchApplier {
    /// Create an applier over the given stores.
    pub fn new(stores: PermissionStores, config: &EngineConfig) -> Self {
        Self {
            resolver: PermissionResolver::new(stores.clone()),
            overrides: OverrideManager::new(stores.clone(), config),
            matrix: MatrixBuilder::new(stores.clone()),
            stores,
            max_batch_size: config.max_batch_size,
        }
    }

    /// Apply `changes` for `user_id` on behalf of `granted_by`.
    ///
    /// Fails as a whole only when the batch is oversized or the principal
    /// is unknown. Per-item failures land in the item's result.
    pub async fn apply(
        &self,
        user_id: UserId,
        changes: Vec<PermissionChange>,
        granted_by: UserId,
    ) -> AppResult<BatchOutcome> {
        if changes.len() > self.max_batch_size {
            return Err(AppError::validation(format!(
                "Batch of {} changes exceeds the limit of {}",
                changes.len(),
                self.max_batch_size
            )));
        }
        self.stores.principals.require(user_id).await?;

        let mut results = Vec::with_capacity(changes.len());
        for change in changes {
            let result = match self.apply_one(user_id, &change, granted_by).await {
                Ok((action_id, action_taken, message)) => ChangeResult {
                    action: change.action,
                    action_id: Some(action_id),
                    success: true,
                    action_taken: Some(action_taken),
                    message,
                },
                Err(e) => {
                    warn!(
                        user_id = %user_id,
                        action = %change.action,
                        error = %e,
                        "Batch item failed"
                    );
                    ChangeResult {
                        action: change.action,
                        action_id: None,
                        success: false,
                        action_taken: None,
                        message: e.message,
                    }
                }
            };
            results.push(result);
        }

        let updated_matrix = self.matrix.build(user_id, None).await?;
        let outcome = BatchOutcome {
            changes: results,
            updated_matrix,
        };
        info!(
            user_id = %user_id,
            granted_by = %granted_by,
            items = outcome.changes.len(),
            mutations = outcome.mutations(),
            failed = outcome.failed(),
            "Permission batch applied"
        );
        Ok(outcome)
    }

    async fn apply_one(
        &self,
        user_id: UserId,
        change: &PermissionChange,
        granted_by: UserId,
    ) -> AppResult<(ActionId, ActionTaken, String)> {
        let note = self.overrides.validate_note(change.note.clone())?;
        let action = self.stores.actions.require_active(&change.action).await?;
        let state = self.resolver.inspect(user_id, &action, None).await?;
        let desired = change.desired_effective;

        if desired == state.effective() {
            return Ok((action.id, ActionTaken::None, "No change needed".to_string()));
        }

        if desired == state.via_role && state.override_row.is_some() {
            self.overrides.remove(user_id, &action, granted_by).await?;
            return Ok((
                action.id,
                ActionTaken::DeletedOverride,
                "Override removed, reverted to role-based permissions".to_string(),
            ));
        }

        let taken = if state.override_row.is_some() {
            ActionTaken::OverrideChanged
        } else {
            ActionTaken::CreatedOverride
        };
        self.overrides
            .write(user_id, &action, desired, note, granted_by)
            .await?;
        let message = if desired {
            "Permission granted to user"
        } else {
            "Permission revoked from user"
        };
        Ok((action.id, taken, message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use warden_core::ErrorKind;
    use warden_entity::action::ActionKey;

    use super::*;
    use crate::rbac::fixture::Fixture;

    fn applier(fx: &Fixture) -> BatchApplier {
        BatchApplier::new(fx.stores.clone(), &EngineConfig::default())
    }

    #[tokio::test]
    async fn test_matching_role_value_deletes_override() {
        let fx = Fixture::new().await;
        let approve = fx.action("activity", "APPROVE").await;
        let r1 = fx.role("r1", &[&approve]).await;
        let user = fx.principal("u").await;
        fx.assign(&user, &r1, None).await;
        fx.set_override(&user, &approve, false).await;

        let outcome = applier(&fx)
            .apply(user.id, vec![PermissionChange::new(approve.key(), true)], fx.admin.id)
            .await
            .unwrap();

        assert_eq!(outcome.changes[0].action_taken, Some(ActionTaken::DeletedOverride));
        assert!(fx.stores.overrides.get(user.id, approve.id).await.unwrap().is_none());
        assert!(outcome.updated_matrix.entry(approve.id).unwrap().effective);
    }

    #[tokio::test]
    async fn test_no_change_writes_nothing() {
        let fx = Fixture::new().await;
        let approve = fx.action("activity", "APPROVE").await;
        let delete = fx.action("student", "DELETE").await;
        let r1 = fx.role("r1", &[&approve]).await;
        let user = fx.principal("u").await;
        fx.assign(&user, &r1, None).await;
        let before = fx.store.override_writes();

        let outcome = applier(&fx)
            .apply(
                user.id,
                vec![
                    PermissionChange::new(approve.id, true),
                    PermissionChange::new(delete.id, false),
                ],
                fx.admin.id,
            )
            .await
            .unwrap();

        assert_eq!(outcome.mutations(), 0);
        assert_eq!(fx.store.override_writes(), before);
    }

    #[tokio::test]
    async fn test_override_created_then_removed() {
        let fx = Fixture::new().await;
        let delete = fx.action("student", "DELETE").await;
        let user = fx.principal("u").await;
        let applier = applier(&fx);

        let created = applier
            .apply(
                user.id,
                vec![PermissionChange::new(delete.id, true).with_note("term project")],
                fx.admin.id,
            )
            .await
            .unwrap();
        assert_eq!(created.changes[0].action_taken, Some(ActionTaken::CreatedOverride));
        assert_eq!(
            created.updated_matrix.entry(delete.id).unwrap().note.as_deref(),
            Some("term project")
        );

        let removed = applier
            .apply(user.id, vec![PermissionChange::new(delete.id, false)], fx.admin.id)
            .await
            .unwrap();
        assert_eq!(removed.changes[0].action_taken, Some(ActionTaken::DeletedOverride));
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_batch() {
        let fx = Fixture::new().await;
        let upload = fx.action("evidence", "UPLOAD").await;
        let retired = fx.action("evidence", "ARCHIVE").await;
        fx.deactivate(&retired).await;
        let user = fx.principal("u").await;

        let missing = ActionKey::new("nothing", "HERE").unwrap();
        let outcome = applier(&fx)
            .apply(
                user.id,
                vec![
                    PermissionChange::new(missing, true),
                    PermissionChange::new(retired.id, true),
                    PermissionChange::new(upload.id, true),
                ],
                fx.admin.id,
            )
            .await
            .unwrap();

        assert_eq!(outcome.failed(), 2);
        assert!(!outcome.changes[0].success);
        assert!(!outcome.changes[1].success);
        assert_eq!(outcome.changes[2].action_taken, Some(ActionTaken::CreatedOverride));
    }

    #[tokio::test]
    async fn test_unknown_principal_and_oversized_batch() {
        let fx = Fixture::new().await;
        let upload = fx.action("evidence", "UPLOAD").await;
        let err = applier(&fx)
            .apply(UserId::new(), vec![PermissionChange::new(upload.id, true)], fx.admin.id)
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::NotFound));

        let config = EngineConfig {
            max_batch_size: 1,
            ..EngineConfig::default()
        };
        let user = fx.principal("u").await;
        let err = BatchApplier::new(fx.stores.clone(), &config)
            .apply(
                user.id,
                vec![
                    PermissionChange::new(upload.id, true),
                    PermissionChange::new(upload.id, false),
                ],
                fx.admin.id,
            )
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::Validation));
    }
}
