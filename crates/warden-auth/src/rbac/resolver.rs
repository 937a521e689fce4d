//! The authoritative allow/deny procedure.
//!
//! Every call re-reads the stores. An override read and a role-set read
//! happen once per call, so a single answer is internally consistent, but
//! two calls may straddle a concurrent administrative write.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_core::types::{ActionId, OrgUnitId, UserId};
use warden_entity::action::key::normalize_resource;
use warden_entity::action::{Action, ActionKey};
use warden_entity::role::AssignedRole;
use warden_entity::user_override::UserActionOverride;

use crate::store::PermissionStores;

use super::precedence::{Decision, decide};

/// Everything known about one action for one principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionState {
    /// The catalog action.
    pub action: Action,
    /// Whether any applicable role grants it.
    pub via_role: bool,
    /// The principal's override for it, if any.
    pub override_row: Option<UserActionOverride>,
    /// The final answer.
    pub decision: Decision,
}

impl ActionState {
    /// The effective permission.
    pub fn effective(&self) -> bool {
        self.decision.granted
    }
}

/// Combines the catalog, overrides, and role grants into a decision.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    stores: PermissionStores,
}

impl PermissionResolver {
    /// Create a resolver over the given stores.
    pub fn new(stores: PermissionStores) -> Self {
        Self { stores }
    }

    /// The authorization gate: may `user_id` perform `resource:action_code`?
    ///
    /// Unknown and inactive actions deny rather than error.
    pub async fn check_permission(
        &self,
        user_id: UserId,
        resource: &str,
        action_code: &str,
        scope: Option<OrgUnitId>,
    ) -> AppResult<bool> {
        Ok(self
            .resolve(user_id, resource, action_code, scope)
            .await?
            .granted)
    }

    /// Like [`check_permission`](Self::check_permission), with provenance.
    pub async fn resolve(
        &self,
        user_id: UserId,
        resource: &str,
        action_code: &str,
        scope: Option<OrgUnitId>,
    ) -> AppResult<Decision> {
        match ActionKey::new(resource, action_code) {
            Ok(key) => self.resolve_key(user_id, &key, scope).await,
            Err(_) => {
                debug!(resource, action_code, "Malformed action identity, denying");
                Ok(Decision::unresolvable())
            }
        }
    }

    /// Resolve an already-normalized identity.
    pub async fn resolve_key(
        &self,
        user_id: UserId,
        key: &ActionKey,
        scope: Option<OrgUnitId>,
    ) -> AppResult<Decision> {
        let Some(action) = self.stores.actions.lookup(key).await? else {
            debug!(user_id = %user_id, action = %key, "Action unknown or inactive, denying");
            return Ok(Decision::unresolvable());
        };

        if let Some(row) = self.stores.overrides.get(user_id, action.id).await? {
            debug!(
                user_id = %user_id,
                action = %key,
                granted = row.is_granted,
                "Override decides"
            );
            return Ok(Decision::from_override(&row));
        }

        let roles = self.stores.assignments.list_roles(user_id, scope).await?;
        let via_role = self.any_role_grants(&roles, action.id).await?;
        Ok(Decision::from_roles(via_role))
    }

    /// Fail with `Authorization` unless the permission is granted.
    pub async fn require_permission(
        &self,
        user_id: UserId,
        key: &ActionKey,
        scope: Option<OrgUnitId>,
    ) -> AppResult<()> {
        if self.resolve_key(user_id, key, scope).await?.granted {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("Permission '{key}' denied")))
        }
    }

    /// Whether at least one of `keys` is granted. Empty input denies.
    pub async fn has_any_permission(
        &self,
        user_id: UserId,
        keys: &[ActionKey],
        scope: Option<OrgUnitId>,
    ) -> AppResult<bool> {
        for key in keys {
            if self.resolve_key(user_id, key, scope).await?.granted {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether every one of `keys` is granted. Empty input denies.
    pub async fn has_all_permissions(
        &self,
        user_id: UserId,
        keys: &[ActionKey],
        scope: Option<OrgUnitId>,
    ) -> AppResult<bool> {
        if keys.is_empty() {
            return Ok(false);
        }
        for key in keys {
            if !self.resolve_key(user_id, key, scope).await?.granted {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Action codes of `resource` the principal may perform.
    pub async fn effective_actions(
        &self,
        user_id: UserId,
        resource: &str,
        scope: Option<OrgUnitId>,
    ) -> AppResult<BTreeSet<String>> {
        let actions = self
            .stores
            .actions
            .list_active_by_resource(&normalize_resource(resource))
            .await?;
        let roles = self.stores.assignments.list_roles(user_id, scope).await?;

        let mut granted = BTreeSet::new();
        for action in actions {
            if self.decide_with_roles(user_id, &action, &roles).await?.granted {
                granted.insert(action.action_code);
            }
        }
        Ok(granted)
    }

    /// Every granted action, grouped by resource.
    pub async fn effective_permissions(
        &self,
        user_id: UserId,
        scope: Option<OrgUnitId>,
    ) -> AppResult<BTreeMap<String, BTreeSet<String>>> {
        let actions = self.stores.actions.list(false).await?;
        let roles = self.stores.assignments.list_roles(user_id, scope).await?;

        let mut granted: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for action in actions {
            if self.decide_with_roles(user_id, &action, &roles).await?.granted {
                granted
                    .entry(action.resource)
                    .or_default()
                    .insert(action.action_code);
            }
        }
        Ok(granted)
    }

    /// Role value, override, and decision for one catalog action.
    ///
    /// Reads both signals regardless of precedence so administrative code
    /// can diff against them.
    pub async fn inspect(
        &self,
        user_id: UserId,
        action: &Action,
        scope: Option<OrgUnitId>,
    ) -> AppResult<ActionState> {
        let via_role = self.via_role(user_id, action.id, scope).await?;
        let override_row = self.stores.overrides.get(user_id, action.id).await?;
        let decision = if action.is_active {
            decide(override_row.as_ref(), via_role)
        } else {
            Decision::unresolvable()
        };

        Ok(ActionState {
            action: action.clone(),
            via_role,
            override_row,
            decision,
        })
    }

    /// Whether any role applicable at `scope` grants the action.
    pub async fn via_role(
        &self,
        user_id: UserId,
        action_id: ActionId,
        scope: Option<OrgUnitId>,
    ) -> AppResult<bool> {
        let roles = self.stores.assignments.list_roles(user_id, scope).await?;
        self.any_role_grants(&roles, action_id).await
    }

    async fn decide_with_roles(
        &self,
        user_id: UserId,
        action: &Action,
        roles: &[AssignedRole],
    ) -> AppResult<Decision> {
        if let Some(row) = self.stores.overrides.get(user_id, action.id).await? {
            return Ok(Decision::from_override(&row));
        }
        let via_role = self.any_role_grants(roles, action.id).await?;
        Ok(Decision::from_roles(via_role))
    }

    async fn any_role_grants(
        &self,
        roles: &[AssignedRole],
        action_id: ActionId,
    ) -> AppResult<bool> {
        let mut seen = HashSet::new();
        for role in roles {
            if !seen.insert(role.role_id) {
                continue;
            }
            if self.stores.grants.has_grant(role.role_id, action_id).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
