//! Role, grant, assignment, and catalog administration.

use std::collections::BTreeMap;

use serde_json::json;
use tracing::info;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_core::types::{OrgUnitId, UserId};
use warden_entity::action::{Action, ActionRef, NewAction};
use warden_entity::audit::CreateAuditLogEntry;
use warden_entity::role::{AssignedRole, Role, RoleGrant};

use crate::store::PermissionStores;

/// Administrative mutations outside the override store. Every write is
/// audited under the acting principal.
#[derive(Debug, Clone)]
pub struct RoleManager {
    stores: PermissionStores,
}

impl RoleManager {
    /// Create a manager over the given stores.
    pub fn new(stores: PermissionStores) -> Self {
        Self { stores }
    }

    /// Create a role. Names are unique.
    pub async fn create_role(
        &self,
        name: &str,
        description: Option<String>,
        actor: UserId,
    ) -> AppResult<Role> {
        if name.trim().is_empty() {
            return Err(AppError::validation("Role name must not be empty"));
        }
        let role = self
            .stores
            .grants
            .create_role(Role::new(name, description))
            .await?;

        self.audit(
            CreateAuditLogEntry::new(actor, "role.create", "role")
                .target(role.id)
                .details(json!({ "name": role.name })),
        )
        .await?;
        info!(role = %role.name, "Role created");
        Ok(role)
    }

    /// Replace a role's description, the only mutable role attribute.
    pub async fn update_role_description(
        &self,
        name: &str,
        description: Option<String>,
        actor: UserId,
    ) -> AppResult<Role> {
        let role = self.stores.grants.require_role(name).await?;
        let role = self
            .stores
            .grants
            .update_role_description(role.id, description)
            .await?;

        self.audit(
            CreateAuditLogEntry::new(actor, "role.update", "role")
                .target(role.id)
                .details(json!({ "description": role.description })),
        )
        .await?;
        Ok(role)
    }

    /// All roles by name.
    pub async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.stores.grants.all_roles().await
    }

    /// Give a principal a role, globally or at one unit.
    pub async fn assign_role(
        &self,
        user_id: UserId,
        role_name: &str,
        scope: Option<OrgUnitId>,
        actor: UserId,
    ) -> AppResult<AssignedRole> {
        self.stores.principals.require(user_id).await?;
        let role = self.stores.grants.require_role(role_name).await?;
        let assigned = self.stores.assignments.assign(user_id, role.id, scope).await?;

        self.audit(
            CreateAuditLogEntry::new(actor, "role.assign", "principal")
                .target(user_id)
                .details(json!({ "role": role.name, "scope": scope })),
        )
        .await?;
        info!(user_id = %user_id, role = %role.name, scope = ?scope, "Role assigned");
        Ok(assigned)
    }

    /// Remove the exact `(principal, role, scope)` assignment.
    pub async fn unassign_role(
        &self,
        user_id: UserId,
        role_name: &str,
        scope: Option<OrgUnitId>,
        actor: UserId,
    ) -> AppResult<()> {
        let role = self.stores.grants.require_role(role_name).await?;
        if !self.stores.assignments.unassign(user_id, role.id, scope).await? {
            return Err(AppError::not_found(format!(
                "Principal {user_id} does not hold role '{}' at that scope",
                role.name
            )));
        }

        self.audit(
            CreateAuditLogEntry::new(actor, "role.unassign", "principal")
                .target(user_id)
                .details(json!({ "role": role.name, "scope": scope })),
        )
        .await?;
        info!(user_id = %user_id, role = %role.name, scope = ?scope, "Role unassigned");
        Ok(())
    }

    /// Roles that apply to `user_id` at `scope`, after fallback.
    pub async fn roles_of(
        &self,
        user_id: UserId,
        scope: Option<OrgUnitId>,
    ) -> AppResult<Vec<AssignedRole>> {
        self.stores.assignments.list_roles(user_id, scope).await
    }

    /// Let a role confer an action.
    pub async fn grant_action_to_role(
        &self,
        role_name: &str,
        action: &ActionRef,
        actor: UserId,
    ) -> AppResult<RoleGrant> {
        let role = self.stores.grants.require_role(role_name).await?;
        let action = self.stores.actions.require(action).await?;
        let grant = self.stores.grants.set_grant(role.id, action.id, true).await?;

        self.audit(
            CreateAuditLogEntry::new(actor, "role.grant", "role")
                .target(role.id)
                .details(json!({ "action": action.identity() })),
        )
        .await?;
        info!(role = %role.name, action = %action.identity(), "Action granted to role");
        Ok(grant)
    }

    /// Stop a role from conferring an action. Returns whether a grant existed.
    pub async fn revoke_action_from_role(
        &self,
        role_name: &str,
        action: &ActionRef,
        actor: UserId,
    ) -> AppResult<bool> {
        let role = self.stores.grants.require_role(role_name).await?;
        let action = self.stores.actions.require(action).await?;
        let removed = self.stores.grants.remove_grant(role.id, action.id).await?;

        if removed {
            self.audit(
                CreateAuditLogEntry::new(actor, "role.revoke", "role")
                    .target(role.id)
                    .details(json!({ "action": action.identity() })),
            )
            .await?;
            info!(role = %role.name, action = %action.identity(), "Action revoked from role");
        }
        Ok(removed)
    }

    /// Actions a role confers.
    pub async fn role_actions(&self, role_name: &str) -> AppResult<Vec<Action>> {
        let role = self.stores.grants.require_role(role_name).await?;
        self.stores.grants.list_actions(role.id).await
    }

    /// Register a catalog action.
    pub async fn create_action(&self, action: NewAction, actor: UserId) -> AppResult<Action> {
        let action = self.stores.actions.create(action).await?;

        self.audit(
            CreateAuditLogEntry::new(actor, "action.create", "action")
                .target(action.id)
                .details(json!({ "action": action.identity() })),
        )
        .await?;
        info!(action = %action.identity(), "Action registered");
        Ok(action)
    }

    /// Deactivate or reactivate a catalog action.
    pub async fn set_action_active(
        &self,
        action: &ActionRef,
        is_active: bool,
        actor: UserId,
    ) -> AppResult<Action> {
        let action = self.stores.actions.require(action).await?;
        let action = self.stores.actions.set_active(action.id, is_active).await?;

        let event = if is_active { "action.activate" } else { "action.deactivate" };
        self.audit(
            CreateAuditLogEntry::new(actor, event, "action")
                .target(action.id)
                .details(json!({ "action": action.identity() })),
        )
        .await?;
        info!(action = %action.identity(), is_active, "Action state changed");
        Ok(action)
    }

    /// The catalog, optionally including inactive entries.
    pub async fn list_actions(&self, include_inactive: bool) -> AppResult<Vec<Action>> {
        self.stores.actions.list(include_inactive).await
    }

    /// Active actions conferred by at least one role applicable at `scope`.
    ///
    /// Overrides are ignored; this is the role-derived candidate set.
    pub async fn available_actions(
        &self,
        user_id: UserId,
        scope: Option<OrgUnitId>,
    ) -> AppResult<Vec<Action>> {
        let roles = self.roles_of(user_id, scope).await?;

        let mut available = BTreeMap::new();
        for role in roles {
            for action in self.stores.grants.list_actions(role.role_id).await? {
                if action.is_active {
                    available.insert((action.resource.clone(), action.action_code.clone()), action);
                }
            }
        }
        Ok(available.into_values().collect())
    }

    async fn audit(&self, entry: CreateAuditLogEntry) -> AppResult<()> {
        self.stores.audit.record(entry).await?;
        Ok(())
    }
}
