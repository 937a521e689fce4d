//! Store traits consumed by the resolver and the administrative services.
//!
//! Every trait is object-safe and used as `Arc<dyn Trait>`, so the engine
//! runs unchanged over PostgreSQL or the in-memory backend. Nothing here
//! caches; each call reads the backing store.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_core::types::{ActionId, OrgUnitId, RoleId, UserId};
use warden_entity::action::{Action, ActionKey, ActionRef, NewAction};
use warden_entity::audit::{AuditLogEntry, CreateAuditLogEntry};
use warden_entity::principal::Principal;
use warden_entity::role::{AssignedRole, Role, RoleGrant, ScopeFilter};
use warden_entity::user_override::{UpsertOverride, UserActionOverride};

pub use memory::MemoryPermissionStore;

/// Registry of `(resource, action_code)` pairs.
#[async_trait]
pub trait ActionCatalog: Send + Sync + std::fmt::Debug {
    /// Find an action by id, active or not.
    async fn find_by_id(&self, id: ActionId) -> AppResult<Option<Action>>;

    /// Find an action by identity, active or not.
    async fn find_by_key(&self, key: &ActionKey) -> AppResult<Option<Action>>;

    /// List the catalog ordered by resource then action code.
    async fn list(&self, include_inactive: bool) -> AppResult<Vec<Action>>;

    /// List the active actions of one resource.
    async fn list_active_by_resource(&self, resource: &str) -> AppResult<Vec<Action>>;

    /// Register a new action. A duplicate identity is a conflict.
    async fn create(&self, action: NewAction) -> AppResult<Action>;

    /// Activate or deactivate an action.
    async fn set_active(&self, id: ActionId, is_active: bool) -> AppResult<Action>;

    /// Resolve an identity to an active action. Inactive matches are
    /// reported as absent.
    async fn lookup(&self, key: &ActionKey) -> AppResult<Option<Action>> {
        Ok(self.find_by_key(key).await?.filter(|a| a.is_active))
    }

    /// Resolve a reference for an administrative call, active or not.
    async fn require(&self, action: &ActionRef) -> AppResult<Action> {
        let found = match action {
            ActionRef::Id(id) => self.find_by_id(*id).await?,
            ActionRef::Key(key) => self.find_by_key(key).await?,
        };
        found.ok_or_else(|| AppError::not_found(format!("Action '{action}' not found")))
    }

    /// Resolve a reference to an active action, or `NotFound`.
    async fn require_active(&self, action: &ActionRef) -> AppResult<Action> {
        let found = self.require(action).await?;
        if !found.is_active {
            return Err(AppError::not_found(format!(
                "Action '{}' is inactive",
                found.identity()
            )));
        }
        Ok(found)
    }
}

/// Roles and the actions each role confers.
#[async_trait]
pub trait RoleGrantStore: Send + Sync + std::fmt::Debug {
    /// Whether the role has an in-effect grant for the action. A missing
    /// row and an `is_granted = false` row both mean no.
    async fn has_grant(&self, role_id: RoleId, action_id: ActionId) -> AppResult<bool>;

    /// The grant row for `(role, action)`, whether or not it is in effect.
    async fn find_grant(
        &self,
        role_id: RoleId,
        action_id: ActionId,
    ) -> AppResult<Option<RoleGrant>>;

    /// The actions a role confers.
    async fn list_actions(&self, role_id: RoleId) -> AppResult<Vec<Action>>;

    /// Create or replace the grant row for `(role, action)`.
    async fn set_grant(
        &self,
        role_id: RoleId,
        action_id: ActionId,
        is_granted: bool,
    ) -> AppResult<RoleGrant>;

    /// Remove the grant row for `(role, action)`.
    async fn remove_grant(&self, role_id: RoleId, action_id: ActionId) -> AppResult<bool>;

    /// Find a role by id.
    async fn find_role(&self, id: RoleId) -> AppResult<Option<Role>>;

    /// Find a role by name.
    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    /// Create a role. A duplicate name is a conflict.
    async fn create_role(&self, role: Role) -> AppResult<Role>;

    /// List all roles by name.
    async fn all_roles(&self) -> AppResult<Vec<Role>>;

    /// Replace a role's description.
    async fn update_role_description(
        &self,
        id: RoleId,
        description: Option<String>,
    ) -> AppResult<Role>;

    /// Resolve a role name, or `NotFound`.
    async fn require_role(&self, name: &str) -> AppResult<Role> {
        self.find_role_by_name(name.trim())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Role '{name}' not found")))
    }
}

/// Which roles each principal holds, and at which scope.
#[async_trait]
pub trait RoleAssignmentStore: Send + Sync + std::fmt::Debug {
    /// Raw assignment query with no fallback.
    async fn find_assignments(
        &self,
        user_id: UserId,
        filter: ScopeFilter,
    ) -> AppResult<Vec<AssignedRole>>;

    /// Record an assignment. An identical `(principal, role, scope)` triple
    /// is a conflict.
    async fn assign(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: Option<OrgUnitId>,
    ) -> AppResult<AssignedRole>;

    /// Remove the exact `(principal, role, scope)` assignment.
    async fn unassign(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: Option<OrgUnitId>,
    ) -> AppResult<bool>;

    /// Roles that apply to a check at `scope`.
    ///
    /// With no scope every assignment counts. With a scope, only
    /// assignments at that unit count, unless there are none, in which
    /// case the principal's global assignments are used instead. Roles held
    /// at other units are never consulted.
    async fn list_roles(
        &self,
        user_id: UserId,
        scope: Option<OrgUnitId>,
    ) -> AppResult<Vec<AssignedRole>> {
        let Some(unit) = scope else {
            return self.find_assignments(user_id, ScopeFilter::Any).await;
        };

        let scoped = self
            .find_assignments(user_id, ScopeFilter::Unit(unit))
            .await?;
        if !scoped.is_empty() {
            return Ok(scoped);
        }

        debug!(user_id = %user_id, scope = %unit, "No scoped roles, falling back to global roles");
        self.find_assignments(user_id, ScopeFilter::Global).await
    }
}

/// Per-principal, per-action exceptions.
#[async_trait]
pub trait OverrideStore: Send + Sync + std::fmt::Debug {
    /// The override for `(principal, action)`, if any.
    async fn get(
        &self,
        user_id: UserId,
        action_id: ActionId,
    ) -> AppResult<Option<UserActionOverride>>;

    /// All overrides held by a principal.
    async fn list_for_principal(&self, user_id: UserId) -> AppResult<Vec<UserActionOverride>>;

    /// Write the single row for `(principal, action)`, replacing any
    /// existing decision in place.
    async fn upsert(&self, data: UpsertOverride) -> AppResult<UserActionOverride>;

    /// Insert a new row. A second row for the same pair is a conflict.
    async fn create(&self, data: UpsertOverride) -> AppResult<UserActionOverride>;

    /// Delete the override for `(principal, action)`. Returns whether one existed.
    async fn delete(&self, user_id: UserId, action_id: ActionId) -> AppResult<bool>;
}

/// Principals known to the engine.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync + std::fmt::Debug {
    /// Find a principal by id.
    async fn find(&self, id: UserId) -> AppResult<Option<Principal>>;

    /// Find a principal by username.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Principal>>;

    /// Register a principal. A duplicate username is a conflict.
    async fn create(&self, principal: Principal) -> AppResult<Principal>;

    /// Resolve a principal id, or `NotFound`.
    async fn require(&self, id: UserId) -> AppResult<Principal> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Principal {id} not found")))
    }

    /// Resolve a username, or `NotFound`.
    async fn require_username(&self, username: &str) -> AppResult<Principal> {
        self.find_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User '{username}' not found")))
    }
}

/// Append-only record of administrative changes.
#[async_trait]
pub trait AuditTrail: Send + Sync + std::fmt::Debug {
    /// Append an entry.
    async fn record(&self, entry: CreateAuditLogEntry) -> AppResult<AuditLogEntry>;

    /// Most recent entries about one target, newest first.
    async fn list_for_target(&self, target_id: Uuid, limit: usize) -> AppResult<Vec<AuditLogEntry>>;
}

/// The full set of stores the engine reads and writes.
#[derive(Debug, Clone)]
pub struct PermissionStores {
    /// Action catalog.
    pub actions: Arc<dyn ActionCatalog>,
    /// Roles and role grants.
    pub grants: Arc<dyn RoleGrantStore>,
    /// Role assignments.
    pub assignments: Arc<dyn RoleAssignmentStore>,
    /// Per-principal overrides.
    pub overrides: Arc<dyn OverrideStore>,
    /// Principals.
    pub principals: Arc<dyn PrincipalDirectory>,
    /// Audit trail.
    pub audit: Arc<dyn AuditTrail>,
}

impl PermissionStores {
    /// Back every store with one shared in-memory store.
    pub fn memory(store: Arc<MemoryPermissionStore>) -> Self {
        Self {
            actions: store.clone(),
            grants: store.clone(),
            assignments: store.clone(),
            overrides: store.clone(),
            principals: store.clone(),
            audit: store,
        }
    }
}
