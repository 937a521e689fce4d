//! In-memory permission store guarded by a Tokio `RwLock`.
//!
//! Implements every store trait over one shared state, with the same
//! uniqueness rules as the PostgreSQL schema. Used by tests and by
//! single-process embedding.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_core::types::{ActionId, OrgUnitId, OverrideId, RoleAssignmentId, RoleId, UserId};
use warden_entity::action::{Action, ActionKey, NewAction};
use warden_entity::audit::{AuditLogEntry, CreateAuditLogEntry};
use warden_entity::principal::Principal;
use warden_entity::role::{AssignedRole, Role, RoleGrant, ScopeFilter};
use warden_entity::user_override::{UpsertOverride, UserActionOverride};

use super::{
    ActionCatalog, AuditTrail, OverrideStore, PrincipalDirectory, RoleAssignmentStore,
    RoleGrantStore,
};

#[derive(Debug, Clone)]
struct StoredAssignment {
    id: RoleAssignmentId,
    user_id: UserId,
    role_id: RoleId,
    org_unit_id: Option<OrgUnitId>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryState {
    actions: HashMap<ActionId, Action>,
    roles: HashMap<RoleId, Role>,
    grants: HashMap<(RoleId, ActionId), RoleGrant>,
    assignments: Vec<StoredAssignment>,
    overrides: HashMap<(UserId, ActionId), UserActionOverride>,
    principals: HashMap<UserId, Principal>,
    audit: Vec<AuditLogEntry>,
}

impl MemoryState {
    fn joined(&self, stored: &StoredAssignment) -> Option<AssignedRole> {
        let role = self.roles.get(&stored.role_id)?;
        Some(AssignedRole {
            assignment_id: stored.id,
            user_id: stored.user_id,
            role_id: stored.role_id,
            role_name: role.name.clone(),
            role_description: role.description.clone(),
            org_unit_id: stored.org_unit_id,
            created_at: stored.created_at,
        })
    }
}

/// Process-local implementation of every permission store.
#[derive(Debug, Default)]
pub struct MemoryPermissionStore {
    state: RwLock<MemoryState>,
    override_writes: AtomicU64,
}

impl MemoryPermissionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of override write calls (upsert, create, delete) served so far.
    pub fn override_writes(&self) -> u64 {
        self.override_writes.load(Ordering::Relaxed)
    }

    fn note_override_write(&self) {
        self.override_writes.fetch_add(1, Ordering::Relaxed);
    }
}

fn sort_actions(actions: &mut [Action]) {
    actions.sort_by(|a, b| {
        a.resource
            .cmp(&b.resource)
            .then_with(|| a.action_code.cmp(&b.action_code))
    });
}

#[async_trait]
impl ActionCatalog for MemoryPermissionStore {
    async fn find_by_id(&self, id: ActionId) -> AppResult<Option<Action>> {
        Ok(self.state.read().await.actions.get(&id).cloned())
    }

    async fn find_by_key(&self, key: &ActionKey) -> AppResult<Option<Action>> {
        let state = self.state.read().await;
        Ok(state
            .actions
            .values()
            .find(|a| a.resource == key.resource() && a.action_code == key.action_code())
            .cloned())
    }

    async fn list(&self, include_inactive: bool) -> AppResult<Vec<Action>> {
        let state = self.state.read().await;
        let mut actions: Vec<Action> = state
            .actions
            .values()
            .filter(|a| include_inactive || a.is_active)
            .cloned()
            .collect();
        sort_actions(&mut actions);
        Ok(actions)
    }

    async fn list_active_by_resource(&self, resource: &str) -> AppResult<Vec<Action>> {
        let state = self.state.read().await;
        let mut actions: Vec<Action> = state
            .actions
            .values()
            .filter(|a| a.is_active && a.resource == resource)
            .cloned()
            .collect();
        sort_actions(&mut actions);
        Ok(actions)
    }

    async fn create(&self, action: NewAction) -> AppResult<Action> {
        let mut state = self.state.write().await;
        let duplicate = state.actions.values().any(|a| {
            a.resource == action.key.resource() && a.action_code == action.key.action_code()
        });
        if duplicate {
            return Err(AppError::conflict(format!(
                "Action '{}' already exists",
                action.key
            )));
        }

        let action = action.into_action();
        state.actions.insert(action.id, action.clone());
        Ok(action)
    }

    async fn set_active(&self, id: ActionId, is_active: bool) -> AppResult<Action> {
        let mut state = self.state.write().await;
        let action = state
            .actions
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Action {id} not found")))?;
        action.is_active = is_active;
        action.updated_at = Utc::now();
        Ok(action.clone())
    }
}

#[async_trait]
impl RoleGrantStore for MemoryPermissionStore {
    async fn has_grant(&self, role_id: RoleId, action_id: ActionId) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .grants
            .get(&(role_id, action_id))
            .is_some_and(|g| g.is_granted))
    }

    async fn find_grant(
        &self,
        role_id: RoleId,
        action_id: ActionId,
    ) -> AppResult<Option<RoleGrant>> {
        let state = self.state.read().await;
        Ok(state.grants.get(&(role_id, action_id)).cloned())
    }

    async fn list_actions(&self, role_id: RoleId) -> AppResult<Vec<Action>> {
        let state = self.state.read().await;
        let mut actions: Vec<Action> = state
            .grants
            .values()
            .filter(|g| g.role_id == role_id && g.is_granted)
            .filter_map(|g| state.actions.get(&g.action_id).cloned())
            .collect();
        sort_actions(&mut actions);
        Ok(actions)
    }

    async fn set_grant(
        &self,
        role_id: RoleId,
        action_id: ActionId,
        is_granted: bool,
    ) -> AppResult<RoleGrant> {
        let mut state = self.state.write().await;
        if !state.roles.contains_key(&role_id) {
            return Err(AppError::not_found(format!("Role {role_id} not found")));
        }
        if !state.actions.contains_key(&action_id) {
            return Err(AppError::not_found(format!("Action {action_id} not found")));
        }

        let grant = state
            .grants
            .entry((role_id, action_id))
            .and_modify(|g| g.is_granted = is_granted)
            .or_insert_with(|| RoleGrant {
                role_id,
                action_id,
                is_granted,
                created_at: Utc::now(),
            });
        Ok(grant.clone())
    }

    async fn remove_grant(&self, role_id: RoleId, action_id: ActionId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.grants.remove(&(role_id, action_id)).is_some())
    }

    async fn find_role(&self, id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.state.read().await.roles.get(&id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let state = self.state.read().await;
        Ok(state.roles.values().find(|r| r.name == name).cloned())
    }

    async fn create_role(&self, role: Role) -> AppResult<Role> {
        let mut state = self.state.write().await;
        if state.roles.values().any(|r| r.name == role.name) {
            return Err(AppError::conflict(format!(
                "Role '{}' already exists",
                role.name
            )));
        }
        state.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn all_roles(&self) -> AppResult<Vec<Role>> {
        let state = self.state.read().await;
        let mut roles: Vec<Role> = state.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn update_role_description(
        &self,
        id: RoleId,
        description: Option<String>,
    ) -> AppResult<Role> {
        let mut state = self.state.write().await;
        let role = state
            .roles
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Role {id} not found")))?;
        role.description = description;
        Ok(role.clone())
    }
}

#[async_trait]
impl RoleAssignmentStore for MemoryPermissionStore {
    async fn find_assignments(
        &self,
        user_id: UserId,
        filter: ScopeFilter,
    ) -> AppResult<Vec<AssignedRole>> {
        let state = self.state.read().await;
        let mut assigned: Vec<AssignedRole> = state
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter(|a| match filter {
                ScopeFilter::Any => true,
                ScopeFilter::Global => a.org_unit_id.is_none(),
                ScopeFilter::Unit(unit) => a.org_unit_id == Some(unit),
            })
            .filter_map(|a| state.joined(a))
            .collect();
        assigned.sort_by(|a, b| {
            a.role_name
                .cmp(&b.role_name)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(assigned)
    }

    async fn assign(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: Option<OrgUnitId>,
    ) -> AppResult<AssignedRole> {
        let mut state = self.state.write().await;
        if !state.principals.contains_key(&user_id) {
            return Err(AppError::not_found(format!("Principal {user_id} not found")));
        }
        let duplicate = state
            .assignments
            .iter()
            .any(|a| a.user_id == user_id && a.role_id == role_id && a.org_unit_id == scope);
        if duplicate {
            return Err(AppError::conflict("Role assignment already exists"));
        }

        let stored = StoredAssignment {
            id: RoleAssignmentId::new(),
            user_id,
            role_id,
            org_unit_id: scope,
            created_at: Utc::now(),
        };
        let assigned = state
            .joined(&stored)
            .ok_or_else(|| AppError::not_found(format!("Role {role_id} not found")))?;
        state.assignments.push(stored);
        Ok(assigned)
    }

    async fn unassign(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: Option<OrgUnitId>,
    ) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let before = state.assignments.len();
        state
            .assignments
            .retain(|a| !(a.user_id == user_id && a.role_id == role_id && a.org_unit_id == scope));
        Ok(state.assignments.len() < before)
    }
}

#[async_trait]
impl OverrideStore for MemoryPermissionStore {
    async fn get(
        &self,
        user_id: UserId,
        action_id: ActionId,
    ) -> AppResult<Option<UserActionOverride>> {
        let state = self.state.read().await;
        Ok(state.overrides.get(&(user_id, action_id)).cloned())
    }

    async fn list_for_principal(&self, user_id: UserId) -> AppResult<Vec<UserActionOverride>> {
        let state = self.state.read().await;
        let mut overrides: Vec<UserActionOverride> = state
            .overrides
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        overrides.sort_by(|a, b| b.granted_at.cmp(&a.granted_at));
        Ok(overrides)
    }

    async fn upsert(&self, data: UpsertOverride) -> AppResult<UserActionOverride> {
        self.note_override_write();
        let mut state = self.state.write().await;
        let now = Utc::now();
        let row = state
            .overrides
            .entry((data.user_id, data.action_id))
            .and_modify(|o| {
                o.is_granted = data.is_granted;
                o.note = data.note.clone();
                o.granted_by = data.granted_by;
                o.granted_at = now;
            })
            .or_insert_with(|| UserActionOverride {
                id: OverrideId::new(),
                user_id: data.user_id,
                action_id: data.action_id,
                is_granted: data.is_granted,
                note: data.note.clone(),
                granted_by: data.granted_by,
                granted_at: now,
            });
        debug!(user_id = %data.user_id, action_id = %data.action_id, "Override upserted in memory");
        Ok(row.clone())
    }

    async fn create(&self, data: UpsertOverride) -> AppResult<UserActionOverride> {
        self.note_override_write();
        let mut state = self.state.write().await;
        let key = (data.user_id, data.action_id);
        if state.overrides.contains_key(&key) {
            return Err(AppError::conflict(format!(
                "Override for principal {} and action {} already exists",
                data.user_id, data.action_id
            )));
        }

        let row = UserActionOverride {
            id: OverrideId::new(),
            user_id: data.user_id,
            action_id: data.action_id,
            is_granted: data.is_granted,
            note: data.note,
            granted_by: data.granted_by,
            granted_at: Utc::now(),
        };
        state.overrides.insert(key, row.clone());
        Ok(row)
    }

    async fn delete(&self, user_id: UserId, action_id: ActionId) -> AppResult<bool> {
        self.note_override_write();
        let mut state = self.state.write().await;
        Ok(state.overrides.remove(&(user_id, action_id)).is_some())
    }
}

#[async_trait]
impl PrincipalDirectory for MemoryPermissionStore {
    async fn find(&self, id: UserId) -> AppResult<Option<Principal>> {
        Ok(self.state.read().await.principals.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Principal>> {
        let state = self.state.read().await;
        Ok(state
            .principals
            .values()
            .find(|p| p.username == username)
            .cloned())
    }

    async fn create(&self, principal: Principal) -> AppResult<Principal> {
        let mut state = self.state.write().await;
        if state.principals.values().any(|p| p.username == principal.username) {
            return Err(AppError::conflict(format!(
                "User '{}' already exists",
                principal.username
            )));
        }
        state.principals.insert(principal.id, principal.clone());
        Ok(principal)
    }
}

#[async_trait]
impl AuditTrail for MemoryPermissionStore {
    async fn record(&self, entry: CreateAuditLogEntry) -> AppResult<AuditLogEntry> {
        let entry = entry.into_entry();
        self.state.write().await.audit.push(entry.clone());
        Ok(entry)
    }

    async fn list_for_target(
        &self,
        target_id: Uuid,
        limit: usize,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let state = self.state.read().await;
        Ok(state
            .audit
            .iter()
            .rev()
            .filter(|e| e.target_id == Some(target_id))
            .take(limit)
            .cloned()
            .collect())
    }
}
