//! Store traits over the PostgreSQL repositories.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_core::types::{ActionId, OrgUnitId, RoleId, UserId};
use warden_database::DatabasePool;
use warden_database::repositories::{
    ActionRepository, AuditLogRepository, OverrideRepository, PrincipalRepository,
    RoleAssignmentRepository, RoleRepository,
};
use warden_entity::action::{Action, ActionKey, NewAction};
use warden_entity::audit::{AuditLogEntry, CreateAuditLogEntry};
use warden_entity::principal::Principal;
use warden_entity::role::{AssignedRole, Role, RoleGrant, ScopeFilter};
use warden_entity::user_override::{UpsertOverride, UserActionOverride};

use super::{
    ActionCatalog, AuditTrail, OverrideStore, PermissionStores, PrincipalDirectory,
    RoleAssignmentStore, RoleGrantStore,
};

impl PermissionStores {
    /// Back every store with the PostgreSQL repositories on `db`.
    pub fn postgres(db: &DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            actions: Arc::new(ActionRepository::new(pool.clone())),
            grants: Arc::new(RoleRepository::new(pool.clone())),
            assignments: Arc::new(RoleAssignmentRepository::new(pool.clone())),
            overrides: Arc::new(OverrideRepository::new(pool.clone())),
            principals: Arc::new(PrincipalRepository::new(pool.clone())),
            audit: Arc::new(AuditLogRepository::new(pool)),
        }
    }
}

#[async_trait]
impl ActionCatalog for ActionRepository {
    async fn find_by_id(&self, id: ActionId) -> AppResult<Option<Action>> {
        ActionRepository::find_by_id(self, id).await
    }

    async fn find_by_key(&self, key: &ActionKey) -> AppResult<Option<Action>> {
        ActionRepository::find_by_key(self, key).await
    }

    async fn list(&self, include_inactive: bool) -> AppResult<Vec<Action>> {
        ActionRepository::list(self, include_inactive).await
    }

    async fn list_active_by_resource(&self, resource: &str) -> AppResult<Vec<Action>> {
        ActionRepository::list_active_by_resource(self, resource).await
    }

    async fn create(&self, action: NewAction) -> AppResult<Action> {
        ActionRepository::create(self, &action.into_action()).await
    }

    async fn set_active(&self, id: ActionId, is_active: bool) -> AppResult<Action> {
        ActionRepository::set_active(self, id, is_active)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Action {id} not found")))
    }
}

#[async_trait]
impl RoleGrantStore for RoleRepository {
    async fn has_grant(&self, role_id: RoleId, action_id: ActionId) -> AppResult<bool> {
        RoleRepository::has_grant(self, role_id, action_id).await
    }

    async fn find_grant(
        &self,
        role_id: RoleId,
        action_id: ActionId,
    ) -> AppResult<Option<RoleGrant>> {
        RoleRepository::find_grant(self, role_id, action_id).await
    }

    async fn list_actions(&self, role_id: RoleId) -> AppResult<Vec<Action>> {
        self.list_granted_actions(role_id).await
    }

    async fn set_grant(
        &self,
        role_id: RoleId,
        action_id: ActionId,
        is_granted: bool,
    ) -> AppResult<RoleGrant> {
        self.upsert_grant(role_id, action_id, is_granted).await
    }

    async fn remove_grant(&self, role_id: RoleId, action_id: ActionId) -> AppResult<bool> {
        self.delete_grant(role_id, action_id).await
    }

    async fn find_role(&self, id: RoleId) -> AppResult<Option<Role>> {
        self.find_by_id(id).await
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        self.find_by_name(name).await
    }

    async fn create_role(&self, role: Role) -> AppResult<Role> {
        self.create(&role).await
    }

    async fn all_roles(&self) -> AppResult<Vec<Role>> {
        self.list().await
    }

    async fn update_role_description(
        &self,
        id: RoleId,
        description: Option<String>,
    ) -> AppResult<Role> {
        self.update_description(id, description.as_deref())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Role {id} not found")))
    }
}

#[async_trait]
impl RoleAssignmentStore for RoleAssignmentRepository {
    async fn find_assignments(
        &self,
        user_id: UserId,
        filter: ScopeFilter,
    ) -> AppResult<Vec<AssignedRole>> {
        self.find_for_user(user_id, filter).await
    }

    async fn assign(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: Option<OrgUnitId>,
    ) -> AppResult<AssignedRole> {
        self.create(user_id, role_id, scope).await
    }

    async fn unassign(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: Option<OrgUnitId>,
    ) -> AppResult<bool> {
        self.delete(user_id, role_id, scope).await
    }
}

#[async_trait]
impl OverrideStore for OverrideRepository {
    async fn get(
        &self,
        user_id: UserId,
        action_id: ActionId,
    ) -> AppResult<Option<UserActionOverride>> {
        self.find(user_id, action_id).await
    }

    async fn list_for_principal(&self, user_id: UserId) -> AppResult<Vec<UserActionOverride>> {
        self.list_for_user(user_id).await
    }

    async fn upsert(&self, data: UpsertOverride) -> AppResult<UserActionOverride> {
        OverrideRepository::upsert(self, &data).await
    }

    async fn create(&self, data: UpsertOverride) -> AppResult<UserActionOverride> {
        self.insert(&data).await
    }

    async fn delete(&self, user_id: UserId, action_id: ActionId) -> AppResult<bool> {
        OverrideRepository::delete(self, user_id, action_id).await
    }
}

#[async_trait]
impl PrincipalDirectory for PrincipalRepository {
    async fn find(&self, id: UserId) -> AppResult<Option<Principal>> {
        self.find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Principal>> {
        PrincipalRepository::find_by_username(self, username).await
    }

    async fn create(&self, principal: Principal) -> AppResult<Principal> {
        PrincipalRepository::create(self, &principal).await
    }
}

#[async_trait]
impl AuditTrail for AuditLogRepository {
    async fn record(&self, entry: CreateAuditLogEntry) -> AppResult<AuditLogEntry> {
        self.create(&entry.into_entry()).await
    }

    async fn list_for_target(
        &self,
        target_id: Uuid,
        limit: usize,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        AuditLogRepository::list_for_target(self, target_id, limit).await
    }
}
