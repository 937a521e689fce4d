//! Shared in-memory fixture for the rbac unit tests.

use std::sync::Arc;

use warden_core::types::OrgUnitId;
use warden_entity::action::{Action, ActionKey, NewAction};
use warden_entity::principal::Principal;
use warden_entity::role::Role;
use warden_entity::user_override::UpsertOverride;

use crate::store::{
    ActionCatalog, MemoryPermissionStore, OverrideStore, PermissionStores, PrincipalDirectory,
    RoleAssignmentStore, RoleGrantStore,
};

pub(crate) struct Fixture {
    pub store: Arc<MemoryPermissionStore>,
    pub stores: PermissionStores,
    pub admin: Principal,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryPermissionStore::new());
        let stores = PermissionStores::memory(store.clone());
        let admin = PrincipalDirectory::create(store.as_ref(), Principal::new("admin", None))
            .await
            .unwrap();
        Self {
            store,
            stores,
            admin,
        }
    }

    pub async fn action(&self, resource: &str, code: &str) -> Action {
        let key = ActionKey::new(resource, code).unwrap();
        ActionCatalog::create(self.store.as_ref(), NewAction::new(key, code))
            .await
            .unwrap()
    }

    pub async fn deactivate(&self, action: &Action) {
        self.store.set_active(action.id, false).await.unwrap();
    }

    pub async fn role(&self, name: &str, grants: &[&Action]) -> Role {
        let role = self.store.create_role(Role::new(name, None)).await.unwrap();
        for action in grants {
            self.store.set_grant(role.id, action.id, true).await.unwrap();
        }
        role
    }

    pub async fn principal(&self, username: &str) -> Principal {
        PrincipalDirectory::create(self.store.as_ref(), Principal::new(username, None))
            .await
            .unwrap()
    }

    pub async fn assign(&self, principal: &Principal, role: &Role, scope: Option<OrgUnitId>) {
        self.store.assign(principal.id, role.id, scope).await.unwrap();
    }

    pub async fn set_override(&self, principal: &Principal, action: &Action, granted: bool) {
        self.store
            .upsert(UpsertOverride {
                user_id: principal.id,
                action_id: action.id,
                is_granted: granted,
                note: None,
                granted_by: self.admin.id,
            })
            .await
            .unwrap();
    }
}
