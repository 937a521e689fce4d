//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use warden_auth::{MemoryPermissionStore, PermissionEngine, PermissionSeed, PermissionStores};
use warden_core::config::EngineConfig;
use warden_core::types::OrgUnitId;
use warden_entity::action::{Action, ActionKey};
use warden_entity::principal::Principal;

/// Catalog and roles shared by every scenario.
///
/// `r1` grants `activity:APPROVE` and `student:VIEW`; `r2` grants
/// `student:DELETE`; `staff` grants `attendance:VIEW`.
const BASE_SEED: &str = r#"{
    "actions": [
        { "resource": "activity", "action_code": "APPROVE", "action_name": "Approve activity" },
        { "resource": "activity", "action_code": "CREATE", "action_name": "Create activity" },
        { "resource": "attendance", "action_code": "VIEW", "action_name": "View attendance" },
        { "resource": "evidence", "action_code": "UPLOAD", "action_name": "Upload evidence" },
        { "resource": "student", "action_code": "VIEW", "action_name": "View student" },
        { "resource": "student", "action_code": "DELETE", "action_name": "Delete student" }
    ],
    "roles": [
        { "name": "r1", "actions": ["activity:APPROVE", "student:VIEW"] },
        { "name": "r2", "actions": ["student:DELETE"] },
        { "name": "staff", "actions": ["attendance:VIEW"] },
        { "name": "admin" }
    ],
    "principals": [
        { "username": "admin", "display_name": "Administrator", "roles": [{ "role": "admin" }] }
    ]
}"#;

/// Test application context over the in-memory store
pub struct TestApp {
    /// The engine under test
    pub engine: PermissionEngine,
    /// Direct handle on the store, for write counters
    pub store: Arc<MemoryPermissionStore>,
    /// The acting administrator
    pub admin: Principal,
}

impl TestApp {
    /// Create a new seeded test application
    pub async fn new() -> Self {
        Self::with_config(EngineConfig::default()).await
    }

    /// Create a seeded test application with custom limits
    pub async fn with_config(config: EngineConfig) -> Self {
        let store = Arc::new(MemoryPermissionStore::new());
        let engine = PermissionEngine::new(PermissionStores::memory(store.clone()), config);

        let seed = PermissionSeed::from_json(BASE_SEED).expect("Invalid base seed");
        engine.seed(&seed).await.expect("Failed to apply base seed");

        let admin = engine
            .stores()
            .principals
            .require_username("admin")
            .await
            .expect("Seeded admin missing");

        Self {
            engine,
            store,
            admin,
        }
    }

    /// Register a user holding the given global roles
    pub async fn create_user(&self, username: &str, roles: &[&str]) -> Principal {
        let principal = self
            .engine
            .stores()
            .principals
            .create(Principal::new(username, None))
            .await
            .expect("Failed to create user");
        for role in roles {
            self.assign(&principal, role, None).await;
        }
        principal
    }

    /// Assign a role at a scope
    pub async fn assign(&self, principal: &Principal, role: &str, scope: Option<OrgUnitId>) {
        self.engine
            .roles()
            .assign_role(principal.id, role, scope, self.admin.id)
            .await
            .expect("Failed to assign role");
    }

    /// Look up a seeded action
    pub async fn action(&self, identity: &str) -> Action {
        let key: ActionKey = identity.parse().expect("Invalid identity");
        self.engine
            .stores()
            .actions
            .find_by_key(&key)
            .await
            .expect("Catalog read failed")
            .expect("Action not seeded")
    }

    /// Shorthand for an unscoped check
    pub async fn check(&self, principal: &Principal, resource: &str, code: &str) -> bool {
        self.engine
            .check_permission(principal.id, resource, code, None)
            .await
            .expect("Check failed")
    }

    /// Shorthand for a check at a scope
    pub async fn check_at(
        &self,
        principal: &Principal,
        resource: &str,
        code: &str,
        scope: Option<OrgUnitId>,
    ) -> bool {
        self.engine
            .check_permission(principal.id, resource, code, scope)
            .await
            .expect("Check failed")
    }
}
