//! The permission engine facade.
//!
//! Owns one instance of each service over a shared [`PermissionStores`]
//! and exposes the boundary contract the rest of an application calls.

use std::collections::BTreeSet;

use tracing::info;

use warden_core::config::EngineConfig;
use warden_core::result::AppResult;
use warden_core::types::{OrgUnitId, UserId};

use crate::rbac::{
    BatchApplier, BatchOutcome, MatrixBuilder, OverrideManager, PermissionChange,
    PermissionMatrix, PermissionResolver, RoleManager,
};
use crate::seed::{PermissionSeed, SeedReport};
use crate::store::PermissionStores;

/// Entry point for authorization checks and permission administration.
#[derive(Debug, Clone)]
pub struct PermissionEngine {
    stores: PermissionStores,
    config: EngineConfig,
    resolver: PermissionResolver,
    matrix: MatrixBuilder,
    overrides: OverrideManager,
    batch: BatchApplier,
    roles: RoleManager,
}

impl PermissionEngine {
    /// Wire every service over `stores`.
    pub fn new(stores: PermissionStores, config: EngineConfig) -> Self {
        info!(
            max_note_length = config.max_note_length,
            max_batch_size = config.max_batch_size,
            "Permission engine initialized"
        );
        Self {
            resolver: PermissionResolver::new(stores.clone()),
            matrix: MatrixBuilder::new(stores.clone()),
            overrides: OverrideManager::new(stores.clone(), &config),
            batch: BatchApplier::new(stores.clone(), &config),
            roles: RoleManager::new(stores.clone()),
            stores,
            config,
        }
    }

    /// The underlying stores.
    pub fn stores(&self) -> &PermissionStores {
        &self.stores
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The resolver.
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    /// The matrix builder.
    pub fn matrix(&self) -> &MatrixBuilder {
        &self.matrix
    }

    /// Single-change override administration.
    pub fn overrides(&self) -> &OverrideManager {
        &self.overrides
    }

    /// The batch applier.
    pub fn batch(&self) -> &BatchApplier {
        &self.batch
    }

    /// Role and catalog administration.
    pub fn roles(&self) -> &RoleManager {
        &self.roles
    }

    /// The authorization gate every protected operation calls.
    pub async fn check_permission(
        &self,
        user_id: UserId,
        resource: &str,
        action_code: &str,
        scope: Option<OrgUnitId>,
    ) -> AppResult<bool> {
        self.resolver
            .check_permission(user_id, resource, action_code, scope)
            .await
    }

    /// Action codes of `resource` the principal may perform.
    pub async fn get_effective_actions(
        &self,
        user_id: UserId,
        resource: &str,
        scope: Option<OrgUnitId>,
    ) -> AppResult<BTreeSet<String>> {
        self.resolver
            .effective_actions(user_id, resource, scope)
            .await
    }

    /// The administrative read model.
    pub async fn build_permission_matrix(
        &self,
        user_id: UserId,
        scope: Option<OrgUnitId>,
    ) -> AppResult<PermissionMatrix> {
        self.matrix.build(user_id, scope).await
    }

    /// The administrative write model.
    pub async fn apply_permission_changes(
        &self,
        user_id: UserId,
        changes: Vec<PermissionChange>,
        granted_by: UserId,
    ) -> AppResult<BatchOutcome> {
        self.batch.apply(user_id, changes, granted_by).await
    }

    /// Apply a seed document to the stores.
    pub async fn seed(&self, seed: &PermissionSeed) -> AppResult<SeedReport> {
        seed.apply(&self.stores).await
    }
}
