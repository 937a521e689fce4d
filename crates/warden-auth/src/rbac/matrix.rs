//! Per-principal permission report for administrative tooling.
//!
//! The matrix is a read model. Its `effective` column comes from the same
//! precedence rule the resolver uses, and it is shown identically under
//! every role section; it is never a per-role answer.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::debug;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_core::types::{ActionId, OrgUnitId, OverrideId, RoleId, UserId};
use warden_entity::action::Action;
use warden_entity::principal::Principal;
use warden_entity::role::AssignedRole;
use warden_entity::user_override::{OverrideType, UserActionOverride};

use crate::store::PermissionStores;

use super::precedence::decide;

/// One action's row in the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixEntry {
    /// Catalog id.
    pub action_id: ActionId,
    /// Resource.
    pub resource: String,
    /// Action code.
    pub action_code: String,
    /// Display name.
    pub action_name: String,
    /// Description.
    pub description: Option<String>,
    /// In the flat list: any held role grants it. Under a role section:
    /// that role grants it.
    pub via_role: bool,
    /// The principal's override, if any.
    pub override_type: Option<OverrideType>,
    /// Override row id.
    pub override_id: Option<OverrideId>,
    /// Override note.
    pub note: Option<String>,
    /// Administrator who set the override.
    pub granted_by: Option<UserId>,
    /// That administrator's display label.
    pub granted_by_name: Option<String>,
    /// When the override was set.
    pub granted_at: Option<DateTime<Utc>>,
    /// The resolver's answer for this principal.
    pub effective: bool,
}

/// Counts over the flat permission list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixSummary {
    /// Active actions listed.
    pub total_actions: usize,
    /// Actions the principal may perform.
    pub effective_count: usize,
    /// Actions with an override.
    pub override_count: usize,
    /// Grant overrides.
    pub granted_count: usize,
    /// Revoke overrides.
    pub revoked_count: usize,
}

/// The full report for one principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionMatrix {
    /// The principal.
    pub principal: Principal,
    /// Scope the report was built for.
    pub scope: Option<OrgUnitId>,
    /// Assignments that applied (after scope fallback).
    pub roles: Vec<AssignedRole>,
    /// Every active action once, with `via_role` over all held roles.
    pub permissions: Vec<MatrixEntry>,
    /// Every active action under each held role name.
    pub permissions_by_role: BTreeMap<String, Vec<MatrixEntry>>,
    /// Counts.
    pub summary: MatrixSummary,
}

impl PermissionMatrix {
    /// The flat entry for one action.
    pub fn entry(&self, action_id: ActionId) -> Option<&MatrixEntry> {
        self.permissions.iter().find(|e| e.action_id == action_id)
    }
}

/// Builds [`PermissionMatrix`] reports from direct store reads.
#[derive(Debug, Clone)]
pub struct MatrixBuilder {
    stores: PermissionStores,
}

impl MatrixBuilder {
    /// Create a builder over the given stores.
    pub fn new(stores: PermissionStores) -> Self {
        Self { stores }
    }

    /// Build the report for `user_id` at `scope`.
    ///
    /// An empty catalog yields an empty report.
    pub async fn build(
        &self,
        user_id: UserId,
        scope: Option<OrgUnitId>,
    ) -> AppResult<PermissionMatrix> {
        let principal = self.stores.principals.require(user_id).await?;
        let actions = self.stores.actions.list(false).await?;
        let roles = self.stores.assignments.list_roles(user_id, scope).await?;

        let mut distinct_roles: Vec<(RoleId, String)> = Vec::new();
        for role in &roles {
            if !distinct_roles.iter().any(|(id, _)| *id == role.role_id) {
                distinct_roles.push((role.role_id, role.role_name.clone()));
            }
        }

        let grant_sets = try_join_all(distinct_roles.iter().map(|(role_id, _)| async move {
            let actions = self.stores.grants.list_actions(*role_id).await?;
            Ok::<_, AppError>(actions.into_iter().map(|a| a.id).collect::<HashSet<_>>())
        }))
        .await?;

        let overrides: HashMap<ActionId, UserActionOverride> = self
            .stores
            .overrides
            .list_for_principal(user_id)
            .await?
            .into_iter()
            .map(|o| (o.action_id, o))
            .collect();
        let admin_names = self.admin_names(overrides.values()).await?;

        let mut permissions = Vec::with_capacity(actions.len());
        let mut permissions_by_role: BTreeMap<String, Vec<MatrixEntry>> = distinct_roles
            .iter()
            .map(|(_, name)| (name.clone(), Vec::with_capacity(actions.len())))
            .collect();

        for action in &actions {
            let row = overrides.get(&action.id);
            let via_any = grant_sets.iter().any(|set| set.contains(&action.id));
            let effective = decide(row, via_any).granted;
            let entry = matrix_entry(action, row, via_any, effective, &admin_names);

            for ((_, name), set) in distinct_roles.iter().zip(&grant_sets) {
                if let Some(section) = permissions_by_role.get_mut(name) {
                    section.push(MatrixEntry {
                        via_role: set.contains(&action.id),
                        ..entry.clone()
                    });
                }
            }
            permissions.push(entry);
        }

        let summary = summarize(&permissions);
        debug!(
            user_id = %user_id,
            roles = distinct_roles.len(),
            actions = summary.total_actions,
            effective = summary.effective_count,
            "Permission matrix built"
        );

        Ok(PermissionMatrix {
            principal,
            scope,
            roles,
            permissions,
            permissions_by_role,
            summary,
        })
    }

    async fn admin_names<'a>(
        &self,
        overrides: impl Iterator<Item = &'a UserActionOverride>,
    ) -> AppResult<HashMap<UserId, String>> {
        let mut names = HashMap::new();
        for row in overrides {
            if names.contains_key(&row.granted_by) {
                continue;
            }
            if let Some(admin) = self.stores.principals.find(row.granted_by).await? {
                names.insert(row.granted_by, admin.label().to_string());
            }
        }
        Ok(names)
    }
}

fn matrix_entry(
    action: &Action,
    row: Option<&UserActionOverride>,
    via_role: bool,
    effective: bool,
    admin_names: &HashMap<UserId, String>,
) -> MatrixEntry {
    MatrixEntry {
        action_id: action.id,
        resource: action.resource.clone(),
        action_code: action.action_code.clone(),
        action_name: action.action_name.clone(),
        description: action.description.clone(),
        via_role,
        override_type: row.map(UserActionOverride::override_type),
        override_id: row.map(|o| o.id),
        note: row.and_then(|o| o.note.clone()),
        granted_by: row.map(|o| o.granted_by),
        granted_by_name: row.and_then(|o| admin_names.get(&o.granted_by).cloned()),
        granted_at: row.map(|o| o.granted_at),
        effective,
    }
}

fn summarize(permissions: &[MatrixEntry]) -> MatrixSummary {
    let count_type = |t: OverrideType| {
        permissions
            .iter()
            .filter(|p| p.override_type == Some(t))
            .count()
    };

    MatrixSummary {
        total_actions: permissions.len(),
        effective_count: permissions.iter().filter(|p| p.effective).count(),
        override_count: permissions.iter().filter(|p| p.override_type.is_some()).count(),
        granted_count: count_type(OverrideType::Grant),
        revoked_count: count_type(OverrideType::Revoke),
    }
}
