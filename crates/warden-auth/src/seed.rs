//! Idempotent JSON bootstrap of actions, roles, grants, and principals.
//!
//! Existing rows are left untouched; only missing ones are created, so a
//! seed can be re-applied after every deploy.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_core::types::OrgUnitId;
use warden_entity::action::{ActionKey, NewAction};
use warden_entity::principal::Principal;
use warden_entity::role::{Role, ScopeFilter};

use crate::store::PermissionStores;

/// One catalog action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAction {
    /// Resource (any casing).
    pub resource: String,
    /// Action code (any casing).
    pub action_code: String,
    /// Display name; defaults to the action code.
    #[serde(default)]
    pub action_name: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
}

/// One role and the actions it confers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedRole {
    /// Role name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Granted actions as `resource:ACTION`.
    #[serde(default)]
    pub actions: Vec<ActionKey>,
}

/// A role held by a seeded principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAssignment {
    /// Role name.
    pub role: String,
    /// Unit the assignment is limited to; absent means global.
    #[serde(default)]
    pub scope: Option<OrgUnitId>,
}

/// One principal and the roles they hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPrincipal {
    /// Login name.
    pub username: String,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Roles held.
    #[serde(default)]
    pub roles: Vec<SeedAssignment>,
}

/// A complete seed document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionSeed {
    /// Catalog entries.
    #[serde(default)]
    pub actions: Vec<SeedAction>,
    /// Roles and their grants.
    #[serde(default)]
    pub roles: Vec<SeedRole>,
    /// Principals and their assignments.
    #[serde(default)]
    pub principals: Vec<SeedPrincipal>,
}

/// Rows created by one seed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    /// Actions registered.
    pub actions_created: usize,
    /// Roles created.
    pub roles_created: usize,
    /// Role grants written.
    pub grants_created: usize,
    /// Principals registered.
    pub principals_created: usize,
    /// Assignments recorded.
    pub assignments_created: usize,
}

impl PermissionSeed {
    /// Parse a seed from JSON text.
    pub fn from_json(text: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a seed file.
    pub async fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::with_source(
                warden_core::ErrorKind::Configuration,
                format!("Failed to read seed file {}", path.display()),
                e,
            )
        })?;
        Self::from_json(&text)
    }

    /// Create whatever is missing.
    pub async fn apply(&self, stores: &PermissionStores) -> AppResult<SeedReport> {
        let mut report = SeedReport::default();

        for seed in &self.actions {
            let key = ActionKey::new(&seed.resource, &seed.action_code)?;
            if stores.actions.find_by_key(&key).await?.is_some() {
                continue;
            }
            let name = seed
                .action_name
                .clone()
                .unwrap_or_else(|| key.action_code().to_string());
            let mut action = NewAction::new(key, name);
            action.description = seed.description.clone();
            stores.actions.create(action).await?;
            report.actions_created += 1;
        }

        for seed in &self.roles {
            let role = match stores.grants.find_role_by_name(seed.name.trim()).await? {
                Some(role) => role,
                None => {
                    report.roles_created += 1;
                    stores
                        .grants
                        .create_role(Role::new(&seed.name, seed.description.clone()))
                        .await?
                }
            };

            for key in &seed.actions {
                let action = stores.actions.find_by_key(key).await?.ok_or_else(|| {
                    AppError::not_found(format!(
                        "Seed role '{}' references unknown action '{key}'",
                        role.name
                    ))
                })?;
                // A row switched off by an administrator stays off.
                if stores.grants.find_grant(role.id, action.id).await?.is_none() {
                    stores.grants.set_grant(role.id, action.id, true).await?;
                    report.grants_created += 1;
                }
            }
        }

        for seed in &self.principals {
            let principal = match stores.principals.find_by_username(&seed.username).await? {
                Some(principal) => principal,
                None => {
                    report.principals_created += 1;
                    stores
                        .principals
                        .create(Principal::new(&seed.username, seed.display_name.clone()))
                        .await?
                }
            };

            let held = stores
                .assignments
                .find_assignments(principal.id, ScopeFilter::Any)
                .await?;
            for assignment in &seed.roles {
                let role = stores.grants.require_role(&assignment.role).await?;
                let exists = held
                    .iter()
                    .any(|h| h.role_id == role.id && h.org_unit_id == assignment.scope);
                if !exists {
                    stores
                        .assignments
                        .assign(principal.id, role.id, assignment.scope)
                        .await?;
                    report.assignments_created += 1;
                }
            }
        }

        info!(
            actions = report.actions_created,
            roles = report.roles_created,
            grants = report.grants_created,
            principals = report.principals_created,
            assignments = report.assignments_created,
            "Permission seed applied"
        );
        Ok(report)
    }
}
