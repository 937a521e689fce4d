//! Role management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_core::types::OrgUnitId;
use warden_entity::action::ActionRef;

use crate::output::{self, OutputFormat};

/// Arguments for role commands
#[derive(Debug, Args)]
pub struct RoleArgs {
    /// Role subcommand
    #[command(subcommand)]
    pub command: RoleCommand,
}

/// Role subcommands
#[derive(Debug, Subcommand)]
pub enum RoleCommand {
    /// List all roles
    List,
    /// Create a role
    Create {
        /// Role name
        name: String,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
        /// Acting administrator's username
        #[arg(long)]
        by: String,
    },
    /// Change a role's description
    Describe {
        /// Role name
        name: String,
        /// New description (empty clears it)
        description: String,
        /// Acting administrator's username
        #[arg(long)]
        by: String,
    },
    /// Show the actions a role confers
    Show {
        /// Role name
        name: String,
    },
    /// List the roles that apply to a user
    Of {
        /// Username
        username: String,
        /// Organizational unit
        #[arg(short, long)]
        scope: Option<OrgUnitId>,
    },
    /// Assign a role to a user
    Assign {
        /// Username
        username: String,
        /// Role name
        role: String,
        /// Limit the assignment to one organizational unit
        #[arg(short, long)]
        scope: Option<OrgUnitId>,
        /// Acting administrator's username
        #[arg(long)]
        by: String,
    },
    /// Remove a role assignment
    Unassign {
        /// Username
        username: String,
        /// Role name
        role: String,
        /// Scope of the assignment to remove
        #[arg(short, long)]
        scope: Option<OrgUnitId>,
        /// Acting administrator's username
        #[arg(long)]
        by: String,
    },
    /// Let a role confer an action
    Grant {
        /// Role name
        role: String,
        /// Action as `resource:ACTION` or catalog id
        action: ActionRef,
        /// Acting administrator's username
        #[arg(long)]
        by: String,
    },
    /// Stop a role from conferring an action
    Revoke {
        /// Role name
        role: String,
        /// Action as `resource:ACTION` or catalog id
        action: ActionRef,
        /// Acting administrator's username
        #[arg(long)]
        by: String,
    },
}

/// Role display row
#[derive(Debug, Serialize, Tabled)]
struct RoleRow {
    /// Role name
    name: String,
    /// Description
    description: String,
    /// Scope
    scope: String,
}

/// Execute role commands
pub async fn execute(
    args: &RoleArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::connect_engine(config).await?;
    let roles = engine.roles();

    match &args.command {
        RoleCommand::List => {
            let rows: Vec<RoleRow> = roles
                .list_roles()
                .await?
                .into_iter()
                .map(|r| RoleRow {
                    name: r.name,
                    description: r.description.unwrap_or_default(),
                    scope: "-".to_string(),
                })
                .collect();
            output::print_list(&rows, format);
        }
        RoleCommand::Create {
            name,
            description,
            by,
        } => {
            let admin = super::find_user(&engine, by).await?;
            let role = roles.create_role(name, description.clone(), admin.id).await?;
            output::print_success(&format!("Role '{}' created", role.name));
        }
        RoleCommand::Describe {
            name,
            description,
            by,
        } => {
            let admin = super::find_user(&engine, by).await?;
            let description = Some(description.trim().to_string()).filter(|d| !d.is_empty());
            roles
                .update_role_description(name, description, admin.id)
                .await?;
            output::print_success(&format!("Role '{name}' updated"));
        }
        RoleCommand::Show { name } => {
            let actions = roles.role_actions(name).await?;
            super::action::print_actions(&actions, format);
        }
        RoleCommand::Of { username, scope } => {
            let user = super::find_user(&engine, username).await?;
            let rows: Vec<RoleRow> = roles
                .roles_of(user.id, *scope)
                .await?
                .into_iter()
                .map(|r| RoleRow {
                    name: r.role_name,
                    description: r.role_description.unwrap_or_default(),
                    scope: r
                        .org_unit_id
                        .map(|u| u.to_string())
                        .unwrap_or_else(|| "global".to_string()),
                })
                .collect();
            output::print_list(&rows, format);
        }
        RoleCommand::Assign {
            username,
            role,
            scope,
            by,
        } => {
            let user = super::find_user(&engine, username).await?;
            let admin = super::find_user(&engine, by).await?;
            roles.assign_role(user.id, role, *scope, admin.id).await?;
            output::print_success(&format!("Role '{role}' assigned to '{username}'"));
        }
        RoleCommand::Unassign {
            username,
            role,
            scope,
            by,
        } => {
            let user = super::find_user(&engine, username).await?;
            let admin = super::find_user(&engine, by).await?;
            roles.unassign_role(user.id, role, *scope, admin.id).await?;
            output::print_success(&format!("Role '{role}' removed from '{username}'"));
        }
        RoleCommand::Grant { role, action, by } => {
            let admin = super::find_user(&engine, by).await?;
            roles.grant_action_to_role(role, action, admin.id).await?;
            output::print_success(&format!("Role '{role}' now confers '{action}'"));
        }
        RoleCommand::Revoke { role, action, by } => {
            let admin = super::find_user(&engine, by).await?;
            if roles.revoke_action_from_role(role, action, admin.id).await? {
                output::print_success(&format!("Role '{role}' no longer confers '{action}'"));
            } else {
                output::print_warning(&format!("Role '{role}' did not confer '{action}'"));
            }
        }
    }

    Ok(())
}
