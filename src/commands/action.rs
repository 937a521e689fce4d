//! Action catalog commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_core::types::OrgUnitId;
use warden_entity::action::{Action, ActionKey, ActionRef, NewAction};

use crate::output::{self, OutputFormat};

/// Arguments for action commands
#[derive(Debug, Args)]
pub struct ActionArgs {
    /// Action subcommand
    #[command(subcommand)]
    pub command: ActionCommand,
}

/// Action subcommands
#[derive(Debug, Subcommand)]
pub enum ActionCommand {
    /// List the catalog
    List {
        /// Include inactive actions
        #[arg(short, long)]
        all: bool,
    },
    /// Register an action
    Create {
        /// Action as `resource:ACTION`
        action: ActionKey,
        /// Display name (defaults to the action code)
        #[arg(short, long)]
        name: Option<String>,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
        /// Acting administrator's username
        #[arg(long)]
        by: String,
    },
    /// Deactivate an action; it will deny for everyone
    Deactivate {
        /// Action as `resource:ACTION` or catalog id
        action: ActionRef,
        /// Acting administrator's username
        #[arg(long)]
        by: String,
    },
    /// Reactivate an action
    Activate {
        /// Action as `resource:ACTION` or catalog id
        action: ActionRef,
        /// Acting administrator's username
        #[arg(long)]
        by: String,
    },
    /// Active actions a user's roles confer, ignoring overrides
    Available {
        /// Username
        username: String,
        /// Organizational unit
        #[arg(short, long)]
        scope: Option<OrgUnitId>,
    },
}

/// Action display row
#[derive(Debug, Serialize, Tabled)]
struct ActionRow {
    /// Catalog id
    id: String,
    /// `resource:ACTION`
    action: String,
    /// Display name
    name: String,
    /// Active flag
    active: String,
    /// Last change
    updated_at: String,
}

/// Print catalog actions in the selected format
pub fn print_actions(actions: &[Action], format: OutputFormat) {
    let rows: Vec<ActionRow> = actions
        .iter()
        .map(|a| ActionRow {
            id: a.id.to_string(),
            action: a.identity(),
            name: a.action_name.clone(),
            active: output::flag(a.is_active).to_string(),
            updated_at: output::timestamp(&a.updated_at),
        })
        .collect();
    output::print_list(&rows, format);
}

/// Execute action commands
pub async fn execute(
    args: &ActionArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::connect_engine(config).await?;
    let roles = engine.roles();

    match &args.command {
        ActionCommand::List { all } => {
            let actions = roles.list_actions(*all).await?;
            print_actions(&actions, format);
        }
        ActionCommand::Create {
            action,
            name,
            description,
            by,
        } => {
            let admin = super::find_user(&engine, by).await?;
            let name = name
                .clone()
                .unwrap_or_else(|| action.action_code().to_string());
            let mut new_action = NewAction::new(action.clone(), name);
            new_action.description = description.clone();
            let created = roles.create_action(new_action, admin.id).await?;
            output::print_success(&format!("Action '{}' registered", created.identity()));
        }
        ActionCommand::Deactivate { action, by } => {
            let admin = super::find_user(&engine, by).await?;
            let updated = roles.set_action_active(action, false, admin.id).await?;
            output::print_success(&format!("Action '{}' deactivated", updated.identity()));
        }
        ActionCommand::Activate { action, by } => {
            let admin = super::find_user(&engine, by).await?;
            let updated = roles.set_action_active(action, true, admin.id).await?;
            output::print_success(&format!("Action '{}' activated", updated.identity()));
        }
        ActionCommand::Available { username, scope } => {
            let user = super::find_user(&engine, username).await?;
            let actions = roles.available_actions(user.id, *scope).await?;
            print_actions(&actions, format);
        }
    }

    Ok(())
}
