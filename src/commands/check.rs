//! Permission check commands.

use clap::Args;
use serde_json::json;

use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_core::types::OrgUnitId;
use warden_entity::action::ActionKey;

use crate::output::{self, OutputFormat};

/// Arguments for the check command
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Username
    pub username: String,
    /// Action as `resource:ACTION`
    pub action: ActionKey,
    /// Organizational unit to check against
    #[arg(short, long)]
    pub scope: Option<OrgUnitId>,
}

/// Arguments for the actions command
#[derive(Debug, Args)]
pub struct ActionsArgs {
    /// Username
    pub username: String,
    /// Resource name
    pub resource: String,
    /// Organizational unit to check against
    #[arg(short, long)]
    pub scope: Option<OrgUnitId>,
}

/// Execute the check command
pub async fn execute_check(
    args: &CheckArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::connect_engine(config).await?;
    let user = super::find_user(&engine, &args.username).await?;
    let decision = engine
        .resolver()
        .resolve_key(user.id, &args.action, args.scope)
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&json!({
            "username": user.username,
            "action": args.action,
            "scope": args.scope,
            "granted": decision.granted,
            "source": decision.source,
        })),
        OutputFormat::Table => {
            let verdict = if decision.granted { "ALLOW" } else { "DENY" };
            println!("{verdict}  {} {}", user.username, args.action);
            output::print_kv("Decided by", &format!("{:?}", decision.source));
        }
    }
    Ok(())
}

/// Execute the actions command
pub async fn execute_actions(
    args: &ActionsArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::connect_engine(config).await?;
    let user = super::find_user(&engine, &args.username).await?;
    let codes = engine
        .get_effective_actions(user.id, &args.resource, args.scope)
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&codes),
        OutputFormat::Table => {
            if codes.is_empty() {
                output::print_warning(&format!(
                    "{} may not perform any '{}' action",
                    user.username, args.resource
                ));
            } else {
                for code in codes {
                    println!("  {code}");
                }
            }
        }
    }
    Ok(())
}
