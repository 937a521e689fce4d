//! Single override commands: grant, revoke, reset.

use clap::Args;

use warden_auth::OverrideOutcome;
use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_entity::action::ActionRef;

use crate::output::{self, OutputFormat};

/// Arguments for grant and revoke
#[derive(Debug, Args)]
pub struct OverrideArgs {
    /// Username
    pub username: String,
    /// Action as `resource:ACTION` or catalog id
    pub action: ActionRef,
    /// Acting administrator's username
    #[arg(long)]
    pub by: String,
    /// Reason recorded with the override
    #[arg(short, long)]
    pub note: Option<String>,
}

/// Arguments for reset
#[derive(Debug, Args)]
pub struct ResetArgs {
    /// Username
    pub username: String,
    /// Action as `resource:ACTION` or catalog id
    pub action: ActionRef,
    /// Acting administrator's username
    #[arg(long)]
    pub by: String,
}

/// Execute grant (`granted = true`) or revoke
pub async fn execute_grant(
    args: &OverrideArgs,
    granted: bool,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::connect_engine(config).await?;
    let user = super::find_user(&engine, &args.username).await?;
    let admin = super::find_user(&engine, &args.by).await?;

    let outcome = if granted {
        engine
            .overrides()
            .grant(user.id, &args.action, admin.id, args.note.clone())
            .await?
    } else {
        engine
            .overrides()
            .revoke(user.id, &args.action, admin.id, args.note.clone())
            .await?
    };

    print_outcome(&outcome, format);
    Ok(())
}

/// Execute reset
pub async fn execute_reset(
    args: &ResetArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::connect_engine(config).await?;
    let user = super::find_user(&engine, &args.username).await?;
    let admin = super::find_user(&engine, &args.by).await?;

    let outcome = engine
        .overrides()
        .reset(user.id, &args.action, admin.id)
        .await?;

    print_outcome(&outcome, format);
    Ok(())
}

fn print_outcome(outcome: &OverrideOutcome, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(outcome),
        OutputFormat::Table => {
            if outcome.action_taken.is_mutation() {
                output::print_success(&outcome.message);
            } else {
                output::print_warning(&outcome.message);
            }
            output::print_kv("Action taken", outcome.action_taken.as_str());
        }
    }
}
