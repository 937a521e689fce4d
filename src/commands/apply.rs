//! Batch apply command.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use warden_auth::PermissionChange;
use warden_core::config::AppConfig;
use warden_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for the apply command
#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Username
    pub username: String,
    /// JSON file holding `[{"action": ..., "desired_effective": ..., "note": ...}]`
    #[arg(long)]
    pub file: String,
    /// Acting administrator's username
    #[arg(long)]
    pub by: String,
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Per-item display row
#[derive(Debug, Serialize, Tabled)]
struct ChangeRow {
    /// Requested action
    action: String,
    /// Outcome
    result: String,
    /// What was written
    taken: String,
    /// Message
    message: String,
}

/// Execute the apply command
pub async fn execute(
    args: &ApplyArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let text = tokio::fs::read_to_string(&args.file).await?;
    let changes: Vec<PermissionChange> = serde_json::from_str(&text)?;

    let engine = super::connect_engine(config).await?;
    let user = super::find_user(&engine, &args.username).await?;
    let admin = super::find_user(&engine, &args.by).await?;

    if !args.yes {
        let confirm = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Apply {} permission change(s) to '{}' as '{}'?",
                changes.len(),
                user.username,
                admin.username
            ))
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let outcome = engine
        .apply_permission_changes(user.id, changes, admin.id)
        .await?;

    if format == OutputFormat::Json {
        output::print_json(&outcome);
        return Ok(());
    }

    let rows: Vec<ChangeRow> = outcome
        .changes
        .iter()
        .map(|c| ChangeRow {
            action: c.action.to_string(),
            result: if c.success { "ok" } else { "FAILED" }.to_string(),
            taken: c
                .action_taken
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string()),
            message: c.message.clone(),
        })
        .collect();
    output::print_list(&rows, format);

    let failed = outcome.failed();
    if failed == 0 {
        output::print_success(&format!("{} change(s) written", outcome.mutations()));
    } else {
        output::print_warning(&format!(
            "{} change(s) written, {failed} failed; earlier items were kept",
            outcome.mutations()
        ));
    }
    output::print_kv(
        "Effective now",
        &format!(
            "{} of {}",
            outcome.updated_matrix.summary.effective_count,
            outcome.updated_matrix.summary.total_actions
        ),
    );
    Ok(())
}
