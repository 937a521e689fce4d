//! Audit log command.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use warden_core::config::AppConfig;
use warden_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for the audit command
#[derive(Debug, Args)]
pub struct AuditArgs {
    /// Username whose permission history to show
    pub username: String,
    /// Maximum number of entries
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}

/// Audit display row
#[derive(Debug, Serialize, Tabled)]
struct AuditRow {
    /// When
    at: String,
    /// Event
    event: String,
    /// Actor
    actor: String,
    /// Details
    details: String,
}

/// Execute the audit command
pub async fn execute(
    args: &AuditArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::connect_engine(config).await?;
    let user = super::find_user(&engine, &args.username).await?;
    let entries = engine
        .stores()
        .audit
        .list_for_target(user.id.into_uuid(), args.limit)
        .await?;

    if format == OutputFormat::Json {
        output::print_json(&entries);
        return Ok(());
    }

    let mut rows = Vec::with_capacity(entries.len());
    for entry in &entries {
        let actor = engine
            .stores()
            .principals
            .find(entry.actor_id)
            .await?
            .map(|p| p.username)
            .unwrap_or_else(|| entry.actor_id.to_string());
        rows.push(AuditRow {
            at: output::timestamp(&entry.created_at),
            event: entry.action.clone(),
            actor,
            details: entry
                .details
                .as_ref()
                .map(|d| d.to_string())
                .unwrap_or_default(),
        });
    }
    output::print_list(&rows, format);
    Ok(())
}
