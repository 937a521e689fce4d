//! Seed command.

use clap::Args;

use warden_auth::PermissionSeed;
use warden_core::config::AppConfig;
use warden_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for the seed command
#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Seed file (defaults to `engine.seed_file`)
    pub file: Option<String>,
}

/// Execute the seed command
pub async fn execute(
    args: &SeedArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let path = args
        .file
        .clone()
        .or_else(|| config.engine.seed_file.clone())
        .ok_or_else(|| AppError::validation("No seed file given and engine.seed_file is unset"))?;

    let seed = PermissionSeed::from_file(&path).await?;
    let engine = super::connect_engine(config).await?;
    let report = engine.seed(&seed).await?;

    match format {
        OutputFormat::Json => output::print_json(&report),
        OutputFormat::Table => {
            output::print_success(&format!("Seed '{path}' applied"));
            output::print_kv("Actions created", &report.actions_created.to_string());
            output::print_kv("Roles created", &report.roles_created.to_string());
            output::print_kv("Grants created", &report.grants_created.to_string());
            output::print_kv("Users created", &report.principals_created.to_string());
            output::print_kv("Assignments created", &report.assignments_created.to_string());
        }
    }
    Ok(())
}
