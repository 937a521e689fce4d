//! Database migration command.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_database::migration::MigrationReport;

use crate::output::{self, OutputFormat};

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Report applied and pending migrations without changing the schema
    #[arg(long)]
    pub check: bool,
}

/// Migration display row
#[derive(Debug, Serialize, Tabled)]
struct MigrationRow {
    /// Version
    version: i64,
    /// Description
    description: String,
    /// Status
    status: &'static str,
}

/// Execute the migrate command
pub async fn execute(
    args: &MigrateArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let db = super::connect_db(config).await?;

    if args.check {
        let report = db.migration_status().await?;
        print_report(&report, format);
        if !report.is_current() {
            output::print_warning(&format!(
                "{} migration(s) pending; run `warden migrate`",
                report.pending().count()
            ));
        }
        return Ok(());
    }

    let applied = db.migrate().await?;
    if applied == 0 {
        output::print_success("Schema already current.");
    } else {
        output::print_success(&format!("Applied {applied} migration(s)."));
    }
    Ok(())
}

fn print_report(report: &MigrationReport, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_json(report);
        return;
    }
    let rows: Vec<MigrationRow> = report
        .migrations
        .iter()
        .map(|m| MigrationRow {
            version: m.version,
            description: m.description.clone(),
            status: if m.applied { "applied" } else { "pending" },
        })
        .collect();
    output::print_list(&rows, format);
}
