//! Permission matrix command.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use warden_auth::rbac::MatrixEntry;
use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_core::types::OrgUnitId;

use crate::output::{self, OutputFormat};

/// Arguments for the matrix command
#[derive(Debug, Args)]
pub struct MatrixArgs {
    /// Username
    pub username: String,
    /// Organizational unit to build the matrix for
    #[arg(short, long)]
    pub scope: Option<OrgUnitId>,
    /// Show one role's section instead of the flat list
    #[arg(short, long)]
    pub role: Option<String>,
}

/// Matrix display row for table output
#[derive(Debug, Serialize, Tabled)]
struct MatrixRow {
    /// Resource
    resource: String,
    /// Action code
    action: String,
    /// Display name
    name: String,
    /// Granted by role
    via_role: String,
    /// Override type
    #[tabled(rename = "override")]
    override_type: String,
    /// Final answer
    effective: String,
    /// Override note
    note: String,
    /// Override author
    by: String,
}

impl From<&MatrixEntry> for MatrixRow {
    fn from(entry: &MatrixEntry) -> Self {
        Self {
            resource: entry.resource.clone(),
            action: entry.action_code.clone(),
            name: entry.action_name.clone(),
            via_role: output::flag(entry.via_role).to_string(),
            override_type: entry
                .override_type
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string()),
            effective: if entry.effective { "ALLOW" } else { "deny" }.to_string(),
            note: entry.note.clone().unwrap_or_default(),
            by: entry.granted_by_name.clone().unwrap_or_default(),
        }
    }
}

/// Execute the matrix command
pub async fn execute(
    args: &MatrixArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let engine = super::connect_engine(config).await?;
    let user = super::find_user(&engine, &args.username).await?;
    let matrix = engine.build_permission_matrix(user.id, args.scope).await?;

    let entries: &[MatrixEntry] = match &args.role {
        Some(role) => matrix.permissions_by_role.get(role).ok_or_else(|| {
            AppError::not_found(format!(
                "{} does not hold role '{role}' at this scope",
                user.username
            ))
        })?,
        None => &matrix.permissions,
    };

    if format == OutputFormat::Json {
        if args.role.is_some() {
            output::print_json(entries);
        } else {
            output::print_json(&matrix);
        }
        return Ok(());
    }

    println!("Permission matrix for {}", matrix.principal.label());
    let roles: Vec<String> = matrix
        .roles
        .iter()
        .map(|r| match r.org_unit_id {
            Some(unit) => format!("{}@{unit}", r.role_name),
            None => r.role_name.clone(),
        })
        .collect();
    output::print_kv(
        "Roles",
        if roles.is_empty() {
            "(none)".to_string()
        } else {
            roles.join(", ")
        }
        .as_str(),
    );
    output::print_kv(
        "Effective",
        &format!(
            "{} of {}",
            matrix.summary.effective_count, matrix.summary.total_actions
        ),
    );
    output::print_kv(
        "Overrides",
        &format!(
            "{} ({} grant, {} revoke)",
            matrix.summary.override_count,
            matrix.summary.granted_count,
            matrix.summary.revoked_count
        ),
    );
    println!();

    let rows: Vec<MatrixRow> = entries.iter().map(MatrixRow::from).collect();
    output::print_list(&rows, format);
    Ok(())
}
