//! CLI command definitions and dispatch.

pub mod action;
pub mod apply;
pub mod audit;
pub mod check;
pub mod matrix;
pub mod migrate;
pub mod overrides;
pub mod role;
pub mod seed;

use clap::{Parser, Subcommand};

use warden_auth::{PermissionEngine, PermissionStores};
use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_database::DatabasePool;
use warden_entity::principal::Principal;

use crate::output::OutputFormat;

/// Warden: permission resolution and override administration
#[derive(Debug, Parser)]
#[command(name = "warden", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "WARDEN_CONFIG", default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay loaded from config/{env}.toml
    #[arg(long, env = "WARDEN_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Apply a JSON permission seed
    Seed(seed::SeedArgs),
    /// Check one permission for a user
    Check(check::CheckArgs),
    /// List the action codes a user may perform on a resource
    Actions(check::ActionsArgs),
    /// Show a user's permission matrix
    Matrix(matrix::MatrixArgs),
    /// Grant an action to a user via an override
    Grant(overrides::OverrideArgs),
    /// Revoke an action from a user via an override
    Revoke(overrides::OverrideArgs),
    /// Delete a user's override so role grants apply again
    Reset(overrides::ResetArgs),
    /// Apply a desired-state change file to a user
    Apply(apply::ApplyArgs),
    /// Role management
    Role(role::RoleArgs),
    /// Action catalog management
    Action(action::ActionArgs),
    /// Audit log for a user
    Audit(audit::AuditArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config, self.format).await,
            Commands::Seed(args) => seed::execute(args, &config, self.format).await,
            Commands::Check(args) => check::execute_check(args, &config, self.format).await,
            Commands::Actions(args) => check::execute_actions(args, &config, self.format).await,
            Commands::Matrix(args) => matrix::execute(args, &config, self.format).await,
            Commands::Grant(args) => {
                overrides::execute_grant(args, true, &config, self.format).await
            }
            Commands::Revoke(args) => {
                overrides::execute_grant(args, false, &config, self.format).await
            }
            Commands::Reset(args) => overrides::execute_reset(args, &config, self.format).await,
            Commands::Apply(args) => apply::execute(args, &config, self.format).await,
            Commands::Role(args) => role::execute(args, &config, self.format).await,
            Commands::Action(args) => action::execute(args, &config, self.format).await,
            Commands::Audit(args) => audit::execute(args, &config, self.format).await,
        }
    }
}

/// Helper: connect to the database
pub async fn connect_db(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: build an engine over the PostgreSQL stores
pub async fn connect_engine(config: &AppConfig) -> Result<PermissionEngine, AppError> {
    let db = connect_db(config).await?;
    Ok(PermissionEngine::new(
        PermissionStores::postgres(&db),
        config.engine.clone(),
    ))
}

/// Helper: resolve a username to a principal
pub async fn find_user(engine: &PermissionEngine, username: &str) -> Result<Principal, AppError> {
    engine
        .stores()
        .principals
        .require_username(username)
        .await
}
