//! Mapping from `sqlx` failures to [`AppError`].

use warden_core::error::{AppError, ErrorKind};

/// Wrap a sqlx error, turning unique-constraint violations into conflicts.
pub fn db_error(context: &str, err: sqlx::Error) -> AppError {
    let unique_violation = err
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);

    if unique_violation {
        AppError::with_source(ErrorKind::Conflict, format!("{context}: already exists"), err)
    } else {
        AppError::with_source(ErrorKind::Database, context.to_string(), err)
    }
}
