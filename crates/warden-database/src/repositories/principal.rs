//! Principal (user account) repository.

use sqlx::PgPool;

use warden_core::result::AppResult;
use warden_core::types::UserId;
use warden_entity::principal::Principal;

use crate::error::db_error;

/// Repository for the `users` table.
#[derive(Debug, Clone)]
pub struct PrincipalRepository {
    pool: PgPool,
}

impl PrincipalRepository {
    /// Create a new principal repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a principal by ID.
    pub async fn find_by_id(&self, id: UserId) -> AppResult<Option<Principal>> {
        sqlx::query_as::<_, Principal>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find principal", e))
    }

    /// Find a principal by username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<Principal>> {
        sqlx::query_as::<_, Principal>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find principal", e))
    }

    /// Insert a new principal.
    pub async fn create(&self, principal: &Principal) -> AppResult<Principal> {
        sqlx::query_as::<_, Principal>(
            "INSERT INTO users (id, username, display_name, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(principal.id)
        .bind(&principal.username)
        .bind(&principal.display_name)
        .bind(principal.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(&format!("Failed to create principal '{}'", principal.username), e))
    }
}
