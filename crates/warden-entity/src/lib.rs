//! # warden-entity
//!
//! Entity models for the Warden permission engine. Every struct in this
//! crate represents a store row or a value object passed across the store
//! traits. Row types additionally derive `sqlx::FromRow`.

pub mod action;
pub mod audit;
pub mod principal;
pub mod role;
pub mod user_override;
