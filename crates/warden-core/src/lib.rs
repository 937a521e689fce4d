//! # warden-core
//!
//! Core crate for Warden. Contains the unified error system, typed
//! identifiers for every permission entity, and the configuration schemas.
//!
//! This crate has **no** internal dependencies on other Warden crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
