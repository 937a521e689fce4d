//! # warden-database
//!
//! PostgreSQL connection management and one repository per permission
//! table. Repositories expose narrow queries; the store traits in
//! `warden-auth` are implemented on top of them.

pub mod connection;
pub mod error;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
