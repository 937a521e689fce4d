//! # warden-auth
//!
//! Permission resolution and override administration for Warden.
//!
//! ## Modules
//!
//! - `store`: store traits, the in-memory backend, and PostgreSQL adapters
//! - `rbac`: resolver, permission matrix, override and role administration,
//!   batch application
//! - `seed`: idempotent JSON bootstrap of actions, roles, and principals
//! - `engine`: the [`PermissionEngine`] facade wiring everything together

pub mod engine;
pub mod rbac;
pub mod seed;
pub mod store;

pub use engine::PermissionEngine;
pub use rbac::{
    ActionState, ActionTaken, BatchApplier, BatchOutcome, ChangeResult, Decision, DecisionSource,
    MatrixBuilder, OverrideManager, OverrideOutcome, PermissionChange, PermissionMatrix,
    PermissionResolver, RoleManager,
};
pub use seed::{PermissionSeed, SeedReport};
pub use store::{MemoryPermissionStore, PermissionStores};
