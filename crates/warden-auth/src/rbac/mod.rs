//! Role-based permission resolution with per-principal overrides.
//!
//! Resolution order:
//! 1. Unknown or inactive action: deny.
//! 2. An override for `(principal, action)` decides outright.
//! 3. Otherwise the OR of every applicable role's grant.

pub mod batch;
pub mod matrix;
pub mod overrides;
pub mod precedence;
pub mod resolver;
pub mod roles;

pub use batch::{BatchApplier, BatchOutcome, ChangeResult, PermissionChange};
pub use matrix::{MatrixBuilder, MatrixEntry, MatrixSummary, PermissionMatrix};
pub use overrides::{ActionTaken, OverrideManager, OverrideOutcome};
pub use precedence::{Decision, DecisionSource};
pub use resolver::{ActionState, PermissionResolver};
pub use roles::RoleManager;

#[cfg(test)]
pub(crate) mod fixture;
