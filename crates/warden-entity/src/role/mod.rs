//! Roles, role grants, and role assignments.

pub mod assignment;
pub mod grant;
pub mod model;

pub use assignment::{AssignedRole, ScopeFilter};
pub use grant::RoleGrant;
pub use model::Role;
