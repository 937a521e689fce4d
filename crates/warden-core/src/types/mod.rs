//! Shared value types.

pub mod id;

pub use id::{ActionId, AuditLogId, OrgUnitId, OverrideId, RoleAssignmentId, RoleId, UserId};
