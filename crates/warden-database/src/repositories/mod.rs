//! Repository implementations for the permission tables.

pub mod action;
pub mod audit;
pub mod principal;
pub mod role;
pub mod role_assignment;
pub mod user_override;

pub use action::ActionRepository;
pub use audit::AuditLogRepository;
pub use principal::PrincipalRepository;
pub use role::RoleRepository;
pub use role_assignment::RoleAssignmentRepository;
pub use user_override::OverrideRepository;
