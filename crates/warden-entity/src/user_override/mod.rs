//! Per-principal action overrides.

pub mod model;

pub use model::{OverrideType, UpsertOverride, UserActionOverride};
