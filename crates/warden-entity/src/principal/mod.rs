//! Principals (user accounts) known to the engine.

pub mod model;

pub use model::Principal;
