//! Action catalog entities.

pub mod key;
pub mod model;

pub use key::{ActionKey, ActionRef};
pub use model::{Action, NewAction};
