//! Error types for the PopGuard protocol layer.

mod driver;
mod engine;
mod persistence;

pub use driver::*;
pub use engine::*;
pub use persistence::*;
