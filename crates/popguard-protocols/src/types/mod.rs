//! Data types shared by the engine, its drivers and its callers.

mod action;
mod interruption;
mod pattern;
mod result;

pub use action::*;
pub use interruption::*;
pub use pattern::*;
pub use result::*;
