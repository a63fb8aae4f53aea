//! # PopGuard Protocols
//!
//! Core protocol definitions for the PopGuard interruption engine.
//! Contains only data types and interface definitions - no implementations.
//!
//! ## Core Types
//!
//! - [`Pattern`] - A named rule describing how to recognize and dismiss one interruption
//! - [`InterruptionType`] - Closed taxonomy used for indexing
//! - [`DismissAction`] - One step of a pattern's dismiss sequence
//! - [`ResolutionResult`] - Outcome of one resolution pass
//!
//! ## Core Traits
//!
//! - [`AutomationDriver`] - The only boundary between the engine and a live page

pub mod driver;
pub mod error;
pub mod types;

pub use driver::{AutomationDriver, ElementHandle, PageContext};
pub use error::{DriverError, EngineError, PersistenceError};
pub use types::*;
