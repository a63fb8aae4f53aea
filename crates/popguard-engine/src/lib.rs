//! # PopGuard Engine
//!
//! Detects and dismisses transient UI obstructions (cookie banners, ads,
//! popups, consent dialogs, ...) during unattended browser automation.
//!
//! ## Architecture
//!
//! ```text
//! caller ──handle()──► InterruptionService ──► ResolutionEngine
//!                                                 │        │
//!                                   PatternStore ◄┘        └─► AutomationDriver
//!                                  (+ PatternIndex)            (find / act)
//! ```
//!
//! One [`ResolutionEngine::handle`] call is one resolution pass: candidates are
//! selected by type and domain, attempted in priority order, and every pattern
//! that completes its action sequence is recorded in the engine's
//! [`HandledSet`] so later passes skip it.

pub mod defaults;
pub mod domain;
mod handled;
pub mod learn;
mod resolver;
mod service;
mod stats;
pub mod store;

pub use domain::{DomainFilter, host_of};
pub use handled::{HandledSet, Reservation};
pub use learn::{RecordedStep, learn_pattern};
pub use resolver::{EngineSettings, ResolutionEngine};
pub use service::{InterruptionService, PatternInput};
pub use stats::{PatternStats, StatsRecorder, stats_path};
pub use store::{DecodeDiagnostic, LoadReport, PatternIndex, PatternStore};

pub use tokio_util::sync::CancellationToken;
