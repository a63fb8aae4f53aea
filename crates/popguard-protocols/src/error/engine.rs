//! Errors surfaced to engine callers.

use thiserror::Error;

/// Call failures returned by the exposed engine operations.
///
/// Driver and persistence failures never appear here; they are absorbed
/// and logged so the hosting automation task keeps making progress.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Interruption engine is not initialized")]
    NotInitialized,

    #[error("Precondition failed: {0}")]
    Precondition(String),
}
