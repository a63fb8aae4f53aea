//! Automation driver errors.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    /// The action ran but did not succeed.
    #[error("Action failed: {0}")]
    ActionFailed(String),

    #[error("Driver call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Page closed: {0}")]
    PageClosed(String),

    #[error("Unsupported action: {0}")]
    Unsupported(String),

    /// Transport or protocol level failure inside the driver.
    #[error("Driver protocol error: {0}")]
    Protocol(String),
}
