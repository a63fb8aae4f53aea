//! Dismiss actions.

use serde::{Deserialize, Serialize};

fn default_wait_millis() -> u64 {
    1_000
}

/// One step of a pattern's dismiss sequence.
///
/// Actions run in order against the element the driver located for the
/// pattern. Drivers match on the variant to decide how to perform it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DismissAction {
    /// Click the element. `force` skips actionability checks where supported.
    Click {
        #[serde(default)]
        force: bool,
    },
    /// Replace the element's value.
    Fill { value: String },
    /// Press a key (e.g. `Escape`) with the element focused.
    Keypress { key: String },
    /// Pause before the next action.
    Wait {
        #[serde(default = "default_wait_millis")]
        millis: u64,
    },
    /// Evaluate a script with the element bound as its argument.
    Script { source: String },
}

impl DismissAction {
    /// A plain click.
    pub fn click() -> Self {
        Self::Click { force: false }
    }

    /// Action kind name as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::Fill { .. } => "fill",
            Self::Keypress { .. } => "keypress",
            Self::Wait { .. } => "wait",
            Self::Script { .. } => "script",
        }
    }
}
