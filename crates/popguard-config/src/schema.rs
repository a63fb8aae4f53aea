//! Configuration schema definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub domains: DomainsConfig,
}

/// Resolution engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// When false, every pass returns immediately with no results.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Pattern file location. Supports `~` expansion.
    #[serde(default = "default_patterns_path")]
    pub patterns_path: String,

    /// Install the built-in patterns when the loaded store is empty.
    #[serde(default = "default_true")]
    pub install_defaults: bool,

    /// Save the pattern file after every add/remove.
    #[serde(default = "default_true")]
    pub autosave: bool,

    /// Upper bound for one element lookup.
    #[serde(default = "default_find_timeout_ms")]
    pub find_timeout_ms: u64,

    /// Upper bound for one dismiss action.
    #[serde(default = "default_action_timeout_ms")]
    pub action_timeout_ms: u64,
}

fn default_patterns_path() -> String {
    "~/.popguard/patterns.json".to_string()
}

fn default_find_timeout_ms() -> u64 {
    3_000
}

fn default_action_timeout_ms() -> u64 {
    5_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns_path: default_patterns_path(),
            install_defaults: true,
            autosave: true,
            find_timeout_ms: default_find_timeout_ms(),
            action_timeout_ms: default_action_timeout_ms(),
        }
    }
}

impl EngineConfig {
    /// Pattern file path with `~` expanded.
    pub fn resolved_patterns_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.patterns_path).to_string())
    }

    pub fn find_timeout(&self) -> Duration {
        Duration::from_millis(self.find_timeout_ms)
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }
}

/// Host allow/deny lists.
///
/// Entries are exact hostnames or `*.suffix` wildcards. Deny wins over allow;
/// an empty allow list allows every host that is not denied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainsConfig {
    #[serde(default)]
    pub allow: Vec<String>,

    #[serde(default)]
    pub deny: Vec<String>,
}

/// Default home directory for PopGuard state.
pub fn popguard_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".popguard")
}
