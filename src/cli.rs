//! CLI definitions for PopGuard.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use popguard_protocols::InterruptionType;

/// PopGuard CLI.
#[derive(Parser)]
#[command(name = "popguard")]
#[command(about = "Rule-based interruption resolution for browser automation")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "~/.popguard/config.toml", global = true, env = "POPGUARD_CONFIG")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// List stored patterns
    List {
        /// Filter by interruption type
        #[arg(long = "type")]
        interruption_type: Option<InterruptionType>,

        /// Filter by host (includes global patterns)
        #[arg(long)]
        domain: Option<String>,

        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show one pattern in full
    Show {
        /// Pattern ID
        id: String,
    },

    /// Add or replace a pattern from a JSON record file
    Add {
        /// File holding one pattern record
        file: PathBuf,
    },

    /// Remove a pattern
    Remove {
        /// Pattern ID
        id: String,
    },

    /// Merge patterns from another pattern file
    Import {
        /// Pattern file to import
        file: PathBuf,
    },

    /// Write every pattern to a file
    Export {
        /// Destination file
        file: PathBuf,
    },

    /// Show the patterns a pass on URL would attempt, in order
    Candidates {
        /// Page URL
        url: String,

        /// Restrict to these interruption types
        #[arg(long = "type")]
        types: Vec<InterruptionType>,
    },

    /// Show per-pattern statistics
    Stats {
        /// Only this pattern
        id: Option<String>,

        /// Drop the statistics instead of showing them
        #[arg(long)]
        reset: bool,
    },

    /// Validate the configuration and the pattern file
    Validate,
}
