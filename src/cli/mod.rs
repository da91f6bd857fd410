//! CLI argument definitions for Derrick.

use clap::{Parser, Subcommand};

/// Derrick - status aggregation for multi-agent work orchestration.
///
/// All commands read from the same cached snapshot; polling is cheap.
#[derive(Parser, Debug)]
#[command(name = "dk")]
#[command(author, version, about = "Status aggregation engine for agent work orchestration", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Run as if dk was started in <path> instead of the current directory.
    /// Can also be set via DK_WORKDIR environment variable.
    #[arg(short = 'C', long = "workdir", global = true, env = "DK_WORKDIR")]
    pub workdir: Option<std::path::PathBuf>,

    /// Explicit config file. Can also be set via DK_CONFIG.
    #[arg(long = "config", global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Full aggregated snapshot: issues, rigs, agents, convoys
    Snapshot,

    /// Issues-only view
    Issues,

    /// Agents-only view, optionally filtered by role
    Agents {
        /// Role filter: polecat, witness, or refinery
        #[arg(long)]
        role: Option<String>,
    },

    /// Convoys-only view
    Convoys,

    /// Rigs-only view
    Rigs,

    /// Reduce a tmux pane capture to an activity summary
    Activity {
        /// tmux target (session:window.pane)
        target: String,
    },
}
