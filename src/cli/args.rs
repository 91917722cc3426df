//! Command-line argument parsing for driftwatch
//!
//! Clap-based CLI with subcommands and verbosity control. The binary is
//! designed to be invoked once per scheduled run.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Driftwatch - detect query drift and trigger adaptive retraining
#[derive(Parser, Debug)]
#[command(name = "driftwatch")]
#[command(version = "0.3.0")]
#[command(about = "Detect semantic drift in live RAG queries and trigger retraining", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except the run summary)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one full pipeline run
    Run,

    /// Run only the detection stages and report the band and drift events
    Detect,

    /// Display the effective configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose == 0 {
            Verbosity::Normal
        } else {
            Verbosity::Verbose
        }
    }
}

impl Verbosity {
    /// Tracing filter directive for this level
    pub fn filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "driftwatch=warn",
            Verbosity::Normal => "driftwatch=info",
            Verbosity::Verbose => "driftwatch=debug",
        }
    }

    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}
