//! CLI command definitions and handlers.

pub mod check;
pub mod models;

use clap::{Parser, Subcommand};

/// Selfie Gate - Client-side quality gate for captured selfies
#[derive(Parser)]
#[command(name = "selfie-gate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared check arguments (paths, timeouts, flags).
    #[command(flatten)]
    pub check: check::CheckArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Check photos against the quality gate
    Check(check::CheckArgs),
    /// Manage the face detection model
    Models(models::ModelsArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every photo was accepted.
    Success = 0,
    /// At least one photo was rejected or could not be read.
    Rejected = 1,
    /// The command itself failed.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
