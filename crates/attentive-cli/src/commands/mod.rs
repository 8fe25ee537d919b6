//! CLI command definitions and handlers.

pub mod models;
pub mod process;

use clap::{Parser, Subcommand};

/// Attentive - replay landmark recordings through the attention pipeline
#[derive(Parser)]
#[command(name = "attentive")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared process arguments (recordings, tuning, output).
    #[command(flatten)]
    pub process: process::ProcessArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Replay recordings and emit one result per frame
    Process(process::ProcessArgs),
    /// Manage the emotion model artifacts
    Models(models::ModelsArgs),
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every frame processed cleanly.
    Success,
    /// Some frames were unreadable or failed analysis.
    FramesFailed,
    /// Fatal error before or during the run.
    Error,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        match code {
            ExitCode::Success => Self::SUCCESS,
            ExitCode::FramesFailed => Self::from(1),
            ExitCode::Error => Self::from(2),
        }
    }
}
