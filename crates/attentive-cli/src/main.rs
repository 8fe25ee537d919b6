//! Attentive CLI - learner attention analysis over landmark recordings.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::process::ProcessArgs;
use commands::{Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();

    let exit_code = match cli.command {
        Some(Commands::Process(args)) => process(args, &config),
        Some(Commands::Models(ref args)) => match commands::models::run(args, &config) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("error: {e:#}");
                ExitCode::Error
            }
        },
        None => {
            if cli.process.recordings.is_empty() {
                eprintln!("error: No recordings specified. Use --help for usage information.");
                return ExitCode::Error.into();
            }
            process(cli.process, &config)
        }
    };

    exit_code.into()
}

fn process(args: ProcessArgs, config: &AppConfig) -> ExitCode {
    let args = ProcessArgs::with_config(args, config);
    match commands::process::run(&args) {
        Ok(outcome) => outcome.exit_code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    }
}
