//! Models command - manage the emotion classifier artifacts.

use std::path::PathBuf;

use anyhow::Result;
use attentive_adapters::models::install;
use attentive_adapters::{verify_checksum, ModelStore};
use clap::{Args, Subcommand};

use super::ExitCode;
use crate::config::AppConfig;

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// List the artifacts and whether they are installed
    List,
    /// Print model directory path
    Path,
    /// Check that the classifier loads (and matches its configured checksum)
    Verify,
    /// Copy trained artifacts into the models directory
    Install {
        /// Classifier weights (safetensors)
        #[arg(value_name = "WEIGHTS")]
        classifier: PathBuf,
        /// Label encoder (JSON)
        #[arg(value_name = "LABELS")]
        labels: PathBuf,
    },
}

/// Run the models command.
///
/// # Errors
///
/// Returns an error if an install fails or a verified artifact is unreadable.
pub fn run(args: &ModelsArgs, config: &AppConfig) -> Result<ExitCode> {
    let store = store(args, config);
    match &args.command {
        ModelsCommand::List => {
            list_models(&store);
            Ok(ExitCode::Success)
        }
        ModelsCommand::Path => {
            println!("{}", store.dir().display());
            Ok(ExitCode::Success)
        }
        ModelsCommand::Verify => verify(&store, config.models.classifier_sha256.as_deref()),
        ModelsCommand::Install { classifier, labels } => {
            install(&store, classifier, labels)?;
            println!("Installed models to {}", store.dir().display());
            Ok(ExitCode::Success)
        }
    }
}

fn store(args: &ModelsArgs, config: &AppConfig) -> ModelStore {
    let dir = args.models_dir.clone().or_else(|| config.models.dir.clone());
    let mut store = dir.map_or_else(ModelStore::default, ModelStore::new);
    if let Some(ref path) = config.models.classifier {
        store = store.with_classifier(path);
    }
    if let Some(ref path) = config.models.labels {
        store = store.with_labels(path);
    }
    store
}

fn list_models(store: &ModelStore) {
    let artifacts = store.list();

    println!("Models directory: {}", store.dir().display());
    println!();

    for artifact in &artifacts {
        let status = if artifact.installed { "✓" } else { "✗" };
        println!("  {status} {} ({})", artifact.name, artifact.path.display());
    }

    println!();
    let installed_count = artifacts.iter().filter(|a| a.installed).count();
    println!("{}/{} artifacts installed", installed_count, artifacts.len());
}

fn verify(store: &ModelStore, expected_sha256: Option<&str>) -> Result<ExitCode> {
    if let Some(expected) = expected_sha256 {
        if let Err(e) = verify_checksum(&store.classifier_path(), expected) {
            eprintln!("✗ {e:#}");
            return Ok(ExitCode::FramesFailed);
        }
        println!("✓ checksum");
    }

    match store.load_classifier(false) {
        Ok(classifier) => {
            println!("✓ classifier ({} labels)", classifier.labels().len());
            Ok(ExitCode::Success)
        }
        Err(e) => {
            eprintln!("✗ {e:#}");
            Ok(ExitCode::FramesFailed)
        }
    }
}
