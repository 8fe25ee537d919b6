//! Emotion model artifact store.
//!
//! The classifier ships as two files: safetensors weights and a JSON label
//! encoder. Both live in the models directory unless overridden.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use attentive_core::inference::{select_device, LinearEmotionClassifier};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Default classifier weights filename.
pub const CLASSIFIER_FILE: &str = "emotion_classifier.safetensors";
/// Default label encoder filename.
pub const LABELS_FILE: &str = "label_encoder.json";

/// Returns the default models directory.
///
/// Uses `XDG_DATA_HOME/attentive/models` or `~/.local/share/attentive/models`.
#[must_use]
pub fn models_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("attentive")
        .join("models")
}

/// One artifact and whether it is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStatus {
    /// Artifact name.
    pub name: &'static str,
    /// Resolved path.
    pub path: PathBuf,
    /// Whether the file exists.
    pub installed: bool,
}

/// Locations of the classifier artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStore {
    dir: PathBuf,
    classifier: Option<PathBuf>,
    labels: Option<PathBuf>,
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new(models_dir())
    }
}

impl ModelStore {
    /// Creates a store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            classifier: None,
            labels: None,
        }
    }

    /// Overrides the classifier weights path.
    #[must_use]
    pub fn with_classifier(mut self, path: impl Into<PathBuf>) -> Self {
        self.classifier = Some(path.into());
        self
    }

    /// Overrides the label encoder path.
    #[must_use]
    pub fn with_labels(mut self, path: impl Into<PathBuf>) -> Self {
        self.labels = Some(path.into());
        self
    }

    /// Models directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Classifier weights path.
    #[must_use]
    pub fn classifier_path(&self) -> PathBuf {
        self.classifier
            .clone()
            .unwrap_or_else(|| self.dir.join(CLASSIFIER_FILE))
    }

    /// Label encoder path.
    #[must_use]
    pub fn labels_path(&self) -> PathBuf {
        self.labels
            .clone()
            .unwrap_or_else(|| self.dir.join(LABELS_FILE))
    }

    /// Lists the artifacts with their status.
    #[must_use]
    pub fn list(&self) -> Vec<ArtifactStatus> {
        [
            ("classifier", self.classifier_path()),
            ("labels", self.labels_path()),
        ]
        .into_iter()
        .map(|(name, path)| ArtifactStatus {
            name,
            installed: path.is_file(),
            path,
        })
        .collect()
    }

    /// Checks if every artifact is present.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.list().iter().all(|a| a.installed)
    }

    /// Loads the classifier.
    ///
    /// # Errors
    ///
    /// Returns an error if an artifact is missing or invalid.
    pub fn load_classifier(&self, prefer_gpu: bool) -> Result<LinearEmotionClassifier> {
        let model = self.classifier_path();
        let labels = self.labels_path();
        for artifact in self.list() {
            if !artifact.installed {
                bail!(
                    "Missing {} artifact: {}. Place the trained model files in {} or run with --no-model.",
                    artifact.name,
                    artifact.path.display(),
                    self.dir.display()
                );
            }
        }
        LinearEmotionClassifier::load(&model, &labels, &select_device(prefer_gpu))
    }
}

/// Computes the lowercase hex SHA-256 of a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Verifies a file against an expected SHA-256.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its hash differs.
pub fn verify_checksum(path: &Path, expected: &str) -> Result<()> {
    let hash = sha256_file(path)?;
    if !hash.eq_ignore_ascii_case(expected.trim()) {
        bail!(
            "Checksum mismatch for {}: expected {}, got {}",
            path.display(),
            expected.trim(),
            hash
        );
    }
    debug!("Checksum verified for {}", path.display());
    Ok(())
}

/// Copies artifacts into the store's directory, creating it if needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or a copy fails.
pub fn install(store: &ModelStore, classifier: &Path, labels: &Path) -> Result<()> {
    fs::create_dir_all(store.dir()).context("Failed to create models directory")?;
    for (src, name) in [(classifier, CLASSIFIER_FILE), (labels, LABELS_FILE)] {
        let dest = store.dir().join(name);
        let bytes = fs::copy(src, &dest)
            .with_context(|| format!("Failed to copy {} to {}", src.display(), dest.display()))?;
        info!("Installed {} ({bytes} bytes)", dest.display());
    }
    Ok(())
}
