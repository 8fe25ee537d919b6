//! Configuration file support for attentive.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/attentive/config.toml` (lowest priority)
//! - Project-local: `.attentive.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

/// Project-local config filename.
pub const PROJECT_CONFIG: &str = ".attentive.toml";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Emotion smoothing.
    pub smoothing: SmoothingConfig,
    /// Face detector settings.
    pub detector: DetectorConfig,
    /// Gaze analysis.
    pub gaze: GazeConfig,
    /// Focus scoring.
    pub focus: FocusConfig,
    /// Low-light handling.
    pub lighting: LightingConfig,
    /// Sustained-attention tracking.
    pub attention: AttentionSettings,
    /// Model artifacts.
    pub models: ModelsConfig,
    /// Output formatting.
    pub output: OutputConfig,
}

/// Emotion smoothing configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Number of recent predictions voted over.
    pub window: Option<usize>,
}

/// Face detector configuration.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Faces below this confidence count as absent (0.0-1.0).
    pub min_detection_confidence: Option<f32>,
}

/// Gaze analysis configuration.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GazeConfig {
    /// Threshold profile: "streaming" or "desktop".
    pub profile: Option<String>,
    /// Longest eye closure still treated as a blink, in seconds.
    pub max_blink_duration: Option<f64>,
}

/// Focus scoring configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    /// Focus reduction when gaze is off-screen (0-100).
    pub unfocused_penalty: Option<u8>,
}

/// Low-light handling configuration.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Frames below this lighting quality are enhanced (0.0-1.0).
    pub enhance_below: Option<f64>,
}

/// Attention tracking configuration.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AttentionSettings {
    /// Continuous unfocused seconds before an alert.
    pub alert_after_secs: Option<f64>,
    /// Seconds between attention log entries.
    pub log_interval_secs: Option<f64>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
    /// Classifier weights path, overriding the models directory.
    pub classifier: Option<PathBuf>,
    /// Label encoder path, overriding the models directory.
    pub labels: Option<PathBuf>,
    /// Expected SHA-256 of the classifier weights.
    pub classifier_sha256: Option<String>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Missing files are silently ignored. Invalid values are reported as
    /// warnings and dropped.
    pub fn load() -> Self {
        let project = std::env::current_dir()
            .ok()
            .and_then(|cwd| find_config_in_parents(&cwd));
        Self::load_from(xdg_config_path().as_deref(), project.as_deref())
    }

    /// Layers the given files, later over earlier.
    pub fn load_from(xdg: Option<&Path>, project: Option<&Path>) -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = project {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(project_path) {
                config.merge(project_config);
            }
        }

        for problem in config.sanitize() {
            eprintln!("warning: {problem}");
        }

        config
    }

    /// Drops out-of-range values, returning one message per dropped value.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.smoothing.window == Some(0) {
            problems.push("smoothing.window must be at least 1, got 0".to_string());
            self.smoothing.window = None;
        }
        if let Some(c) = self.detector.min_detection_confidence {
            if !(0.0..=1.0).contains(&c) {
                problems.push(format!(
                    "detector.min_detection_confidence must be 0.0-1.0, got {c}"
                ));
                self.detector.min_detection_confidence = None;
            }
        }
        if let Some(ref p) = self.gaze.profile {
            if p != "streaming" && p != "desktop" {
                problems.push(format!(
                    "gaze.profile must be 'streaming' or 'desktop', got '{p}'"
                ));
                self.gaze.profile = None;
            }
        }
        if let Some(d) = self.gaze.max_blink_duration {
            if d.is_nan() || d <= 0.0 {
                problems.push(format!("gaze.max_blink_duration must be positive, got {d}"));
                self.gaze.max_blink_duration = None;
            }
        }
        if let Some(p) = self.focus.unfocused_penalty {
            if p > 100 {
                problems.push(format!("focus.unfocused_penalty must be 0-100, got {p}"));
                self.focus.unfocused_penalty = None;
            }
        }
        if let Some(q) = self.lighting.enhance_below {
            if !(0.0..=1.0).contains(&q) {
                problems.push(format!("lighting.enhance_below must be 0.0-1.0, got {q}"));
                self.lighting.enhance_below = None;
            }
        }
        if let Some(s) = self.attention.alert_after_secs {
            if s.is_nan() || s <= 0.0 {
                problems.push(format!("attention.alert_after_secs must be positive, got {s}"));
                self.attention.alert_after_secs = None;
            }
        }
        if let Some(s) = self.attention.log_interval_secs {
            if s.is_nan() || s <= 0.0 {
                problems.push(format!("attention.log_interval_secs must be positive, got {s}"));
                self.attention.log_interval_secs = None;
            }
        }
        if let Some(ref f) = self.output.format {
            if f != "json" && f != "jsonl" {
                problems.push(format!(
                    "output.format must be 'json' or 'jsonl', got '{f}'"
                ));
                self.output.format = None;
            }
        }

        problems
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        self.smoothing.window = other.smoothing.window.or(self.smoothing.window);

        self.detector.min_detection_confidence = other
            .detector
            .min_detection_confidence
            .or(self.detector.min_detection_confidence);

        self.gaze.profile = other.gaze.profile.or_else(|| self.gaze.profile.take());
        self.gaze.max_blink_duration = other
            .gaze
            .max_blink_duration
            .or(self.gaze.max_blink_duration);

        self.focus.unfocused_penalty = other
            .focus
            .unfocused_penalty
            .or(self.focus.unfocused_penalty);

        self.lighting.enhance_below = other.lighting.enhance_below.or(self.lighting.enhance_below);

        self.attention.alert_after_secs = other
            .attention
            .alert_after_secs
            .or(self.attention.alert_after_secs);
        self.attention.log_interval_secs = other
            .attention
            .log_interval_secs
            .or(self.attention.log_interval_secs);

        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());
        self.models.classifier = other
            .models
            .classifier
            .or_else(|| self.models.classifier.take());
        self.models.labels = other.models.labels.or_else(|| self.models.labels.take());
        self.models.classifier_sha256 = other
            .models
            .classifier_sha256
            .or_else(|| self.models.classifier_sha256.take());

        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("attentive").join("config.toml"))
}

/// Search for `.attentive.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(PROJECT_CONFIG);
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
