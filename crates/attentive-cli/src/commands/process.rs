//! Process command - replay recordings through per-subject processors.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use attentive_adapters::{verify_checksum, ModelStore, RecordingSource};
use attentive_core::analysis::{AttentionConfig, AttentionSummary, ThresholdProfile};
use attentive_core::{
    EmotionClassifier, FrameRecord, FrameSource, ManualClock, ProcessorConfig, ProgressEvent,
    ProgressSink, ResultOutput, SessionRegistry,
};
use clap::{Args, ValueEnum};
use serde::Serialize;
use tracing::{debug, info};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressBar};

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per frame)
    #[default]
    Jsonl,
    /// Single JSON array
    Json,
}

/// Gaze threshold profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    /// Webcam-calibrated thresholds
    #[default]
    Streaming,
    /// Lenient thresholds for a desktop monitor
    Desktop,
}

impl Profile {
    const fn thresholds(self) -> ThresholdProfile {
        match self {
            Self::Streaming => ThresholdProfile::streaming(),
            Self::Desktop => ThresholdProfile::desktop(),
        }
    }
}

/// Parse and validate a unit-interval value (0.0-1.0).
fn parse_unit(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0.0..=1.0"))
    }
}

/// Parse a strictly positive number of seconds.
fn parse_secs(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} must be positive"))
    }
}

/// Shared arguments for replaying recordings.
#[derive(Args, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ProcessArgs {
    /// JSONL landmark recordings to replay
    pub recordings: Vec<PathBuf>,

    /// Run without the emotion classifier (neutral results, gaze still analyzed)
    #[arg(long)]
    pub no_model: bool,

    /// Run inference on the CPU even when a GPU is available
    #[arg(long)]
    pub cpu: bool,

    /// Gaze threshold profile
    #[arg(long, value_enum)]
    pub profile: Option<Profile>,

    /// Number of recent predictions the emotion vote runs over
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub smoothing_window: Option<u16>,

    /// Faces below this detector confidence count as absent (0.0-1.0)
    #[arg(long, value_parser = parse_unit)]
    pub min_detection_confidence: Option<f64>,

    /// Longest eye closure still treated as a blink, in seconds
    #[arg(long, value_parser = parse_secs)]
    pub max_blink_duration: Option<f64>,

    /// Focus reduction when gaze is off-screen (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub unfocused_penalty: Option<u8>,

    /// Enhance frames whose lighting quality is below this (0.0-1.0)
    #[arg(long, value_parser = parse_unit)]
    pub enhance_below: Option<f64>,

    /// Continuous unfocused seconds before an attention alert
    #[arg(long, value_parser = parse_secs)]
    pub alert_after: Option<f64>,

    /// Seconds between attention log entries
    #[arg(long, value_parser = parse_secs)]
    pub log_interval: Option<f64>,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Classifier weights file (overrides the models directory)
    #[arg(long, value_name = "FILE")]
    pub classifier: Option<PathBuf>,

    /// Label encoder file (overrides the models directory)
    #[arg(long, value_name = "FILE")]
    pub labels: Option<PathBuf>,

    /// Write per-subject attention summaries to this JSON file
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Expected classifier checksum (from config only).
    #[arg(skip)]
    pub classifier_sha256: Option<String>,
}

impl ProcessArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in [`ProcessorConfig`])
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if args.profile.is_none() {
            args.profile = config.gaze.profile.as_deref().and_then(|p| match p {
                "streaming" => Some(Profile::Streaming),
                "desktop" => Some(Profile::Desktop),
                _ => None,
            });
        }
        args.smoothing_window = args.smoothing_window.or_else(|| {
            config
                .smoothing
                .window
                .and_then(|w| u16::try_from(w).ok())
        });
        args.min_detection_confidence = args
            .min_detection_confidence
            .or_else(|| config.detector.min_detection_confidence.map(f64::from));
        args.max_blink_duration = args.max_blink_duration.or(config.gaze.max_blink_duration);
        args.unfocused_penalty = args.unfocused_penalty.or(config.focus.unfocused_penalty);
        args.enhance_below = args.enhance_below.or(config.lighting.enhance_below);
        args.alert_after = args.alert_after.or(config.attention.alert_after_secs);
        args.log_interval = args.log_interval.or(config.attention.log_interval_secs);

        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }
        if args.classifier.is_none() {
            args.classifier.clone_from(&config.models.classifier);
        }
        if args.labels.is_none() {
            args.labels.clone_from(&config.models.labels);
        }
        args.classifier_sha256.clone_from(&config.models.classifier_sha256);

        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_deref()
                .and_then(|s| match s {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }

        args
    }

    /// Get output format with fallback to JSONL.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }

    /// Builds the processor configuration over the hardcoded defaults.
    #[allow(clippy::cast_possible_truncation)]
    pub fn processor_config(&self) -> ProcessorConfig {
        let defaults = ProcessorConfig::default();
        let attention = AttentionConfig {
            alert_after: self.alert_after.unwrap_or(defaults.attention.alert_after),
            log_interval: self.log_interval.unwrap_or(defaults.attention.log_interval),
            ..defaults.attention
        };
        ProcessorConfig {
            smoothing_window: self
                .smoothing_window
                .map_or(defaults.smoothing_window, usize::from),
            min_detection_confidence: self
                .min_detection_confidence
                .map_or(defaults.min_detection_confidence, |c| c as f32),
            thresholds: self.profile.unwrap_or_default().thresholds(),
            max_blink_duration: self
                .max_blink_duration
                .unwrap_or(defaults.max_blink_duration),
            unfocused_penalty: self.unfocused_penalty.unwrap_or(defaults.unfocused_penalty),
            enhance_below: self.enhance_below.unwrap_or(defaults.enhance_below),
            attention,
            ..defaults
        }
    }

    /// Model store honoring directory and file overrides.
    pub fn model_store(&self) -> ModelStore {
        let mut store = self
            .models_dir
            .clone()
            .map_or_else(ModelStore::default, ModelStore::new);
        if let Some(ref path) = self.classifier {
            store = store.with_classifier(path);
        }
        if let Some(ref path) = self.labels {
            store = store.with_labels(path);
        }
        store
    }
}

/// Result of running the process command.
#[allow(dead_code)] // Fields exposed for programmatic use
pub struct ProcessOutcome {
    /// Frames processed.
    pub processed: usize,
    /// Unreadable frames skipped.
    pub skipped: usize,
    /// Processed frames whose result carries an error.
    pub failed: usize,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Summary file contents.
#[derive(Serialize)]
struct SummaryReport<'a> {
    generated_at: String,
    sessions: Vec<SessionReport<'a>>,
}

#[derive(Serialize)]
struct SessionReport<'a> {
    subject: &'a str,
    #[serde(flatten)]
    summary: &'a AttentionSummary,
}

/// Run the process command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
///
/// # Errors
///
/// Returns an error for fatal problems: no recordings, an invalid
/// configuration, missing or corrupt model artifacts, or an unwritable output.
pub fn run(args: &ProcessArgs) -> Result<ProcessOutcome> {
    info!("Replaying {} recording(s)", args.recordings.len());

    if args.recordings.is_empty() {
        bail!("No recordings specified");
    }

    let classifier = load_classifier(args)?;
    let clock = Arc::new(ManualClock::new(0.0));
    let mut registry = SessionRegistry::new(args.processor_config(), classifier, clock.clone())?;

    let source = RecordingSource::new(args.recordings.clone());
    let total = source.count_hint();

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress = ProgressBar::new(total.map(|t| t as u64), args.quiet, show_progress);
    let output = JsonOutput::stdout();

    let replay = replay(
        &source,
        &mut registry,
        &clock,
        &output,
        &progress,
        args.format(),
    )?;
    if args.format() == OutputFormat::Json {
        output.write_array(&replay.collected, args.pretty)?;
    }
    output.flush()?;

    let sessions = registry.close_all();
    if let Some(ref path) = args.summary {
        write_summary(path, &sessions)?;
    }

    let exit_code = if replay.failed + replay.skipped > 0 {
        ExitCode::FramesFailed
    } else {
        ExitCode::Success
    };

    Ok(ProcessOutcome {
        processed: replay.processed,
        skipped: replay.skipped,
        failed: replay.failed,
        exit_code,
    })
}

/// Frame counts of one replay.
#[derive(Debug, Default)]
struct Replay {
    processed: usize,
    skipped: usize,
    failed: usize,
    /// Records held back for a single JSON array.
    collected: Vec<FrameRecord>,
}

/// Feeds every frame of `source` to its subject's processor.
///
/// Unreadable frames are reported and skipped. In JSONL mode each record goes
/// straight to `output`; in JSON mode records are collected instead.
fn replay(
    source: &dyn FrameSource,
    registry: &mut SessionRegistry,
    clock: &ManualClock,
    output: &dyn ResultOutput,
    progress: &dyn ProgressSink,
    format: OutputFormat,
) -> Result<Replay> {
    let total = source.count_hint();
    let mut replay = Replay::default();

    for (index, frame) in source.frames().enumerate() {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                progress.on_event(ProgressEvent::Skipped {
                    index,
                    reason: format!("{e:#}"),
                });
                replay.skipped += 1;
                continue;
            }
        };

        progress.on_event(ProgressEvent::Started {
            subject: frame.subject.clone(),
            index,
            total,
        });

        clock.set(frame.timestamp);
        let processor = registry.open(&frame.subject);
        let result = processor.process_landmarks(frame.image.as_ref(), frame.landmarks.as_ref());
        for &event in processor.attention_events() {
            progress.on_event(ProgressEvent::Attention {
                subject: frame.subject.clone(),
                event,
            });
        }
        if result.is_failure() {
            replay.failed += 1;
        }
        let record = FrameRecord::new(frame.subject, frame.timestamp, result);

        progress.on_event(ProgressEvent::Completed {
            record: record.clone(),
        });

        match format {
            OutputFormat::Jsonl => output.write(&record)?,
            OutputFormat::Json => replay.collected.push(record),
        }
        replay.processed += 1;
    }

    progress.on_event(ProgressEvent::Finished {
        processed: replay.processed,
        skipped: replay.skipped,
    });
    Ok(replay)
}

/// Loads the classifier once, failing fast on missing or corrupt artifacts.
fn load_classifier(args: &ProcessArgs) -> Result<Option<Arc<dyn EmotionClassifier>>> {
    if args.no_model {
        info!("Running without emotion classifier");
        return Ok(None);
    }
    let store = args.model_store();
    if let Some(ref expected) = args.classifier_sha256 {
        verify_checksum(&store.classifier_path(), expected)?;
    }
    debug!("Loading classifier from {}", store.classifier_path().display());
    let classifier: Arc<dyn EmotionClassifier> = Arc::new(store.load_classifier(!args.cpu)?);
    Ok(Some(classifier))
}

fn write_summary(path: &Path, sessions: &[(String, AttentionSummary)]) -> Result<()> {
    let report = SummaryReport {
        generated_at: iso_timestamp(),
        sessions: sessions
            .iter()
            .map(|(subject, summary)| SessionReport { subject, summary })
            .collect(),
    };
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write summary: {}", path.display()))?;
    info!("Wrote attention summary to {}", path.display());
    Ok(())
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use attentive_core::analysis::AttentionEvent;
    use attentive_core::SourceFrame;
    use attentive_test_support::{
        MockClassifier, MockFrameSource, MockProgressSink, MockResultOutput,
        SyntheticFaceBuilder,
    };

    fn frame(subject: &str, timestamp: f64) -> SourceFrame {
        SourceFrame {
            subject: subject.into(),
            timestamp,
            image: None,
            landmarks: Some(SyntheticFaceBuilder::new().build()),
        }
    }

    fn registry(clock: &Arc<ManualClock>) -> SessionRegistry {
        SessionRegistry::new(ProcessorConfig::default(), None, clock.clone()).unwrap()
    }

    // === Replay Tests ===

    #[test]
    fn test_replay_writes_records_and_skips_unreadable() {
        let source = MockFrameSource::with_results(vec![
            Ok(frame("alice", 0.0)),
            Err("truncated line".into()),
            Ok(frame("bob", 0.5)),
            Ok(frame("alice", 1.0)),
        ]);
        let output = MockResultOutput::new();
        let progress = MockProgressSink::new();
        let clock = Arc::new(ManualClock::new(0.0));
        let mut registry = registry(&clock);

        let replay = replay(
            &source,
            &mut registry,
            &clock,
            &output,
            &progress,
            OutputFormat::Jsonl,
        )
        .unwrap();

        assert_eq!((replay.processed, replay.skipped, replay.failed), (3, 1, 0));
        assert!(replay.collected.is_empty());
        let subjects: Vec<_> = output.records().into_iter().map(|r| r.subject).collect();
        assert_eq!(subjects, ["alice", "bob", "alice"]);
        assert!((output.records()[2].timestamp - 1.0).abs() < f64::EPSILON);
        assert_eq!(progress.completed_count(), 3);
        assert_eq!(progress.skipped_count(), 1);
        assert_eq!(progress.finished_counts(), Some((3, 1)));
        assert_eq!(source.iteration_count(), 1);
        assert_eq!(registry.close_all().len(), 2);
    }

    #[test]
    fn test_replay_forwards_attention_alerts() {
        let source = MockFrameSource::new(
            [0.0, 1.0, 2.0, 3.0]
                .into_iter()
                .map(|t| SourceFrame {
                    landmarks: None,
                    ..frame("carol", t)
                })
                .collect(),
        );
        let output = MockResultOutput::new();
        let progress = MockProgressSink::new();
        let clock = Arc::new(ManualClock::new(0.0));
        let args = ProcessArgs {
            alert_after: Some(2.0),
            ..ProcessArgs::default()
        };
        let mut registry = SessionRegistry::new(
            args.processor_config(),
            Some(Arc::new(MockClassifier::fixed("happy"))),
            clock.clone(),
        )
        .unwrap();

        replay(
            &source,
            &mut registry,
            &clock,
            &output,
            &progress,
            OutputFormat::Jsonl,
        )
        .unwrap();

        let alerts: Vec<_> = progress
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Attention {
                    subject,
                    event: AttentionEvent::UnfocusedAlert { unfocused_for },
                } => Some((subject, unfocused_for)),
                _ => None,
            })
            .collect();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].0, "carol");
        assert!((alerts[0].1 - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_replay_collects_for_json_array() {
        let source = MockFrameSource::new(vec![frame("alice", 0.0), frame("alice", 0.1)]);
        let output = MockResultOutput::new();
        let progress = MockProgressSink::new();
        let clock = Arc::new(ManualClock::new(0.0));
        let mut registry = registry(&clock);

        let replay = replay(
            &source,
            &mut registry,
            &clock,
            &output,
            &progress,
            OutputFormat::Json,
        )
        .unwrap();

        assert_eq!(replay.collected.len(), 2);
        assert!(output.records().is_empty());
        assert_eq!(output.flush_count(), 0);
    }

    #[test]
    fn test_replay_of_empty_source() {
        let source = MockFrameSource::empty();
        let output = MockResultOutput::new();
        let progress = MockProgressSink::new();
        let clock = Arc::new(ManualClock::new(0.0));
        let mut registry = registry(&clock);

        let replay = replay(
            &source,
            &mut registry,
            &clock,
            &output,
            &progress,
            OutputFormat::Jsonl,
        )
        .unwrap();

        assert_eq!(replay.processed, 0);
        assert_eq!(progress.events().len(), 1);
        assert_eq!(progress.finished_counts(), Some((0, 0)));
    }

    // === Argument Tests ===

    #[test]
    fn test_defaults_match_processor_defaults() {
        assert_eq!(
            ProcessArgs::default().processor_config(),
            ProcessorConfig::default()
        );
    }

    #[test]
    fn test_cli_overrides_config() {
        let config: AppConfig = toml::from_str(
            "[smoothing]\nwindow = 9\n[focus]\nunfocused_penalty = 10\n[gaze]\nprofile = 'desktop'\n",
        )
        .unwrap_or_default();
        let args = ProcessArgs {
            smoothing_window: Some(3),
            ..ProcessArgs::default()
        };
        let merged = ProcessArgs::with_config(args, &config).processor_config();
        assert_eq!(merged.smoothing_window, 3);
        assert_eq!(merged.unfocused_penalty, 10);
        assert_eq!(merged.thresholds, ThresholdProfile::desktop());
    }

    #[test]
    fn test_attention_overrides() {
        let args = ProcessArgs {
            alert_after: Some(5.0),
            ..ProcessArgs::default()
        };
        let config = args.processor_config();
        assert!((config.attention.alert_after - 5.0).abs() < f64::EPSILON);
        assert!((config.attention.log_interval - 600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_model_store_overrides() {
        let args = ProcessArgs {
            models_dir: Some(PathBuf::from("/models")),
            labels: Some(PathBuf::from("/custom/labels.json")),
            ..ProcessArgs::default()
        };
        let store = args.model_store();
        assert!(store.classifier_path().starts_with("/models"));
        assert_eq!(store.labels_path(), PathBuf::from("/custom/labels.json"));
    }

    #[test]
    fn test_parse_unit_bounds() {
        assert!(parse_unit("0.5").is_ok());
        assert!(parse_unit("1.5").is_err());
        assert!(parse_unit("abc").is_err());
        assert!(parse_secs("0").is_err());
        assert!(parse_secs("2.5").is_ok());
    }
}
