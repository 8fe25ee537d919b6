//! Mock implementations of core port traits.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::anyhow;
use attentive_core::analysis::FeatureVector;
use attentive_core::ports::{
    EmotionClassifier, FrameSource, LandmarkProvider, ProgressEvent, ProgressSink, ResultOutput,
};
use attentive_core::{FaceLandmarks, FrameRecord, SourceFrame};
use image::DynamicImage;

enum Detections {
    Always(Option<FaceLandmarks>),
    Sequence(Vec<Option<FaceLandmarks>>),
    Failing(String),
}

/// Mock landmark detector.
///
/// Returns a fixed face, a scripted sequence (repeating the last entry once
/// exhausted) or an error, and counts calls.
pub struct MockLandmarkProvider {
    detections: Detections,
    calls: Arc<Mutex<usize>>,
}

impl MockLandmarkProvider {
    /// Detects the same face (or no face) on every frame.
    #[must_use]
    pub fn always(face: Option<FaceLandmarks>) -> Self {
        Self::with(Detections::Always(face))
    }

    /// Detects the given faces in order.
    #[must_use]
    pub fn sequence(faces: Vec<Option<FaceLandmarks>>) -> Self {
        Self::with(Detections::Sequence(faces))
    }

    /// Fails every detection with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with(Detections::Failing(message.into()))
    }

    fn with(detections: Detections) -> Self {
        Self {
            detections,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns the number of `detect` calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LandmarkProvider for MockLandmarkProvider {
    fn detect(&mut self, _image: &DynamicImage) -> anyhow::Result<Option<FaceLandmarks>> {
        let index = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            *calls += 1;
            *calls - 1
        };
        match &self.detections {
            Detections::Always(face) => Ok(face.clone()),
            Detections::Sequence(faces) => Ok(faces
                .get(index)
                .or_else(|| faces.last())
                .cloned()
                .flatten()),
            Detections::Failing(message) => Err(anyhow!("{message}")),
        }
    }
}

enum Predictions {
    Sequence(Vec<String>),
    Failing(String),
}

/// Mock emotion classifier.
///
/// Predicts scripted labels in order (repeating the last one), optionally
/// reporting class probabilities.
pub struct MockClassifier {
    predictions: Predictions,
    probabilities: Option<Vec<f32>>,
    calls: Mutex<usize>,
}

impl MockClassifier {
    /// Always predicts `label`.
    #[must_use]
    pub fn fixed(label: impl Into<String>) -> Self {
        Self::with(Predictions::Sequence(vec![label.into()]))
    }

    /// Predicts `labels` in order.
    #[must_use]
    pub fn sequence<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        Self::with(Predictions::Sequence(
            labels.into_iter().map(Into::into).collect(),
        ))
    }

    /// Fails every prediction with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with(Predictions::Failing(message.into()))
    }

    /// Reports `probabilities` from `predict_proba`.
    #[must_use]
    pub fn with_probabilities(mut self, probabilities: Vec<f32>) -> Self {
        self.probabilities = Some(probabilities);
        self
    }

    fn with(predictions: Predictions) -> Self {
        Self {
            predictions,
            probabilities: None,
            calls: Mutex::new(0),
        }
    }

    /// Returns the number of `predict` calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EmotionClassifier for MockClassifier {
    fn predict(&self, _features: &FeatureVector) -> anyhow::Result<String> {
        let index = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            *calls += 1;
            *calls - 1
        };
        match &self.predictions {
            Predictions::Sequence(labels) => labels
                .get(index)
                .or_else(|| labels.last())
                .cloned()
                .ok_or_else(|| anyhow!("no labels scripted")),
            Predictions::Failing(message) => Err(anyhow!("{message}")),
        }
    }

    fn predict_proba(&self, _features: &FeatureVector) -> anyhow::Result<Option<Vec<f32>>> {
        match &self.predictions {
            Predictions::Failing(message) => Err(anyhow!("{message}")),
            Predictions::Sequence(_) => Ok(self.probabilities.clone()),
        }
    }
}

/// Mock implementation of `FrameSource` for testing.
///
/// Yields pre-built frames or per-frame errors and tracks iteration.
pub struct MockFrameSource {
    frames: Vec<Result<SourceFrame, String>>,
    iteration_count: Arc<Mutex<usize>>,
}

impl MockFrameSource {
    /// Creates a source yielding `frames`.
    #[must_use]
    pub fn new(frames: Vec<SourceFrame>) -> Self {
        Self::with_results(frames.into_iter().map(Ok).collect())
    }

    /// Creates a source where `Err` entries surface as read errors.
    #[must_use]
    pub fn with_results(frames: Vec<Result<SourceFrame, String>>) -> Self {
        Self {
            frames,
            iteration_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates an empty source.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Returns the number of times the source has been iterated.
    #[must_use]
    pub fn iteration_count(&self) -> usize {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl FrameSource for MockFrameSource {
    fn frames(&self) -> Box<dyn Iterator<Item = anyhow::Result<SourceFrame>> + Send + '_> {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        Box::new(
            self.frames
                .iter()
                .map(|frame| frame.clone().map_err(|message| anyhow!(message))),
        )
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.frames.len())
    }
}

/// Mock implementation of `ResultOutput` for testing.
///
/// Captures records for later assertions.
pub struct MockResultOutput {
    records: Arc<Mutex<Vec<FrameRecord>>>,
    flush_count: Arc<Mutex<usize>>,
}

impl MockResultOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            flush_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns all captured records.
    #[must_use]
    pub fn records(&self) -> Vec<FrameRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockResultOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultOutput for MockResultOutput {
    fn write(&self, record: &FrameRecord) -> anyhow::Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `Completed` events.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Completed { .. }))
            .count()
    }

    /// Returns the number of `Skipped` events.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Skipped { .. }))
            .count()
    }

    /// Returns the final counts from the `Finished` event, if any.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished { processed, skipped } => Some((*processed, *skipped)),
            _ => None,
        })
    }
}

impl Default for MockProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
