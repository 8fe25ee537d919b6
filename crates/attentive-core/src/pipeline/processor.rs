//! Frame orchestration for one subject.

use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine;
use image::DynamicImage;
use tracing::{debug, warn};

use super::{ProcessorConfig, TrackState};
use crate::analysis::{
    assemble_features, assess_lighting, engagement_for, enhance_contrast, estimate_head_pose,
    focus_score, AttentionEvent, AttentionSummary, GazeAnalyzer, GazeReading,
};
use crate::domain::{FaceLandmarks, FrameResult};
use crate::ports::{Clock, EmotionClassifier, LandmarkProvider};

/// Error text for undecodable base64 frames.
pub const DECODE_FAILED: &str = "failed to decode image";

/// Runs one subject's frames through the attention pipeline.
///
/// Frames are processed strictly in order through `&mut self`; per-frame
/// failures become degraded [`FrameResult`]s and never escape.
pub struct FrameProcessor {
    config: ProcessorConfig,
    classifier: Option<Arc<dyn EmotionClassifier>>,
    clock: Arc<dyn Clock>,
    gaze: GazeAnalyzer,
    state: TrackState,
    attention_events: Vec<AttentionEvent>,
}

impl std::fmt::Debug for FrameProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameProcessor")
            .field("config", &self.config)
            .field("has_classifier", &self.classifier.is_some())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl FrameProcessor {
    /// Creates a processor.
    ///
    /// Without a classifier every frame reports the neutral "model not
    /// loaded" result, with gaze fields still filled when a face is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(
        config: ProcessorConfig,
        classifier: Option<Arc<dyn EmotionClassifier>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate().context("Invalid processor configuration")?;
        Ok(Self::from_validated(config, classifier, clock))
    }

    pub(crate) fn from_validated(
        config: ProcessorConfig,
        classifier: Option<Arc<dyn EmotionClassifier>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gaze: GazeAnalyzer::new(config.thresholds),
            state: TrackState::new(&config),
            config,
            classifier,
            clock,
            attention_events: Vec::new(),
        }
    }

    /// Processes a raw frame, detecting landmarks with `detector`.
    ///
    /// Poorly lit frames are contrast-enhanced before detection.
    pub fn process_frame(
        &mut self,
        image: &DynamicImage,
        detector: &mut dyn LandmarkProvider,
    ) -> FrameResult {
        self.attention_events.clear();
        let now = self.clock.now();
        let raw_quality = self.observe_lighting(image);

        let enhanced;
        let frame = if raw_quality < self.config.enhance_below {
            debug!(quality = raw_quality, "enhancing low-light frame");
            enhanced = enhance_contrast(image, &self.config.clahe);
            &enhanced
        } else {
            image
        };

        match detector.detect(frame) {
            Ok(landmarks) => self.analyze(landmarks.as_ref(), now),
            Err(e) => self.fail(&e.context("Landmark detection failed")),
        }
    }

    /// Processes caller-supplied landmarks, with the frame if available.
    ///
    /// The frame only feeds lighting assessment.
    pub fn process_landmarks(
        &mut self,
        image: Option<&DynamicImage>,
        landmarks: Option<&FaceLandmarks>,
    ) -> FrameResult {
        self.attention_events.clear();
        let now = self.clock.now();
        if let Some(image) = image {
            self.observe_lighting(image);
        }
        self.analyze(landmarks, now)
    }

    /// Processes a base64 image, optionally a `data:` URL.
    ///
    /// Undecodable input yields a failure result with "failed to decode image".
    pub fn process_base64(&mut self, data: &str, detector: &mut dyn LandmarkProvider) -> FrameResult {
        match decode_base64_image(data) {
            Ok(image) => self.process_frame(&image, detector),
            Err(e) => {
                self.attention_events.clear();
                warn!("Failed to decode frame: {e:#}");
                FrameResult {
                    lighting_quality: self.state.lighting_quality,
                    ..FrameResult::failure(DECODE_FAILED)
                }
            }
        }
    }

    /// Per-subject state.
    #[must_use]
    pub const fn state(&self) -> &TrackState {
        &self.state
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Alerts and log entries raised by the most recent frame.
    #[must_use]
    pub fn attention_events(&self) -> &[AttentionEvent] {
        &self.attention_events
    }

    /// Attention summary so far.
    #[must_use]
    pub fn attention_summary(&self) -> AttentionSummary {
        self.state.attention.summary()
    }

    /// Returns the raw quality; the smoothed one lands in state.
    fn observe_lighting(&mut self, image: &DynamicImage) -> f64 {
        let raw = assess_lighting(image);
        let smoothed = self.state.observe_lighting(raw);
        debug!(raw, smoothed, "lighting assessed");
        raw
    }

    fn analyze(&mut self, landmarks: Option<&FaceLandmarks>, now: f64) -> FrameResult {
        let landmarks = landmarks.filter(|lm| self.is_usable(lm));

        let Some(classifier) = self.classifier.clone() else {
            return self.no_model(landmarks, now);
        };
        let Some(landmarks) = landmarks else {
            return self.no_face(now);
        };
        match self.track(classifier.as_ref(), landmarks, now) {
            Ok(result) => result,
            Err(e) => self.fail(&e),
        }
    }

    fn is_usable(&self, landmarks: &FaceLandmarks) -> bool {
        if landmarks.is_empty() {
            return false;
        }
        match landmarks.confidence() {
            Some(confidence) if confidence < self.config.min_detection_confidence => {
                debug!(confidence, "face below detection confidence");
                false
            }
            _ => true,
        }
    }

    fn track(
        &mut self,
        classifier: &dyn EmotionClassifier,
        landmarks: &FaceLandmarks,
        now: f64,
    ) -> Result<FrameResult> {
        let pose = estimate_head_pose(landmarks);
        let features = assemble_features(landmarks, &pose);
        let (raw_emotion, confidence) = classifier
            .classify(&features)
            .context("Emotion prediction failed")?;

        let emotion = self.state.smoother.push(raw_emotion.clone());
        let reading = self.read_gaze(landmarks, now);
        let engagement = engagement_for(&emotion);
        let focus_level = focus_score(&emotion, reading.is_focused, self.config.unfocused_penalty);
        debug!(
            raw = %raw_emotion,
            smoothed = %emotion,
            %engagement,
            focus_level,
            "frame tracked"
        );

        Ok(FrameResult {
            emotion: Some(emotion),
            raw_emotion: Some(raw_emotion),
            confidence,
            engagement,
            focus_level,
            face_detected: true,
            pose,
            ..self.gaze_fields(&reading)
        })
    }

    fn no_model(&mut self, landmarks: Option<&FaceLandmarks>, now: f64) -> FrameResult {
        let Some(landmarks) = landmarks else {
            return FrameResult {
                lighting_quality: self.state.lighting_quality,
                ..FrameResult::no_model()
            };
        };
        let reading = self.read_gaze(landmarks, now);
        let base = FrameResult::no_model();
        FrameResult {
            emotion: base.emotion,
            engagement: base.engagement,
            focus_level: base.focus_level,
            error: base.error,
            face_detected: true,
            pose: estimate_head_pose(landmarks),
            ..self.gaze_fields(&reading)
        }
    }

    fn no_face(&mut self, now: f64) -> FrameResult {
        debug!("no usable face");
        let events = self.state.attention.record(false, now);
        self.attention_events.extend(events);
        FrameResult {
            lighting_quality: self.state.lighting_quality,
            ..FrameResult::no_face()
        }
    }

    fn fail(&self, error: &anyhow::Error) -> FrameResult {
        warn!("Frame failed: {error:#}");
        FrameResult {
            lighting_quality: self.state.lighting_quality,
            ..FrameResult::failure(format!("{error:#}"))
        }
    }

    fn read_gaze(&mut self, landmarks: &FaceLandmarks, now: f64) -> GazeReading {
        let reading = self.gaze.analyze(
            landmarks,
            &mut self.state.gaze,
            self.state.lighting_quality,
            now,
        );
        let events = self.state.attention.record(reading.is_focused, now);
        self.attention_events.extend(events);
        reading
    }

    /// No-face result with the gaze-derived fields filled in.
    fn gaze_fields(&self, reading: &GazeReading) -> FrameResult {
        FrameResult {
            is_focused_gaze: reading.is_focused,
            gaze_direction: reading.direction,
            eye_openness: reading.eye_openness,
            wearing_glasses: reading.wearing_glasses,
            face_distance: reading.face_distance,
            lighting_quality: self.state.lighting_quality,
            ..FrameResult::no_face()
        }
    }
}

/// Decodes a base64 image, stripping any `data:...,` prefix.
///
/// # Errors
///
/// Returns an error if the payload is not valid base64 or not a supported
/// image format.
pub fn decode_base64_image(data: &str) -> Result<DynamicImage> {
    let payload = data.split_once(',').map_or(data, |(_, rest)| rest).trim();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .context("Invalid base64 payload")?;
    image::load_from_memory(&bytes).context("Unsupported or corrupt image data")
}
