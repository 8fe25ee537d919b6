//! Per-subject processor registry.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use super::{FrameProcessor, ProcessorConfig};
use crate::analysis::AttentionSummary;
use crate::ports::{Clock, EmotionClassifier};

/// One [`FrameProcessor`] per subject, sharing a classifier and clock.
pub struct SessionRegistry {
    config: ProcessorConfig,
    classifier: Option<Arc<dyn EmotionClassifier>>,
    clock: Arc<dyn Clock>,
    sessions: HashMap<String, FrameProcessor>,
}

impl SessionRegistry {
    /// Creates an empty registry.
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
        Ok(Self {
            config,
            classifier,
            clock,
            sessions: HashMap::new(),
        })
    }

    /// Returns the subject's processor, creating it on first use.
    pub fn open(&mut self, subject: &str) -> &mut FrameProcessor {
        let Self {
            config,
            classifier,
            clock,
            sessions,
        } = self;
        sessions.entry(subject.to_string()).or_insert_with(|| {
            info!(subject, "session opened");
            FrameProcessor::from_validated(config.clone(), classifier.clone(), Arc::clone(clock))
        })
    }

    /// Returns the subject's processor if it is open.
    pub fn get_mut(&mut self, subject: &str) -> Option<&mut FrameProcessor> {
        self.sessions.get_mut(subject)
    }

    /// Disposes of the subject's processor, returning its attention summary.
    pub fn close(&mut self, subject: &str) -> Option<AttentionSummary> {
        let processor = self.sessions.remove(subject)?;
        let summary = processor.attention_summary();
        info!(
            subject,
            frames = summary.frames,
            focus_percentage = summary.focus_percentage,
            alerts = summary.alerts,
            "session closed"
        );
        Some(summary)
    }

    /// Closes every session, returning summaries sorted by subject.
    pub fn close_all(&mut self) -> Vec<(String, AttentionSummary)> {
        let mut subjects: Vec<String> = self.sessions.keys().cloned().collect();
        subjects.sort();
        subjects
            .into_iter()
            .filter_map(|subject| {
                let summary = self.close(&subject)?;
                Some((subject, summary))
            })
            .collect()
    }

    /// Open subjects, in no particular order.
    pub fn subjects(&self) -> impl Iterator<Item = &str> + '_ {
        self.sessions.keys().map(String::as_str)
    }

    /// Number of open sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if no session is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ports::ManualClock;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(
            ProcessorConfig::default(),
            None,
            Arc::new(ManualClock::new(0.0)),
        )
        .unwrap()
    }

    #[test]
    fn test_open_is_idempotent() {
        let mut registry = registry();
        registry.open("alice").process_landmarks(None, None);
        registry.open("alice");
        registry.open("bob");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_subjects_are_independent() {
        let mut registry = registry();
        registry.open("alice").process_landmarks(None, None);
        registry.open("bob");
        assert_eq!(registry.close("alice").unwrap().frames, 0);
        assert!(registry.get_mut("alice").is_none());
        assert!(registry.get_mut("bob").is_some());
    }

    #[test]
    fn test_close_unknown_is_none() {
        assert!(registry().close("nobody").is_none());
    }

    #[test]
    fn test_close_all_sorted() {
        let mut registry = registry();
        for subject in ["carol", "alice", "bob"] {
            registry.open(subject);
        }
        let closed: Vec<_> = registry.close_all().into_iter().map(|(s, _)| s).collect();
        assert_eq!(closed, vec!["alice", "bob", "carol"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ProcessorConfig::default().with_min_detection_confidence(2.0);
        assert!(SessionRegistry::new(config, None, Arc::new(ManualClock::default())).is_err());
    }
}
