//! Temporal smoothing of emotion labels.

use crate::domain::RingBuffer;

/// Default number of recent predictions voted over.
pub const DEFAULT_WINDOW: usize = 5;

/// Majority vote over a sliding window of raw labels.
#[derive(Debug, Clone)]
pub struct EmotionSmoother {
    recent: RingBuffer<String>,
}

impl Default for EmotionSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl EmotionSmoother {
    /// Creates a smoother over the last `window` labels (at least one).
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            recent: RingBuffer::new(window),
        }
    }

    /// Records a raw label and returns the smoothed one.
    pub fn push(&mut self, label: impl Into<String>) -> String {
        let label = label.into();
        self.recent.push(label.clone());
        self.smoothed().unwrap_or(label)
    }

    /// Most frequent label in the window, ties going to the label seen first.
    ///
    /// With fewer than two entries this is the latest raw label.
    #[must_use]
    pub fn smoothed(&self) -> Option<String> {
        if self.recent.len() < 2 {
            return self.recent.last().cloned();
        }
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for label in self.recent.iter() {
            match counts.iter_mut().find(|(seen, _)| *seen == label) {
                Some((_, count)) => *count += 1,
                None => counts.push((label, 1)),
            }
        }
        // max_by_key keeps the last maximum; reverse to favor the first seen.
        counts
            .into_iter()
            .rev()
            .max_by_key(|(_, count)| *count)
            .map(|(label, _)| label.to_string())
    }

    /// Raw labels in the window, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &str> + '_ {
        self.recent.iter().map(String::as_str)
    }

    /// Window size.
    #[must_use]
    pub const fn window(&self) -> usize {
        self.recent.capacity()
    }
}
