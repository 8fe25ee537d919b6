//! Blink detection as a two-state eye machine.

use serde::Serialize;

use crate::domain::RingBuffer;

/// Number of state transitions remembered per subject.
pub const BLINK_HISTORY_LEN: usize = 10;

/// Default longest closure still counted as a blink, in seconds.
pub const DEFAULT_MAX_BLINK_DURATION: f64 = 0.3;

/// Eye state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EyeState {
    /// Eyes open.
    Open,
    /// Eyes closed since the given clock time.
    Closed {
        /// Clock time of the closing transition.
        since: f64,
    },
}

/// A recorded transition into `state` at `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlinkTransition {
    /// State entered.
    pub state: EyeState,
    /// Clock time of the transition.
    pub timestamp: f64,
}

/// Tracks eye closure across frames and classifies short closures as blinks.
#[derive(Debug, Clone)]
pub struct BlinkDetector {
    state: EyeState,
    history: RingBuffer<BlinkTransition>,
    max_duration: f64,
}

impl Default for BlinkDetector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BLINK_DURATION)
    }
}

impl BlinkDetector {
    /// Creates a detector in the open state.
    #[must_use]
    pub fn new(max_duration: f64) -> Self {
        Self {
            state: EyeState::Open,
            history: RingBuffer::new(BLINK_HISTORY_LEN),
            max_duration,
        }
    }

    /// Feeds one EAR sample; returns true if the eyes are in a blink.
    ///
    /// Closing is recorded once per closure. A closure counts as a blink while
    /// it has lasted less than the maximum blink duration. Reopening records
    /// the open transition and is never a blink.
    pub fn update(&mut self, avg_ear: f64, threshold: f64, now: f64) -> bool {
        if avg_ear < threshold {
            let since = match self.state {
                EyeState::Closed { since } => since,
                EyeState::Open => {
                    let state = EyeState::Closed { since: now };
                    self.state = state;
                    self.history.push(BlinkTransition {
                        state,
                        timestamp: now,
                    });
                    now
                }
            };
            now - since < self.max_duration
        } else {
            if matches!(self.state, EyeState::Closed { .. }) {
                self.state = EyeState::Open;
                self.history.push(BlinkTransition {
                    state: EyeState::Open,
                    timestamp: now,
                });
            }
            false
        }
    }

    /// Current eye state.
    #[must_use]
    pub const fn state(&self) -> EyeState {
        self.state
    }

    /// Recent transitions, oldest first.
    #[must_use]
    pub const fn history(&self) -> &RingBuffer<BlinkTransition> {
        &self.history
    }

    /// Longest closure still counted as a blink.
    #[must_use]
    pub const fn max_duration(&self) -> f64 {
        self.max_duration
    }
}
