//! Sustained-attention tracking.
//!
//! Keeps a rolling focus history per subject, raises an alert once the
//! subject has been unfocused for a sustained period, and writes a periodic
//! attention log entry with the recent focus percentage.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::RingBuffer;

/// Focus percentage above which a log entry counts as focused.
const FOCUSED_PERCENTAGE: f64 = 70.0;

/// Attention tracker settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttentionConfig {
    /// Continuous unfocused seconds before an alert.
    pub alert_after: f64,
    /// Seconds between attention log entries.
    pub log_interval: f64,
    /// Frames kept in the rolling focus history.
    pub history_len: usize,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            alert_after: 300.0,
            log_interval: 600.0,
            history_len: 300,
        }
    }
}

/// Attention status of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionStatus {
    /// Recent focus above 70 %.
    Focused,
    /// Recent focus at or below 70 %.
    Distracted,
}

impl AttentionStatus {
    fn from_percentage(percentage: f64) -> Self {
        if percentage > FOCUSED_PERCENTAGE {
            Self::Focused
        } else {
            Self::Distracted
        }
    }
}

impl fmt::Display for AttentionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Focused => f.write_str("focused"),
            Self::Distracted => f.write_str("distracted"),
        }
    }
}

/// Periodic attention log entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttentionLogEntry {
    /// Clock time of the entry.
    pub at: f64,
    /// Focused share of the rolling history, 0-100.
    pub focus_percentage: f64,
    /// Status derived from the percentage.
    pub status: AttentionStatus,
}

/// Something noteworthy produced by [`AttentionTracker::record`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AttentionEvent {
    /// Subject has been unfocused for at least the alert period.
    UnfocusedAlert {
        /// Seconds spent unfocused when the alert fired.
        unfocused_for: f64,
    },
    /// A periodic log entry was written.
    Logged(AttentionLogEntry),
}

/// Session summary for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionSummary {
    /// Frames recorded.
    pub frames: u64,
    /// Frames recorded as focused.
    pub focused_frames: u64,
    /// Focused share of all frames, 0-100.
    pub focus_percentage: f64,
    /// Alerts raised.
    pub alerts: u64,
    /// Attention log entries, oldest first.
    pub log: Vec<AttentionLogEntry>,
    /// Seconds between the first and last recorded frame.
    pub duration_secs: f64,
}

/// Per-subject attention tracker.
#[derive(Debug, Clone)]
pub struct AttentionTracker {
    config: AttentionConfig,
    history: RingBuffer<bool>,
    unfocused_since: Option<f64>,
    session_start: Option<f64>,
    last_seen: f64,
    last_log: f64,
    frames: u64,
    focused_frames: u64,
    alerts: u64,
    log: Vec<AttentionLogEntry>,
}

impl Default for AttentionTracker {
    fn default() -> Self {
        Self::new(AttentionConfig::default())
    }
}

impl AttentionTracker {
    /// Creates an empty tracker. The session starts at the first record.
    #[must_use]
    pub fn new(config: AttentionConfig) -> Self {
        Self {
            config,
            history: RingBuffer::new(config.history_len),
            unfocused_since: None,
            session_start: None,
            last_seen: 0.0,
            last_log: 0.0,
            frames: 0,
            focused_frames: 0,
            alerts: 0,
            log: Vec::new(),
        }
    }

    /// Records one frame's focus decision at clock time `now`.
    #[must_use]
    pub fn record(&mut self, focused: bool, now: f64) -> Vec<AttentionEvent> {
        let mut events = Vec::new();
        if self.session_start.is_none() {
            self.session_start = Some(now);
            self.last_log = now;
        }
        self.last_seen = now;
        self.frames += 1;
        if focused {
            self.focused_frames += 1;
        }
        self.history.push(focused);

        if focused {
            self.unfocused_since = None;
        } else {
            let since = *self.unfocused_since.get_or_insert(now);
            let unfocused_for = now - since;
            if unfocused_for >= self.config.alert_after {
                warn!(
                    unfocused_secs = unfocused_for,
                    "subject unfocused for a sustained period"
                );
                self.alerts += 1;
                self.unfocused_since = Some(now);
                events.push(AttentionEvent::UnfocusedAlert { unfocused_for });
            }
        }

        if now - self.last_log >= self.config.log_interval {
            let focus_percentage = self.history_percentage();
            let entry = AttentionLogEntry {
                at: now,
                focus_percentage,
                status: AttentionStatus::from_percentage(focus_percentage),
            };
            info!(
                focus_percentage,
                status = %entry.status,
                "attention log"
            );
            self.log.push(entry);
            self.last_log = now;
            events.push(AttentionEvent::Logged(entry));
        }
        events
    }

    /// Focused share of the rolling history, 0 when empty.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn history_percentage(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let focused = self.history.iter().filter(|f| **f).count();
        focused as f64 / self.history.len() as f64 * 100.0
    }

    /// Seconds the subject has currently been unfocused.
    #[must_use]
    pub fn unfocused_for(&self) -> f64 {
        self.unfocused_since
            .map_or(0.0, |since| (self.last_seen - since).max(0.0))
    }

    /// Session summary so far.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn summary(&self) -> AttentionSummary {
        let focus_percentage = if self.frames == 0 {
            0.0
        } else {
            self.focused_frames as f64 / self.frames as f64 * 100.0
        };
        AttentionSummary {
            frames: self.frames,
            focused_frames: self.focused_frames,
            focus_percentage,
            alerts: self.alerts,
            log: self.log.clone(),
            duration_secs: self
                .session_start
                .map_or(0.0, |start| self.last_seen - start),
        }
    }

    /// Tracker settings.
    #[must_use]
    pub const fn config(&self) -> &AttentionConfig {
        &self.config
    }
}
