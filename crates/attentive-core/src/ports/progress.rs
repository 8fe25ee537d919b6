//! Progress reporting port for UI integration.

use crate::analysis::AttentionEvent;
use crate::domain::FrameRecord;

/// Events emitted while replaying frames.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Processing started for a frame.
    Started {
        /// Subject the frame belongs to.
        subject: String,
        /// Index in the source (0-based).
        index: usize,
        /// Total frames, if known.
        total: Option<usize>,
    },
    /// Processing completed for a frame.
    Completed {
        /// The produced record.
        record: FrameRecord,
    },
    /// A frame raised an attention alert or log entry.
    Attention {
        /// Subject the event belongs to.
        subject: String,
        /// The event.
        event: AttentionEvent,
    },
    /// A frame could not be read and was skipped.
    Skipped {
        /// Index in the source (0-based).
        index: usize,
        /// Reason for skipping.
        reason: String,
    },
    /// All frames have been processed.
    Finished {
        /// Frames processed.
        processed: usize,
        /// Frames skipped.
        skipped: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
