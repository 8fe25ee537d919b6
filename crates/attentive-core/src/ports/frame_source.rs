//! Frame source port for replaying recorded sessions.

use crate::domain::SourceFrame;

/// Port for reading frames from a source.
pub trait FrameSource: Send + Sync {
    /// Returns an iterator over frames from this source, in capture order.
    ///
    /// # Errors
    ///
    /// Individual items may be errors if a frame fails to load.
    fn frames(&self) -> Box<dyn Iterator<Item = anyhow::Result<SourceFrame>> + Send + '_>;

    /// Returns the total number of frames, if known.
    fn count_hint(&self) -> Option<usize>;
}
