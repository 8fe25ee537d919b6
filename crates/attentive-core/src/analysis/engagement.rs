//! Emotion to engagement and focus score mapping.

use crate::domain::Engagement;

/// Default focus reduction when gaze is off-screen.
pub const DEFAULT_UNFOCUSED_PENALTY: u8 = 40;

/// Focus for labels outside the known vocabulary.
const UNKNOWN_FOCUS: u8 = 60;

/// Maps an emotion label (case-insensitive) to an engagement category.
///
/// Unknown labels are passive.
#[must_use]
pub fn engagement_for(emotion: &str) -> Engagement {
    match emotion.to_lowercase().as_str() {
        "happy" | "happiness" | "surprised" | "surprise" | "neutral" | "neutrality" => {
            Engagement::Active
        }
        "angry" | "anger" | "fear" | "fearful" => Engagement::Distracted,
        _ => Engagement::Passive,
    }
}

/// Base focus level (0-100) for an emotion label, case-insensitive.
#[must_use]
pub fn base_focus(emotion: &str) -> u8 {
    match emotion.to_lowercase().as_str() {
        "happy" | "happiness" => 85,
        "surprised" | "surprise" => 80,
        "neutral" | "neutrality" => 70,
        "sad" | "sadness" => 55,
        "fear" | "fearful" => 40,
        "angry" | "anger" => 35,
        "disgust" | "disgusted" => 30,
        _ => UNKNOWN_FOCUS,
    }
}

/// Focus level: the emotion's base, reduced once by `penalty` when unfocused.
#[must_use]
pub fn focus_score(emotion: &str, gaze_focused: bool, penalty: u8) -> u8 {
    let base = base_focus(emotion);
    let score = if gaze_focused {
        base
    } else {
        base.saturating_sub(penalty)
    };
    score.min(100)
}
