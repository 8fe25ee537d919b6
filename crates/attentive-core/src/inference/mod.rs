//! ML inference using Candle.
//!
//! Provides device selection, safetensors loading and the linear emotion
//! classifier that maps a [`FeatureVector`](crate::analysis::FeatureVector)
//! to an emotion label.

mod classifier;
mod device;
mod loader;
mod utils;

pub use classifier::{LabelEncoder, LinearEmotionClassifier};
pub use device::select_device;
pub use loader::load_safetensors;
pub use utils::argmax;
