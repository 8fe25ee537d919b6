//! Emotion classifier port.

use crate::analysis::FeatureVector;

/// Port for mapping a feature vector to an emotion label.
///
/// Implementations are shared read-only across subjects.
pub trait EmotionClassifier: Send + Sync {
    /// Predicts the emotion label for one feature vector.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn predict(&self, features: &FeatureVector) -> anyhow::Result<String>;

    /// Class probabilities in label order, if the model provides them.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn predict_proba(&self, _features: &FeatureVector) -> anyhow::Result<Option<Vec<f32>>> {
        Ok(None)
    }

    /// Predicts the label together with its confidence, the largest class
    /// probability or 0.0 when the model reports none.
    ///
    /// Models that derive the label from their probabilities should override
    /// this to run inference once.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn classify(&self, features: &FeatureVector) -> anyhow::Result<(String, f32)> {
        let label = self.predict(features)?;
        let confidence = self
            .predict_proba(features)?
            .map_or(0.0, |probs| probs.into_iter().fold(0.0, f32::max));
        Ok((label, confidence))
    }
}
