//! Linear emotion classifier.
//!
//! A multinomial logistic-regression head over the geometric feature vector,
//! optionally preceded by per-feature standardization. Weights are read from
//! safetensors (`linear.weight` `[classes, features]`, `linear.bias`
//! `[classes]`, optional `scaler.mean` / `scaler.scale` `[features]`) and the
//! class names from a JSON label encoder.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{linear, Linear, VarBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{argmax, load_safetensors};
use crate::analysis::{FeatureVector, FEATURE_COUNT};
use crate::ports::EmotionClassifier;

/// Class names in model output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Creates an encoder from class names.
    ///
    /// # Errors
    ///
    /// Returns an error if `classes` is empty.
    pub fn new(classes: Vec<String>) -> Result<Self> {
        ensure!(!classes.is_empty(), "Label encoder has no classes");
        Ok(Self { classes })
    }

    /// Reads a `{"classes": [...]}` JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or lists no
    /// classes.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read label encoder: {}", path.display()))?;
        let encoder: Self = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse label encoder: {}", path.display()))?;
        Self::new(encoder.classes).with_context(|| path.display().to_string())
    }

    /// Class name at `index`.
    #[must_use]
    pub fn label(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    /// All class names.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Always false for a constructed encoder.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Per-feature standardization `(x - mean) / scale`.
#[derive(Debug, Clone)]
struct Scaler {
    mean: Tensor,
    scale: Tensor,
}

impl Scaler {
    /// Zero scales are treated as one.
    fn new(mean: Tensor, scale: &Tensor) -> Result<Self> {
        let values: Vec<f32> = scale
            .to_vec1::<f32>()?
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();
        let scale = Tensor::from_vec(values, FEATURE_COUNT, scale.device())?;
        Ok(Self { mean, scale })
    }

    fn apply(&self, x: &Tensor) -> Result<Tensor> {
        Ok(x.broadcast_sub(&self.mean)?.broadcast_div(&self.scale)?)
    }
}

/// Emotion classifier backed by a linear layer.
#[derive(Debug, Clone)]
pub struct LinearEmotionClassifier {
    linear: Linear,
    scaler: Option<Scaler>,
    labels: LabelEncoder,
    device: Device,
}

impl LinearEmotionClassifier {
    /// Loads weights and labels from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if either artifact is missing or invalid, or if the
    /// weight shapes do not match the label count and feature length.
    pub fn load(
        model: impl AsRef<Path>,
        labels: impl AsRef<Path>,
        device: &Device,
    ) -> Result<Self> {
        let model = model.as_ref();
        let labels = LabelEncoder::load(labels)?;
        let vb = load_safetensors(model, device)?;
        let classifier = Self::new(&vb, labels)
            .with_context(|| format!("Invalid emotion classifier: {}", model.display()))?;
        info!(
            classes = classifier.labels.len(),
            standardized = classifier.scaler.is_some(),
            "Loaded emotion classifier from {}",
            model.display()
        );
        Ok(classifier)
    }

    /// Builds the classifier from loaded tensors.
    ///
    /// # Errors
    ///
    /// Returns an error if a required tensor is missing or has the wrong shape.
    pub fn new(vb: &VarBuilder, labels: LabelEncoder) -> Result<Self> {
        let linear = linear(FEATURE_COUNT, labels.len(), vb.pp("linear"))
            .context("Expected linear.weight [classes, features] and linear.bias [classes]")?;
        let scaler = if vb.contains_tensor("scaler.mean") {
            let scaler_vb = vb.pp("scaler");
            let mean = scaler_vb.get(FEATURE_COUNT, "mean")?;
            let scale = scaler_vb
                .get(FEATURE_COUNT, "scale")
                .context("scaler.mean present without scaler.scale")?;
            Some(Scaler::new(mean, &scale)?)
        } else {
            None
        };
        Ok(Self {
            linear,
            scaler,
            labels,
            device: vb.device().clone(),
        })
    }

    /// Class names in output order.
    #[must_use]
    pub const fn labels(&self) -> &LabelEncoder {
        &self.labels
    }

    fn probabilities(&self, features: &FeatureVector) -> Result<Vec<f32>> {
        let x = Tensor::from_slice(features.as_slice(), (1, FEATURE_COUNT), &self.device)?;
        let x = match &self.scaler {
            Some(scaler) => scaler.apply(&x)?,
            None => x,
        };
        let logits = self.linear.forward(&x)?;
        let probs = candle_nn::ops::softmax_last_dim(&logits)?;
        Ok(probs.squeeze(0)?.to_vec1()?)
    }

    fn label_of(&self, probs: &[f32]) -> Result<(String, f32)> {
        let index = argmax(probs).context("Classifier produced no scores")?;
        let label = self
            .labels
            .label(index)
            .with_context(|| format!("No label for class {index}"))?;
        debug!(label, confidence = probs[index], "emotion predicted");
        Ok((label.to_string(), probs[index]))
    }
}

impl EmotionClassifier for LinearEmotionClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<String> {
        self.classify(features).map(|(label, _)| label)
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Option<Vec<f32>>> {
        self.probabilities(features).map(Some)
    }

    fn classify(&self, features: &FeatureVector) -> Result<(String, f32)> {
        self.label_of(&self.probabilities(features)?)
    }
}
