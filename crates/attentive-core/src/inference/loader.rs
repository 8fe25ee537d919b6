//! Safetensors weight loading.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use safetensors::SafeTensors;
use tracing::debug;

/// Loads classifier weights from a safetensors file into a `VarBuilder`.
///
/// Every tensor must be floating point; lookups through the returned builder
/// yield `f32`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid safetensors, or
/// holds a non-float tensor.
pub fn load_safetensors(path: impl AsRef<Path>, device: &Device) -> Result<VarBuilder<'static>> {
    let path = path.as_ref();
    debug!("Loading weights from {}", path.display());

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read model file: {}", path.display()))?;
    let archive = SafeTensors::deserialize(&bytes)
        .with_context(|| format!("Failed to parse safetensors: {}", path.display()))?;

    let weights = archive
        .tensors()
        .into_iter()
        .map(|(name, view)| {
            let dtype = float_dtype(view.dtype())
                .with_context(|| format!("Tensor '{name}' in {}", path.display()))?;
            let tensor = Tensor::from_raw_buffer(view.data(), dtype, view.shape(), device)
                .with_context(|| format!("Failed to create tensor '{name}'"))?;
            Ok((name, tensor))
        })
        .collect::<Result<HashMap<String, Tensor>>>()?;
    debug!(tensors = weights.len(), "weights loaded");

    Ok(VarBuilder::from_tensors(weights, DType::F32, device))
}

fn float_dtype(dtype: safetensors::Dtype) -> Result<DType> {
    match dtype {
        safetensors::Dtype::F32 => Ok(DType::F32),
        safetensors::Dtype::F64 => Ok(DType::F64),
        safetensors::Dtype::F16 => Ok(DType::F16),
        safetensors::Dtype::BF16 => Ok(DType::BF16),
        other => anyhow::bail!("Expected floating point weights, found {other:?}"),
    }
}
