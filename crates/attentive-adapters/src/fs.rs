//! Filesystem adapter for loading frame images.

use std::path::Path;

use anyhow::{bail, Context, Result};
use image::DynamicImage;
use tracing::debug;

/// Frame image extensions the decoder is built for.
const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Checks if a path has a supported frame image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.as_str()))
}

/// Loads a frame image from the filesystem.
///
/// # Errors
///
/// Returns an error if the extension is unsupported or the file cannot be
/// read or decoded.
pub fn load_frame(path: &Path) -> Result<DynamicImage> {
    if !is_supported_image(path) {
        bail!("Unsupported frame image type: {}", path.display());
    }
    let image =
        image::open(path).with_context(|| format!("Failed to open frame: {}", path.display()))?;
    debug!(
        width = image.width(),
        height = image.height(),
        "Loaded frame {}",
        path.display()
    );
    Ok(image)
}
