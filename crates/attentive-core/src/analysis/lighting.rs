//! Lighting assessment and low-light enhancement.
//!
//! Quality combines a brightness score (penalizing dark and blown-out frames)
//! with a contrast score from the luminance spread. Poorly lit frames are
//! enhanced with contrast-limited adaptive histogram equalization (CLAHE) on
//! the luma channel before landmark detection.

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

/// Lowest reported lighting quality.
pub const MIN_QUALITY: f64 = 0.3;

/// 256-bin histogram of luminance values.
#[derive(Debug, Clone)]
pub struct Histogram {
    bins: [u64; 256],
    total: u64,
}

impl Histogram {
    /// Compute histogram from grayscale image.
    #[must_use]
    pub fn from_luma(image: &GrayImage) -> Self {
        let mut bins = [0u64; 256];
        for pixel in image.pixels() {
            bins[usize::from(pixel.0[0])] += 1;
        }
        Self::from_bins(bins)
    }

    fn from_bins(bins: [u64; 256]) -> Self {
        let total = bins.iter().sum();
        Self { bins, total }
    }

    /// Returns the total pixel count.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Mean luminance, 0 for an empty histogram.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let sum: u64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(i, &count)| (i as u64) * count)
            .sum();
        sum as f64 / self.total as f64
    }

    /// Population standard deviation of luminance.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .bins
            .iter()
            .enumerate()
            .map(|(i, &count)| (i as f64 - mean).powi(2) * count as f64)
            .sum::<f64>()
            / self.total as f64;
        variance.sqrt()
    }

    /// Lighting quality in `[0.3, 1.0]`.
    #[must_use]
    pub fn lighting_quality(&self) -> f64 {
        let mean = self.mean();
        let brightness = if mean < 60.0 {
            mean / 60.0
        } else if mean > 200.0 {
            (255.0 - mean) / 55.0
        } else {
            1.0
        };
        let contrast = (self.std_dev() / 50.0).min(1.0);
        0.4f64.mul_add(contrast, 0.6 * brightness).clamp(MIN_QUALITY, 1.0)
    }
}

/// Lighting quality of a frame in `[0.3, 1.0]`.
#[must_use]
pub fn assess_lighting(image: &DynamicImage) -> f64 {
    Histogram::from_luma(&image.to_luma8()).lighting_quality()
}

/// CLAHE parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaheConfig {
    /// Contrast limit relative to a flat histogram.
    pub clip_limit: f64,
    /// Tiles per image axis.
    pub tiles: u32,
}

impl Default for ClaheConfig {
    fn default() -> Self {
        Self {
            clip_limit: 2.0,
            tiles: 8,
        }
    }
}

/// Enhances contrast on the luma channel, keeping chroma.
///
/// Color is converted to full-range BT.601 `YCbCr`, the luma is equalized
/// and the result converted back to RGB.
#[must_use]
pub fn enhance_contrast(image: &DynamicImage, config: &ClaheConfig) -> DynamicImage {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut luma = GrayImage::new(width, height);
    for (src, dst) in rgb.pixels().zip(luma.pixels_mut()) {
        *dst = Luma([to_u8(ycbcr(*src).0)]);
    }
    let equalized = clahe(&luma, config);

    let mut out = RgbImage::new(width, height);
    for ((src, y), dst) in rgb.pixels().zip(equalized.pixels()).zip(out.pixels_mut()) {
        let (_, cb, cr) = ycbcr(*src);
        *dst = rgb_from_ycbcr(f64::from(y.0[0]), cb, cr);
    }
    DynamicImage::ImageRgb8(out)
}

fn ycbcr(Rgb([r, g, b]): Rgb<u8>) -> (f64, f64, f64) {
    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
    (
        0.299 * r + 0.587 * g + 0.114 * b,
        128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b,
        128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b,
    )
}

fn rgb_from_ycbcr(y: f64, cb: f64, cr: f64) -> Rgb<u8> {
    let (cb, cr) = (cb - 128.0, cr - 128.0);
    Rgb([
        to_u8(1.402f64.mul_add(cr, y)),
        to_u8(0.714_136f64.mul_add(-cr, 0.344_136f64.mul_add(-cb, y))),
        to_u8(1.772f64.mul_add(cb, y)),
    ])
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(value: f64) -> u8 {
    // Clamped to the u8 range first
    value.round().clamp(0.0, 255.0) as u8
}

/// Contrast-limited adaptive histogram equalization of a grayscale image.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn clahe(image: &GrayImage, config: &ClaheConfig) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }
    let tile_w = width.div_ceil(config.tiles.clamp(1, width));
    let tile_h = height.div_ceil(config.tiles.clamp(1, height));
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            let mut bins = [0u64; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    bins[usize::from(image.get_pixel(x, y).0[0])] += 1;
                }
            }
            luts.push(tile_lut(bins, config.clip_limit));
        }
    }

    let lut_at = |tx: i64, ty: i64, value: u8| -> f64 {
        let tx = tx.clamp(0, i64::from(tiles_x) - 1) as usize;
        let ty = ty.clamp(0, i64::from(tiles_y) - 1) as usize;
        f64::from(luts[ty * tiles_x as usize + tx][usize::from(value)])
    };

    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let value = pixel.0[0];
        let fx = (f64::from(x) + 0.5) / f64::from(tile_w) - 0.5;
        let fy = (f64::from(y) + 0.5) / f64::from(tile_h) - 0.5;
        let (gx, gy) = (fx.floor(), fy.floor());
        let (ax, ay) = (fx - gx, fy - gy);
        let (tx, ty) = (gx as i64, gy as i64);

        let top = lut_at(tx, ty, value) * (1.0 - ax) + lut_at(tx + 1, ty, value) * ax;
        let bottom = lut_at(tx, ty + 1, value) * (1.0 - ax) + lut_at(tx + 1, ty + 1, value) * ax;
        out.put_pixel(x, y, Luma([to_u8(top * (1.0 - ay) + bottom * ay)]));
    }
    out
}

/// Clipped, redistributed cumulative mapping for one tile.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn tile_lut(mut bins: [u64; 256], clip_limit: f64) -> [u8; 256] {
    let area = Histogram::from_bins(bins).total();
    let mut lut = [0u8; 256];
    if area == 0 {
        return lut;
    }
    let clip = ((clip_limit * area as f64 / 256.0) as u64).max(1);
    let mut excess = 0;
    for bin in &mut bins {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }
    let share = excess / 256;
    for bin in &mut bins {
        *bin += share;
    }
    // Leftover counts are spread evenly over the range.
    let remainder = (excess % 256) as usize;
    if remainder > 0 {
        let step = (256 / remainder).max(1);
        for bin in bins.iter_mut().step_by(step).take(remainder) {
            *bin += 1;
        }
    }

    let scale = 255.0 / area as f64;
    let mut cumulative = 0;
    for (slot, count) in lut.iter_mut().zip(bins) {
        cumulative += count;
        *slot = to_u8(cumulative as f64 * scale);
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(value: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([value])))
    }

    fn checkerboard(a: u8, b: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(32, 32, |x, y| {
            Luma([if (x + y) % 2 == 0 { a } else { b }])
        }))
    }

    // === Histogram Tests ===

    #[test]
    fn test_histogram_stats() {
        let hist = Histogram::from_luma(&checkerboard(0, 200).to_luma8());
        assert_eq!(hist.total(), 1024);
        assert!((hist.mean() - 100.0).abs() < 1e-9);
        assert!((hist.std_dev() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_histogram() {
        let hist = Histogram::from_luma(&GrayImage::new(0, 0));
        assert!(hist.mean().abs() < f64::EPSILON);
        assert!(hist.std_dev().abs() < f64::EPSILON);
    }

    // === Quality Tests ===

    #[test]
    fn test_flat_mid_grey_scores_brightness_only() {
        assert!((assess_lighting(&uniform(128)) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_dark_frame_clamps_to_floor() {
        assert!((assess_lighting(&uniform(30)) - MIN_QUALITY).abs() < 1e-9);
        assert!((assess_lighting(&uniform(0)) - MIN_QUALITY).abs() < 1e-9);
    }

    #[test]
    fn test_bright_frame_penalized() {
        assert!((assess_lighting(&uniform(250)) - MIN_QUALITY).abs() < 1e-9);
    }

    #[test]
    fn test_high_contrast_is_best() {
        assert!((assess_lighting(&checkerboard(0, 255)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_quality_always_in_range() {
        for a in (0..=255).step_by(51) {
            for b in (0..=255).step_by(85) {
                let q = assess_lighting(&checkerboard(a, b));
                assert!((MIN_QUALITY..=1.0).contains(&q), "{a} {b} -> {q}");
            }
        }
    }

    // === Enhancement Tests ===

    #[test]
    fn test_clahe_spreads_low_contrast() {
        let flat = GrayImage::from_fn(128, 128, |x, y| {
            Luma([100 + u8::try_from((x * 7 + y * 13) % 16).unwrap_or(0)])
        });
        let before = Histogram::from_luma(&flat).std_dev();
        let after = Histogram::from_luma(&clahe(&flat, &ClaheConfig::default())).std_dev();
        assert!(after > before, "{before} -> {after}");
    }

    #[test]
    fn test_enhance_keeps_dimensions() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(13, 7, Rgb([40, 30, 20])));
        let out = enhance_contrast(&image, &ClaheConfig::default());
        assert_eq!((out.width(), out.height()), (13, 7));
    }

    #[test]
    fn test_enhance_grey_stays_grey() {
        let image = checkerboard(20, 60);
        let out = enhance_contrast(&image, &ClaheConfig::default()).to_rgb8();
        for pixel in out.pixels() {
            let [r, g, b] = pixel.0;
            assert!(r.abs_diff(g) <= 1 && g.abs_diff(b) <= 1, "{:?}", pixel.0);
        }
    }

    #[test]
    fn test_clahe_empty_image() {
        let empty = GrayImage::new(0, 0);
        assert_eq!(clahe(&empty, &ClaheConfig::default()).dimensions(), (0, 0));
    }
}
