//! Success detection via grayscale pixel-difference comparison.
//!
//! Both the reference and the sampled frame are reduced to luminance using
//! the ITU-R BT.601 luma formula, resized to a shared comparison size, and
//! compared pixel by pixel. Similarity is `1 - mean(|a - b|) / 255`, so an
//! image compared with itself always scores exactly 1.0.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use std::path::Path;

use crate::error::{Error, Result};

/// Default similarity required to declare success.
pub const DEFAULT_THRESHOLD: f32 = 0.95;

/// Longest side of the comparison grid. Larger references are scaled down.
const MAX_COMPARE_SIDE: u32 = 256;

/// Outcome of comparing one sample against the reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    pub is_match: bool,
    /// Raw similarity in [0, 1], kept for diagnostics.
    pub similarity: f32,
}

/// Holds the normalized reference image and the match threshold.
#[derive(Debug, Clone)]
pub struct SuccessDetector {
    reference: GrayImage,
    threshold: f32,
}

impl SuccessDetector {
    /// Loads the reference image from disk.
    ///
    /// Fails with `ImageRead` rather than producing a detector that can
    /// never match.
    pub fn from_path(path: &Path, threshold: f32) -> Result<Self> {
        let img = load_image(path)?;
        Self::new(&img, threshold)
    }

    pub fn new(reference: &DynamicImage, threshold: f32) -> Result<Self> {
        if reference.width() == 0 || reference.height() == 0 {
            return Err(Error::ImageDecode("reference image is empty".to_string()));
        }
        let (width, height) = compare_size(reference.width(), reference.height());
        Ok(Self {
            reference: normalize(reference, width, height),
            threshold,
        })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Compares a freshly captured frame against the reference.
    pub fn compare(&self, sample: &DynamicImage) -> Result<MatchResult> {
        if sample.width() == 0 || sample.height() == 0 {
            return Err(Error::ImageDecode("captured frame is empty".to_string()));
        }
        let sample = normalize(sample, self.reference.width(), self.reference.height());
        let similarity = luma_similarity(&self.reference, &sample);
        Ok(MatchResult {
            is_match: similarity >= self.threshold,
            similarity,
        })
    }
}

/// Opens and decodes an image file, tagging failures with the path.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| Error::ImageRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Similarity between two arbitrary images, normalized to the first one's grid.
#[cfg(test)]
pub fn similarity(a: &DynamicImage, b: &DynamicImage) -> Result<f32> {
    let detector = SuccessDetector::new(a, DEFAULT_THRESHOLD)?;
    Ok(detector.compare(b)?.similarity)
}

/// Scales `(width, height)` down so the longest side fits the comparison grid.
fn compare_size(width: u32, height: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= MAX_COMPARE_SIDE {
        return (width, height);
    }
    let scale = MAX_COMPARE_SIDE as f64 / longest as f64;
    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    (w, h)
}

/// Converts to BT.601 luminance and resizes to the given grid.
fn normalize(img: &DynamicImage, width: u32, height: u32) -> GrayImage {
    let rgba = img.to_rgba8();
    let luma: GrayImage = ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
        let p = rgba.get_pixel(x, y);
        let r = p[0] as f32;
        let g = p[1] as f32;
        let b = p[2] as f32;
        Luma([(0.299 * r + 0.587 * g + 0.114 * b).round().min(255.0) as u8])
    });

    if luma.width() == width && luma.height() == height {
        luma
    } else {
        imageops::resize(&luma, width, height, FilterType::Triangle)
    }
}

/// `1 - mean absolute difference / 255` over two same-sized grids.
fn luma_similarity(a: &GrayImage, b: &GrayImage) -> f32 {
    let pixel_count = (a.width() as u64) * (a.height() as u64);
    if pixel_count == 0 {
        return 0.0;
    }

    let total: u64 = a
        .pixels()
        .zip(b.pixels())
        .map(|(pa, pb)| pa[0].abs_diff(pb[0]) as u64)
        .sum();

    let mean = total as f64 / pixel_count as f64;
    (1.0 - mean / 255.0) as f32
}
