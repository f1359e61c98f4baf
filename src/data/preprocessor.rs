// ============================================================
// Layer 4 — Word Image Preprocessor
// ============================================================
// Turns an arbitrary word image into the fixed-size input the
// recognizer expects:
//
//   1. Decode and convert to 8-bit grayscale
//   2. Scale down (never up past the target) keeping aspect ratio
//      so the word fits inside width × height
//   3. Paste into the top-left corner of a white canvas
//   4. Standardise to zero mean and unit variance
//
//   ┌────────────────────────────┐
//   │ hello       (white pad)    │  height = 32
//   └────────────────────────────┘
//              width = 128

use std::path::Path;

use image::{imageops, imageops::FilterType, GrayImage, Luma};

use crate::domain::batch::WordImage;
use crate::domain::error::{PipelineError, Result};

/// Resizes and normalises word images to one geometry.
#[derive(Debug, Clone, Copy)]
pub struct ImagePreprocessor {
    width:  u32,
    height: u32,
}

impl ImagePreprocessor {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Decode the image at `path` and prepare it.
    pub fn load(&self, path: &Path) -> Result<WordImage> {
        let img = image::open(path)
            .map_err(|source| PipelineError::ImageLoad { path: path.to_path_buf(), source })?
            .to_luma8();
        self.prepare(&img)
    }

    /// Fit `img` onto a white canvas of the target size and normalise it.
    pub fn prepare(&self, img: &GrayImage) -> Result<WordImage> {
        let mut canvas = GrayImage::from_pixel(self.width, self.height, Luma([255u8]));

        // Damaged files in IAM decode to 0×0; they become a blank canvas
        if img.width() > 0 && img.height() > 0 {
            let fx = img.width() as f32 / self.width as f32;
            let fy = img.height() as f32 / self.height as f32;
            let f  = fx.max(fy).max(1.0);

            let w = ((img.width() as f32 / f) as u32).clamp(1, self.width);
            let h = ((img.height() as f32 / f) as u32).clamp(1, self.height);

            let resized = imageops::resize(img, w, h, FilterType::Triangle);
            imageops::overlay(&mut canvas, &resized, 0, 0);
        }

        WordImage::new(
            self.width as usize,
            self.height as usize,
            standardise(canvas.as_raw()),
        )
    }
}

/// Zero mean, unit variance. A flat image only gets centred.
fn standardise(raw: &[u8]) -> Vec<f32> {
    let n    = raw.len().max(1) as f32;
    let mean = raw.iter().map(|&p| p as f32).sum::<f32>() / n;
    let var  = raw.iter().map(|&p| (p as f32 - mean).powi(2)).sum::<f32>() / n;
    let std  = var.sqrt();

    raw.iter()
        .map(|&p| {
            let centred = p as f32 - mean;
            if std > 0.0 { centred / std } else { centred }
        })
        .collect()
}
