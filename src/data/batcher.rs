// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Converts a domain Batch into tensors on the target device.
//
// How batching works here:
//   Input:  Batch of N WordImages, each H × W
//   Output: images tensor of shape [N, 1, H, W]
//           + label index sequences for the CTC loss
//
//   We flatten all pixels into one long Vec, then reshape:
//   [i1_p1, i1_p2, ..., i1_pHW, i2_p1, ..., iN_pHW] → [N, 1, H, W]
//
// Every image has already been resized to the same geometry by
// the preprocessor, so no dynamic padding is needed here.
//
// Reference: Burn Book §4 (Batcher)

use burn::prelude::*;

use crate::domain::batch::{Batch, Charset};
use crate::domain::error::{PipelineError, Result};

/// A batch of word images ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Pixels — shape: [batch_size, 1, height, width]
    pub images: Tensor<B, 4>,

    /// Ground truth as class indices, one Vec per image.
    /// Empty when the batch carries no ground truth.
    pub targets: Vec<Vec<usize>>,
}

/// Holds the target device so tensors are created on the correct GPU/CPU.
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Stack the images of `batch` into one [N, 1, H, W] tensor.
    /// Labels are ignored, which is all inference needs.
    pub fn images(&self, batch: &Batch) -> Result<Tensor<B, 4>> {
        let images = batch.images();
        let first  = images
            .first()
            .ok_or_else(|| PipelineError::data("cannot tensorise an empty batch"))?;
        let (height, width) = (first.height, first.width);

        if images.iter().any(|img| img.height != height || img.width != width) {
            return Err(PipelineError::data("images in one batch must share a geometry"));
        }

        let flat: Vec<f32> = images
            .iter()
            .flat_map(|img| img.pixels.iter().copied())
            .collect();

        Ok(Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
            .reshape([images.len(), 1, height, width]))
    }

    /// Stack the images of `batch` and encode its labels with `charset`.
    pub fn batch(&self, batch: &Batch, charset: &Charset) -> Result<ImageBatch<B>> {
        let images = self.images(batch)?;

        let targets = match batch.ground_truth() {
            Some(texts) => texts
                .iter()
                .map(|t| charset.encode(t))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(ImageBatch { images, targets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::batch::WordImage;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shape_and_targets() {
        let device  = Default::default();
        let batcher = ImageBatcher::<NdArray>::new(device);
        let image   = WordImage::new(4, 2, vec![0.5; 8]).unwrap();
        let batch   = Batch::labelled(vec![(image, "ba".to_string())], 3).unwrap();
        let charset = Charset::from_texts(["ab"]);

        let out = batcher.batch(&batch, &charset).unwrap();
        assert_eq!(out.images.dims(), [3, 1, 2, 4]);
        assert_eq!(out.targets, vec![vec![1, 0]; 3]);
    }

    #[test]
    fn test_unknown_character_rejected() {
        let batcher = ImageBatcher::<NdArray>::new(Default::default());
        let image   = WordImage::new(1, 1, vec![0.0]).unwrap();
        let batch   = Batch::labelled(vec![(image, "z".to_string())], 1).unwrap();
        assert!(batcher.batch(&batch, &Charset::from_texts(["ab"])).is_err());
    }

    #[test]
    fn test_images_without_labels() {
        let batcher = ImageBatcher::<NdArray>::new(Default::default());
        let image   = WordImage::new(3, 2, vec![1.0; 6]).unwrap();
        let batch   = Batch::unlabelled(vec![image], 2).unwrap();
        assert_eq!(batcher.images(&batch).unwrap().dims(), [2, 1, 2, 3]);
    }
}
