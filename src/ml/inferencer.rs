// ============================================================
// Layer 5 — Single-Image Inference Adapter
// ============================================================
// The recognizer only accepts batches of exactly `batch_size`
// images, so a single word image cannot be submitted on its own.
//
// The adapter fills a whole batch with copies of the one image,
// runs the batch, and keeps the first result. Every entry is the
// same input, so every result is the same text.
//
//   image ──► [image, image, ..., image]  (batch_size copies)
//                       │ infer_batch
//                       ▼
//             ["word", "word", ..., "word"] ──► "word"
//
// Models that can run a single image should implement
// WordRecognizer directly instead of going through this adapter.

use crate::domain::batch::{Batch, WordImage};
use crate::domain::error::{PipelineError, Result};
use crate::domain::traits::{Model, WordRecognizer};

pub struct FixedBatchAdapter<'m, M: Model> {
    model: &'m mut M,
}

impl<'m, M: Model> FixedBatchAdapter<'m, M> {
    pub fn new(model: &'m mut M) -> Self {
        Self { model }
    }

    /// A batch holding `batch_size` copies of `image`, no ground truth.
    pub fn replicate(&self, image: WordImage) -> Result<Batch> {
        let size = self.model.batch_size();
        Batch::unlabelled(vec![image; size], size)
    }
}

impl<M: Model> WordRecognizer for FixedBatchAdapter<'_, M> {
    fn recognize(&mut self, image: WordImage) -> Result<String> {
        let batch = self.replicate(image)?;
        self.model
            .infer_batch(&batch)?
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::inference("model returned no results"))
    }
}

/// Recognize one image with a fixed-batch model.
pub fn infer_single<M: Model>(model: &mut M, image: WordImage) -> Result<String> {
    FixedBatchAdapter::new(model).recognize(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::batch::RecognitionResult;

    /// Remembers the last batch and echoes the first pixel per entry.
    struct EchoModel {
        batch_size: usize,
        seen:       Option<Batch>,
    }

    impl Model for EchoModel {
        fn batch_size(&self) -> usize {
            self.batch_size
        }
        fn train_batch(&mut self, _batch: &Batch) -> Result<f64> {
            Ok(0.0)
        }
        fn infer_batch(&mut self, batch: &Batch) -> Result<RecognitionResult> {
            self.seen = Some(batch.clone());
            Ok(batch.images().iter().map(|img| format!("w{}", img.pixels[0])).collect())
        }
        fn save(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_batch_of_32_identical_copies() {
        let mut model = EchoModel { batch_size: 32, seen: None };
        let image     = WordImage::new(2, 1, vec![7.0, 1.0]).unwrap();

        let text = infer_single(&mut model, image.clone()).unwrap();
        assert_eq!(text, "w7");

        let batch = model.seen.unwrap();
        assert_eq!(batch.len(), 32);
        assert!(batch.ground_truth().is_none());
        assert!(batch.images().iter().all(|img| *img == image));
    }

    #[test]
    fn test_any_index_gives_same_text() {
        let mut model = EchoModel { batch_size: 32, seen: None };
        let image     = WordImage::new(1, 1, vec![3.0]).unwrap();

        let batch   = FixedBatchAdapter::new(&mut model).replicate(image).unwrap();
        let results = model.infer_batch(&batch).unwrap();
        assert!(results.iter().all(|r| r == &results[0]));
    }

    #[test]
    fn test_empty_result_is_inference_error() {
        struct Silent;
        impl Model for Silent {
            fn batch_size(&self) -> usize { 4 }
            fn train_batch(&mut self, _: &Batch) -> Result<f64> { Ok(0.0) }
            fn infer_batch(&mut self, _: &Batch) -> Result<RecognitionResult> { Ok(Vec::new()) }
            fn save(&mut self) -> Result<()> { Ok(()) }
        }

        let image = WordImage::new(1, 1, vec![0.0]).unwrap();
        let err   = infer_single(&mut Silent, image).unwrap_err();
        assert!(matches!(err, PipelineError::Inference { .. }));
    }
}
