// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The pipeline's control loops never see a neural network or a
// dataset on disk. They see these traits:
//
//   Model          → BurnRecognizer (ml layer), fakes in tests
//   DataSource     → WordDataLoader (data layer), fakes in tests
//   WordRecognizer → FixedBatchAdapter (ml layer)
//   Corrector      → FrequencyCorrector (text layer)
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::batch::{Batch, Charset, RecognitionResult, WordImage};
use crate::domain::error::Result;

// ─── Model ────────────────────────────────────────────────────────────────────
/// A text recognizer that works on whole batches of a fixed size.
pub trait Model {
    /// The one batch size this model accepts.
    fn batch_size(&self) -> usize;

    /// One optimisation step. Returns the batch loss.
    fn train_batch(&mut self, batch: &Batch) -> Result<f64>;

    /// Recognize every image in the batch, in order.
    fn infer_batch(&mut self, batch: &Batch) -> Result<RecognitionResult>;

    /// Persist the current parameters as the checkpoint.
    fn save(&mut self) -> Result<()>;
}

// ─── DataSource ───────────────────────────────────────────────────────────────
/// A labelled dataset split into a training and a validation partition.
///
/// Selecting a partition rewinds its iterator; `has_next()` going
/// false is the normal end of the partition.
pub trait DataSource {
    fn select_training_partition(&mut self);

    fn select_validation_partition(&mut self);

    fn has_next(&self) -> bool;

    fn next_batch(&mut self) -> Result<Batch>;

    /// (1-based index of the next batch, total batches in the partition)
    fn iterator_position(&self) -> (usize, usize);

    /// Every character that appears in the ground truth.
    fn charset(&self) -> &Charset;
}

// ─── WordRecognizer ───────────────────────────────────────────────────────────
/// Recognizes a single word image.
///
/// The shipped implementation pads the image into a full batch
/// because the model only accepts one batch size; a model with
/// true single-image inference can implement this directly.
pub trait WordRecognizer {
    fn recognize(&mut self, image: WordImage) -> Result<String>;
}

// ─── Corrector ────────────────────────────────────────────────────────────────
/// A spelling corrector backed by a loaded language model.
pub trait Corrector {
    /// Return `text` with misspelt words replaced.
    fn correct(&self, text: &str) -> String;

    /// Name of this corrector for logging.
    fn name(&self) -> &str;
}
