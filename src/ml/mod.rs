// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The recognition model and everything that drives it.
//
// Tensor code (model.rs, ctc.rs, recognizer.rs) is Burn specific.
// The training and validation loops only see the Model and
// DataSource traits, so they are tested with plain fakes.
//
//   model.rs         — CRNN: 3 conv blocks + linear head,
//                      log-softmax over charset + blank per
//                      time step (one step per 4 pixel columns)
//
//   ctc.rs           — CTC loss as a log-space forward pass
//
//   decoder.rs       — Best-path and prefix beam search decoding
//
//   recognizer.rs    — BurnRecognizer: the Model implementation
//                      that trains with Adam and decodes outputs
//
//   error_metrics.rs — Edit distance, CER and word accuracy
//
//   validator.rs     — One sweep over the validation partition
//
//   trainer.rs       — Epoch loop with early stopping and
//                      best-checkpoint saving
//
//   inferencer.rs    — Runs a single image through a model that
//                      only accepts full batches
//
//   stop.rs          — Cooperative cancellation flag
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Shi et al. (2016) CRNN
//            Graves et al. (2006) Connectionist Temporal Classification

/// Convolutional recognition network
pub mod model;

/// Connectionist temporal classification loss
pub mod ctc;

/// CTC output decoding
pub mod decoder;

/// Burn-backed implementation of the Model trait
pub mod recognizer;

/// Character error rate and word accuracy
pub mod error_metrics;

/// Validation sweep
pub mod validator;

/// Training loop with early stopping
pub mod trainer;

/// Single-image inference over a fixed-batch model
pub mod inferencer;

/// Stop flag shared with long-running loops
pub mod stop;
