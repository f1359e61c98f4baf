// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything the pipeline persists in the model directory:
//
//   checkpoint.rs    — Model weights (Burn CompactRecorder),
//                      the accuracy record and the pipeline
//                      config JSON. All writes go through a
//                      temp-file-then-rename step.
//
//   charset_store.rs — charList.txt, the character set the
//                      output classes were trained against.
//
//   metrics.rs       — Per-epoch CSV log (loss, CER, word
//                      accuracy, whether the epoch improved).
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint, accuracy record and config persistence
pub mod checkpoint;

/// Character list persistence
pub mod charset_store;

/// Training metrics CSV logger
pub mod metrics;
