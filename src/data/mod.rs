// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from the IAM word index on disk
// all the way to tensor batches.
//
// The pipeline flows in this order:
//
//   words.txt + word images
//       │
//       ▼
//   WordDataLoader    → parses the index, splits train/validation
//       │
//       ▼
//   ImagePreprocessor → grayscale, fit to 128×32, standardise
//       │
//       ▼
//   Batch             → fixed-size, padded with the last sample
//       │
//       ▼
//   ImageBatcher      → stacks images into a [N, 1, H, W] tensor
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Parses IAM words.txt and serves batches (implements DataSource)
pub mod loader;

/// Resizes and normalises word images
pub mod preprocessor;

/// Labelled word samples and CTC label truncation
pub mod dataset;

/// Converts domain batches into tensors
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
