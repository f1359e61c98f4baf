// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one goal per CLI command: train, validate or infer.
//
// Rules for this layer:
//   - No tensor code here (that's Layer 5)
//   - No argument parsing or printing (that's Layer 1)
//   - Only workflow coordination
//
// Errors from the layers below are typed PipelineErrors; here
// they are wrapped with anyhow context for the user.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Serialisable settings shared by every workflow
pub mod config;

// The training workflow
pub mod train_use_case;

// Re-validating a trained model
pub mod validate_use_case;

// Word images → corrected sentence
pub mod infer_use_case;
