// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits that describe the recognition
// pipeline: what a batch is, what a model can do, what a data
// source must provide, and what can go wrong.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Everything above this layer (application, ml, text) talks to
// the model and the dataset through the traits defined here,
// so the control loops can be tested with in-memory fakes.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Word images, batches and the character vocabulary
pub mod batch;

// (ordering key, text) pairs used to rebuild a sentence
pub mod fragment;

// The error taxonomy shared by every layer below the CLI
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
