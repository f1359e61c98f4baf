// ============================================================
// Layer 5b — Text Layer
// ============================================================
// Turns recognized words back into a sentence:
//
//   assembler.rs — orders word fragments by their image name
//                  and joins them with spaces
//
//   corrector.rs — word-frequency spelling correction applied
//                  once to the assembled sentence
//
// Nothing here touches tensors or images, only strings.

/// Fragment ordering and sentence assembly
pub mod assembler;

/// Language-model spelling correction
pub mod corrector;
