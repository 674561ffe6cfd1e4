// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing the problem:
// sentences split around a target, polarities, predictions.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only plain structs, enums and traits

/// A sentence split around its opinion target, plus its polarity
pub mod sentence;

/// Classifier output with the attention report
pub mod prediction;

/// Abstractions the other layers implement
pub mod traits;
