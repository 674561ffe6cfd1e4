// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence used by several layers:
//
//   checkpoint.rs      — model weights (CompactRecorder), epoch
//                        pointers and the run's TrainConfig
//   tokenizer_store.rs — word-level vocabulary as tokenizer.json
//   embeddings.rs      — GloVe-format pretrained word vectors
//   metrics.rs         — per-epoch CSV log

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Vocabulary building, saving, and loading
pub mod tokenizer_store;

/// Pretrained embedding tables
pub mod embeddings;

/// Training metrics CSV logger
pub mod metrics;
