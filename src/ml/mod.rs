// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All neural network code lives here.
//
//   layers.rs     — masking helpers, the bidirectional LSTM
//                   encoder, the bilinear attention scorer and
//                   the softmax classifier
//
//   model.rs      — the LCR-Rot-Inverse cascade: target attended
//                   by the context pools, then each context
//                   attended by its target representation
//
//   sentiment.rs  — word embeddings in front of the cascade,
//                   cross entropy + L2 loss
//
//   trainer.rs    — the training loop with validation and
//                   per-epoch checkpoints
//
//   inferencer.rs — loads a checkpoint and classifies sentences
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Zheng & Xia (2018) Left-Center-Right Separated
//            Neural Network with Rotatory Attention

/// Masking utilities and reusable building blocks
pub mod layers;

/// LCR-Rot-Inverse attention cascade
pub mod model;

/// Embedding front end and classification loss
pub mod sentiment;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Inference engine
pub mod inferencer;
