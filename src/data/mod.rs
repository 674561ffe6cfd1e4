// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From corpus files to tensor batches:
//
//   corpus .txt (sentence / target / polarity triples)
//       │
//       ▼
//   CorpusLoader      → reads records
//       │
//       ▼
//   Preprocessor      → lowercases, splits at $T$
//       │
//       ▼
//   Tokenizer         → one id per word (infra::tokenizer_store)
//       │
//       ▼
//   SentenceDataset   → padded ids + true lengths per segment
//       │
//       ▼
//   SentenceBatcher   → stacks samples into tensors
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop

/// Reads line-triple sentiment corpora
pub mod loader;

/// Normalises text and splits sentences at the target marker
pub mod preprocessor;

/// Padded samples and Burn's Dataset implementation
pub mod dataset;

/// Burn's Batcher implementation
pub mod batcher;

/// Seeded train/validation split
pub mod splitter;
