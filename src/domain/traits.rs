// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer works against these traits, so a new
// corpus format or a different classifier plugs in without
// touching the use cases.

use anyhow::Result;

use crate::domain::{prediction::Prediction, sentence::AspectSentence};

// ─── SentenceSource ───────────────────────────────────────────────────────────
/// Anything that can produce labelled aspect sentences.
///
/// Implementations:
///   - CorpusLoader → line-triple text files
pub trait SentenceSource {
    fn load_all(&self) -> Result<Vec<AspectSentence>>;
}

// ─── SentimentClassifier ──────────────────────────────────────────────────────
/// Anything that can judge the sentiment towards a target.
///
/// `sentence` marks the target position with `$T$`.
pub trait SentimentClassifier {
    fn classify(&self, sentence: &str, target: &str) -> Result<Prediction>;
}
