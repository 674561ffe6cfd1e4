// ============================================================
// Layer 3 — AspectSentence Domain Type
// ============================================================
// A sentence split around one opinion target:
//
//   "the pasta was great but the service was slow"
//    target = "service"
//    left   = [the, pasta, was, great, but, the]
//    right  = [was, slow]
//
// A sentence with several targets becomes several
// AspectSentences, one per target, each with its own label.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentiment expressed towards the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Negative,
    Neutral,
    Positive,
}

impl Polarity {
    /// Ordered by class id.
    pub const ALL: [Polarity; 3] = [Polarity::Negative, Polarity::Neutral, Polarity::Positive];

    pub fn class_id(self) -> usize {
        match self {
            Polarity::Negative => 0,
            Polarity::Neutral  => 1,
            Polarity::Positive => 2,
        }
    }

    pub fn from_class_id(id: usize) -> Option<Self> {
        Self::ALL.get(id).copied()
    }

    /// Parse the corpus label: `-1`, `0` or `1`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "-1" => Some(Polarity::Negative),
            "0"  => Some(Polarity::Neutral),
            "1"  => Some(Polarity::Positive),
            _    => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Polarity::Negative => "negative",
            Polarity::Neutral  => "neutral",
            Polarity::Positive => "positive",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (left, target, right) split of a tokenised sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectSentence {
    pub left:     Vec<String>,
    pub target:   Vec<String>,
    pub right:    Vec<String>,
    /// Missing for sentences submitted for classification
    pub polarity: Option<Polarity>,
}

impl AspectSentence {
    pub fn new(
        left:     Vec<String>,
        target:   Vec<String>,
        right:    Vec<String>,
        polarity: Option<Polarity>,
    ) -> Self {
        Self { left, target, right, polarity }
    }

    /// All words in sentence order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.left
            .iter()
            .chain(&self.target)
            .chain(&self.right)
            .map(String::as_str)
    }
}
