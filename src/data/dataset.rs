// ============================================================
// Layer 4 — Sentence Dataset
// ============================================================
// Fixed-length, padded id sequences per segment plus the true
// lengths the model masks with.
//
// Truncation keeps the words nearest the target:
//   left   → last  max_sentence_length words
//   target → first max_target_length words
//   right  → first max_sentence_length words

use anyhow::{bail, Context, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::domain::sentence::AspectSentence;
use crate::infra::tokenizer_store::{encode_words, PAD_ID};

/// Padded lengths of the three segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentLimits {
    pub max_sentence_length: usize,
    pub max_target_length:   usize,
}

impl SegmentLimits {
    pub fn new(max_sentence_length: usize, max_target_length: usize) -> Self {
        Self { max_sentence_length, max_target_length }
    }

    /// The words the model actually sees.
    pub fn truncate(&self, sentence: &AspectSentence) -> AspectSentence {
        let skip = sentence.left.len().saturating_sub(self.max_sentence_length);
        AspectSentence::new(
            sentence.left[skip..].to_vec(),
            sentence.target.iter().take(self.max_target_length).cloned().collect(),
            sentence.right.iter().take(self.max_sentence_length).cloned().collect(),
            sentence.polarity,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedSegment {
    /// Padded with [PAD] up to the segment's limit
    pub ids:    Vec<u32>,
    pub length: usize,
}

impl EncodedSegment {
    fn new(mut ids: Vec<u32>, max_len: usize) -> Self {
        let length = ids.len();
        ids.resize(max_len, PAD_ID);
        Self { ids, length }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedSentence {
    pub left:   EncodedSegment,
    pub target: EncodedSegment,
    pub right:  EncodedSegment,
}

impl EncodedSentence {
    /// Truncate, encode and pad. An empty target is rejected;
    /// empty contexts are fine.
    pub fn encode(
        sentence:  &AspectSentence,
        tokenizer: &Tokenizer,
        limits:    &SegmentLimits,
    ) -> Result<Self> {
        let s = limits.truncate(sentence);
        if s.target.is_empty() {
            bail!("sentence has an empty target");
        }
        Ok(Self {
            left:   EncodedSegment::new(encode_words(tokenizer, &s.left)?, limits.max_sentence_length),
            target: EncodedSegment::new(encode_words(tokenizer, &s.target)?, limits.max_target_length),
            right:  EncodedSegment::new(encode_words(tokenizer, &s.right)?, limits.max_sentence_length),
        })
    }
}

/// One labelled training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceSample {
    pub sentence: EncodedSentence,
    /// Polarity class id
    pub label:    usize,
}

impl SentenceSample {
    pub fn encode(
        sentence:  &AspectSentence,
        tokenizer: &Tokenizer,
        limits:    &SegmentLimits,
    ) -> Result<Self> {
        let polarity = sentence
            .polarity
            .context("cannot build a training sample from an unlabelled sentence")?;
        Ok(Self {
            sentence: EncodedSentence::encode(sentence, tokenizer, limits)?,
            label:    polarity.class_id(),
        })
    }

    /// Encode a whole corpus; the error names the failing index.
    pub fn encode_all(
        sentences: &[AspectSentence],
        tokenizer: &Tokenizer,
        limits:    &SegmentLimits,
    ) -> Result<Vec<Self>> {
        sentences
            .iter()
            .enumerate()
            .map(|(i, s)| {
                Self::encode(s, tokenizer, limits).with_context(|| format!("sentence #{i}"))
            })
            .collect()
    }
}

pub struct SentenceDataset {
    samples: Vec<SentenceSample>,
}

impl SentenceDataset {
    pub fn new(samples: Vec<SentenceSample>) -> Self { Self { samples } }

    /// Number of samples per class id.
    pub fn class_counts(&self, num_classes: usize) -> Vec<usize> {
        let mut counts = vec![0; num_classes];
        for s in &self.samples {
            if let Some(c) = counts.get_mut(s.label) {
                *c += 1;
            }
        }
        counts
    }
}

impl Dataset<SentenceSample> for SentenceDataset {
    fn get(&self, index: usize) -> Option<SentenceSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
