// ============================================================
// Layer 4 — Sentence Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<SentenceSample>
// into tensors.
//
// How batching works here:
//   Input:  N samples, each with a left, target and right segment
//   Output: per segment, ids [N, max_len] and lengths [N],
//           plus labels [N]
//
//   Every segment is already padded to its limit when it is
//   encoded, so stacking is a flatten + reshape:
//   [s1_t1, ..., s1_tL, s2_t1, ..., sN_tL] → [N, L]
//
// The lengths travel with the ids; the model derives all of
// its masks from them.
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::{EncodedSegment, EncodedSentence, SentenceSample};
use crate::ml::sentiment::{TokenSegment, TokenSegments};

#[derive(Debug, Clone)]
pub struct SentenceBatch<B: Backend> {
    pub segments: TokenSegments<B>,
    /// Class ids — shape: [batch_size]
    pub labels:   Tensor<B, 1, Int>,
}

#[derive(Clone, Debug, Default)]
pub struct SentenceBatcher;

impl SentenceBatcher {
    pub fn new() -> Self {
        Self
    }
}

/// Stack encoded sentences without labels; inference uses this directly.
pub fn stack_sentences<B: Backend>(
    sentences: &[&EncodedSentence],
    device:    &B::Device,
) -> TokenSegments<B> {
    TokenSegments {
        left:   stack_segment(sentences.iter().map(|s| &s.left), device),
        target: stack_segment(sentences.iter().map(|s| &s.target), device),
        right:  stack_segment(sentences.iter().map(|s| &s.right), device),
    }
}

fn stack_segment<'a, B: Backend>(
    segments: impl Iterator<Item = &'a EncodedSegment> + Clone,
    device:   &B::Device,
) -> TokenSegment<B> {
    let batch_size = segments.clone().count();
    let max_len    = segments.clone().next().map_or(0, |s| s.ids.len());

    let ids: Vec<i32> = segments
        .clone()
        .flat_map(|s| s.ids.iter().map(|&id| id as i32))
        .collect();
    let lengths: Vec<i32> = segments.map(|s| s.length as i32).collect();

    TokenSegment {
        ids: Tensor::<B, 1, Int>::from_ints(ids.as_slice(), device)
            .reshape([batch_size, max_len]),
        lengths: Tensor::<B, 1, Int>::from_ints(lengths.as_slice(), device),
    }
}

impl<B: Backend> Batcher<B, SentenceSample, SentenceBatch<B>> for SentenceBatcher {
    fn batch(&self, items: Vec<SentenceSample>, device: &B::Device) -> SentenceBatch<B> {
        let sentences: Vec<&EncodedSentence> = items.iter().map(|s| &s.sentence).collect();
        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();

        SentenceBatch {
            segments: stack_sentences(&sentences, device),
            labels:   Tensor::<B, 1, Int>::from_ints(labels.as_slice(), device),
        }
    }
}
