// ============================================================
// Layer 5 — Sentiment Model (embeddings + LCR-Rot-Inverse)
// ============================================================
// LcrRotInverse consumes embedded segments. This wrapper owns
// the word-embedding table, turns token ids into vectors and
// computes the training loss.

use burn::{
    module::Param,
    nn::{loss::CrossEntropyLossConfig, Embedding, EmbeddingConfig, Initializer},
    prelude::*,
};

use crate::ml::model::{
    KeepProbabilities, LcrRotInverse, LcrRotInverseConfig, LcrRotOutput, Segment, Segments,
};

#[derive(Config, Debug)]
pub struct SentimentModelConfig {
    pub vocab_size: usize,
    pub model:      LcrRotInverseConfig,
}

impl SentimentModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SentimentModel<B> {
        let r = self.model.random_base;
        let embedding = EmbeddingConfig::new(self.vocab_size, self.model.embedding_dim)
            .with_initializer(Initializer::Uniform { min: -r, max: r })
            .init(device);
        SentimentModel { embedding, lcr: self.model.init(device) }
    }
}

/// Padded token ids of one segment and their true lengths.
#[derive(Debug, Clone)]
pub struct TokenSegment<B: Backend> {
    /// [batch, max_len]
    pub ids:     Tensor<B, 2, Int>,
    /// [batch]
    pub lengths: Tensor<B, 1, Int>,
}

#[derive(Debug, Clone)]
pub struct TokenSegments<B: Backend> {
    pub left:   TokenSegment<B>,
    pub target: TokenSegment<B>,
    pub right:  TokenSegment<B>,
}

#[derive(Module, Debug)]
pub struct SentimentModel<B: Backend> {
    pub embedding: Embedding<B>,
    pub lcr:       LcrRotInverse<B>,
}

pub struct ClassificationOutput<B: Backend> {
    /// Cross entropy + L2 penalty, shape [1]
    pub loss:   Tensor<B, 1>,
    pub output: LcrRotOutput<B>,
}

impl<B: Backend> SentimentModel<B> {
    /// Replace the random table with pretrained vectors ([vocab, dim]).
    /// A frozen table receives no gradients.
    pub fn with_embeddings(mut self, table: Tensor<B, 2>, freeze: bool) -> Self {
        self.embedding.weight = Param::from_tensor(table).set_require_grad(!freeze);
        self
    }

    pub fn forward(&self, segments: TokenSegments<B>, keep: KeepProbabilities) -> LcrRotOutput<B> {
        let segments = Segments {
            left:   self.embed(segments.left),
            target: self.embed(segments.target),
            right:  self.embed(segments.right),
        };
        self.lcr.forward(segments, keep)
    }

    pub fn forward_classification(
        &self,
        segments: TokenSegments<B>,
        labels:   Tensor<B, 1, Int>,
        keep:     KeepProbabilities,
    ) -> ClassificationOutput<B> {
        let output = self.forward(segments, keep);
        let ce = CrossEntropyLossConfig::new().init(&output.logits.device());
        let loss = ce.forward(output.logits.clone(), labels) + self.lcr.l2_penalty();
        ClassificationOutput { loss, output }
    }

    fn embed(&self, segment: TokenSegment<B>) -> Segment<B> {
        Segment {
            embedded: self.embedding.forward(segment.ids),
            lengths:  segment.lengths,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn segment(ids: [[i32; 4]; 2], lengths: [i32; 2]) -> TokenSegment<TestBackend> {
        let device = Default::default();
        TokenSegment {
            ids:     Tensor::from_ints(ids, &device),
            lengths: Tensor::from_ints(lengths, &device),
        }
    }

    fn model() -> SentimentModel<TestBackend> {
        let device = Default::default();
        let lcr = LcrRotInverseConfig::new(4)
            .with_number_hidden_units(3)
            .with_max_sentence_length(4)
            .with_max_target_length(4);
        SentimentModelConfig::new(12, lcr).init(&device)
    }

    fn segments() -> TokenSegments<TestBackend> {
        TokenSegments {
            left:   segment([[2, 3, 4, 0], [5, 0, 0, 0]], [3, 1]),
            target: segment([[6, 0, 0, 0], [7, 8, 0, 0]], [1, 2]),
            right:  segment([[9, 10, 0, 0], [11, 1, 2, 3]], [2, 4]),
        }
    }

    #[test]
    fn test_loss_is_finite_and_positive() {
        let device = Default::default();
        let labels = Tensor::<TestBackend, 1, Int>::from_ints([0, 2], &device);
        let out    = model().forward_classification(segments(), labels, KeepProbabilities::NONE);
        let loss: f32 = out.loss.into_scalar().elem();
        assert!(loss.is_finite() && loss > 0.0);
        assert_eq!(out.output.probabilities.dims(), [2, 3]);
    }

    #[test]
    fn test_pretrained_table_replaces_weights() {
        let device = Default::default();
        let table  = Tensor::<TestBackend, 2>::ones([12, 4], &device);
        let model  = model().with_embeddings(table, true);
        let values = model.embedding.weight.val().into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|&v| v == 1.0));
    }
}
