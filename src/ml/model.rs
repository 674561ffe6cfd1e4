// ============================================================
// Layer 5 — LCR-Rot-Inverse Model
// ============================================================
// Left-Center-Right separated network with rotatory attention,
// inverse order: the target is attended first, then the contexts.
//
//   left ──► BiLSTM ──► mean ──┐            ┌──► att(left | t_l) ──► r_l
//                              ▼            │
//   target ► BiLSTM ──► att(target | pool_l) ─► r_tl ─┐
//                   └─► att(target | pool_r) ─► r_tr ─┼─► [r_l; r_tl; r_tr; r_r]
//                              ▲            │         │        │
//   right ─► BiLSTM ──► mean ──┘            └──► att(right | t_r) ──► r_r
//                                                               ▼
//                                                   dropout → softmax
//
// The four attention passes run in a fixed order: each context
// pass consumes the target representation of its own side.
//
// Reference: Zheng & Xia (2018) Left-Center-Right Separated Neural
//            Network for Aspect-based Sentiment Analysis with
//            Rotatory Attention

use burn::prelude::*;

use crate::ml::layers::{
    dropout, masked_mean, AttentionScorer, AttentionScorerConfig, BiRecurrentEncoder,
    BiRecurrentEncoderConfig, SoftmaxClassifier, SoftmaxClassifierConfig,
};

#[derive(Config, Debug)]
pub struct LcrRotInverseConfig {
    /// Width of the incoming word vectors
    pub embedding_dim:       usize,
    /// Hidden units per LSTM direction (H); hidden states are 2·H wide
    #[config(default = 300)]
    pub number_hidden_units: usize,
    /// Padded length of the left and right contexts
    #[config(default = 80)]
    pub max_sentence_length: usize,
    /// Padded length of the target phrase
    #[config(default = 19)]
    pub max_target_length:   usize,
    #[config(default = 1e-5)]
    pub l2_regularization:   f64,
    /// Attention and classifier weights start in ±random_base
    #[config(default = 0.01)]
    pub random_base:         f64,
    #[config(default = 3)]
    pub number_of_classes:   usize,
}

impl LcrRotInverseConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> LcrRotInverse<B> {
        let encoder = BiRecurrentEncoderConfig::new(self.embedding_dim, self.number_hidden_units);
        let d_model = 2 * self.number_hidden_units;
        let target_scorer = AttentionScorerConfig::new(d_model, self.max_target_length)
            .with_random_base(self.random_base);
        let context_scorer = AttentionScorerConfig::new(d_model, self.max_sentence_length)
            .with_random_base(self.random_base);

        LcrRotInverse {
            left_encoder:           encoder.init(device),
            right_encoder:          encoder.init(device),
            target_encoder:         encoder.init(device),
            target_left_attention:  target_scorer.init(device),
            target_right_attention: target_scorer.init(device),
            left_attention:         context_scorer.init(device),
            right_attention:        context_scorer.init(device),
            classifier: SoftmaxClassifierConfig::new(4 * d_model, self.number_of_classes)
                .with_random_base(self.random_base)
                .init(device),
            l2_regularization: self.l2_regularization,
        }
    }

    /// Width of the concatenated sentence representation (8·H).
    pub fn sentence_representation_dim(&self) -> usize {
        8 * self.number_hidden_units
    }
}

// ─── Inputs ───────────────────────────────────────────────────────────────────

/// One embedded segment with its true per-example lengths.
#[derive(Debug, Clone)]
pub struct Segment<B: Backend> {
    /// [batch, max_len, embedding_dim]
    pub embedded: Tensor<B, 3>,
    /// [batch], each ≤ max_len
    pub lengths:  Tensor<B, 1, Int>,
}

#[derive(Debug, Clone)]
pub struct Segments<B: Backend> {
    pub left:   Segment<B>,
    pub target: Segment<B>,
    pub right:  Segment<B>,
}

/// Keep probabilities for the input and output dropout layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeepProbabilities {
    pub input:  f64,
    pub output: f64,
}

impl KeepProbabilities {
    /// No dropout anywhere — used for validation and inference.
    pub const NONE: Self = Self { input: 1.0, output: 1.0 };

    pub fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }
}

// ─── Outputs ──────────────────────────────────────────────────────────────────

/// Everything one attention pass produced.
#[derive(Debug, Clone)]
pub struct AttentionBranch<B: Backend> {
    /// [batch, 1, seq_len], zero past the sequence length
    pub scores:                Tensor<B, 3>,
    /// [batch, seq_len, 2·H], hidden states scaled by their weight
    pub weighted_hidden_state: Tensor<B, 3>,
    /// [batch, 2·H], weighted sum of the hidden states
    pub representation:        Tensor<B, 2>,
}

impl<B: Backend> AttentionBranch<B> {
    fn new(scores: Tensor<B, 3>, hidden: Tensor<B, 3>) -> Self {
        let [batch, seq_len, d_model] = hidden.dims();
        let weighted_hidden_state = scores
            .clone()
            .swap_dims(1, 2)
            .expand([batch, seq_len, d_model])
            * hidden.clone();
        let representation = scores.clone().matmul(hidden).reshape([batch, d_model]);
        Self { scores, weighted_hidden_state, representation }
    }
}

/// Intermediate tensors of one forward pass, kept for attention
/// visualisation and analysis. Not needed for the prediction itself.
#[derive(Debug, Clone)]
pub struct LayerInformation<B: Backend> {
    pub left_hidden_state:       Tensor<B, 3>,
    pub right_hidden_state:      Tensor<B, 3>,
    pub target_hidden_state:     Tensor<B, 3>,
    pub left_pool:               Tensor<B, 2>,
    pub right_pool:              Tensor<B, 2>,
    /// Target attended with the left pool
    pub target_left:             AttentionBranch<B>,
    /// Target attended with the right pool
    pub target_right:            AttentionBranch<B>,
    /// Left context attended with the target-left representation
    pub left:                    AttentionBranch<B>,
    /// Right context attended with the target-right representation
    pub right:                   AttentionBranch<B>,
    /// [batch, 8·H]: left, target-left, target-right, right
    pub sentence_representation: Tensor<B, 2>,
}

pub struct LcrRotOutput<B: Backend> {
    pub logits:        Tensor<B, 2>,
    pub probabilities: Tensor<B, 2>,
    pub layers:        LayerInformation<B>,
}

// ─── Model ────────────────────────────────────────────────────────────────────

/// The encoders and scorers share their algorithm but not their
/// weights; the field name is each instance's identity in the record.
#[derive(Module, Debug)]
pub struct LcrRotInverse<B: Backend> {
    pub left_encoder:           BiRecurrentEncoder<B>,
    pub right_encoder:          BiRecurrentEncoder<B>,
    pub target_encoder:         BiRecurrentEncoder<B>,
    pub target_left_attention:  AttentionScorer<B>,
    pub target_right_attention: AttentionScorer<B>,
    pub left_attention:         AttentionScorer<B>,
    pub right_attention:        AttentionScorer<B>,
    pub classifier:             SoftmaxClassifier<B>,
    pub l2_regularization:      f64,
}

impl<B: Backend> LcrRotInverse<B> {
    pub fn forward(&self, segments: Segments<B>, keep: KeepProbabilities) -> LcrRotOutput<B> {
        let Segments { left, target, right } = segments;

        // ── Encode each segment ───────────────────────────────────────────────
        let left_hidden_state = self
            .left_encoder
            .forward(dropout(left.embedded, keep.input), left.lengths.clone());
        let left_pool = masked_mean(left_hidden_state.clone(), left.lengths.clone());

        let right_hidden_state = self
            .right_encoder
            .forward(dropout(right.embedded, keep.input), right.lengths.clone());
        let right_pool = masked_mean(right_hidden_state.clone(), right.lengths.clone());

        let target_hidden_state = self
            .target_encoder
            .forward(dropout(target.embedded, keep.input), target.lengths.clone());

        // ── Target attends to each context pool ───────────────────────────────
        let target_left = AttentionBranch::new(
            self.target_left_attention.forward(
                target_hidden_state.clone(),
                left_pool.clone(),
                target.lengths.clone(),
            ),
            target_hidden_state.clone(),
        );
        let target_right = AttentionBranch::new(
            self.target_right_attention.forward(
                target_hidden_state.clone(),
                right_pool.clone(),
                target.lengths,
            ),
            target_hidden_state.clone(),
        );

        // ── Each context attends to its side's target representation ──────────
        let left_branch = AttentionBranch::new(
            self.left_attention.forward(
                left_hidden_state.clone(),
                target_left.representation.clone(),
                left.lengths,
            ),
            left_hidden_state.clone(),
        );
        let right_branch = AttentionBranch::new(
            self.right_attention.forward(
                right_hidden_state.clone(),
                target_right.representation.clone(),
                right.lengths,
            ),
            right_hidden_state.clone(),
        );

        let sentence_representation = Tensor::cat(
            vec![
                left_branch.representation.clone(),
                target_left.representation.clone(),
                target_right.representation.clone(),
                right_branch.representation.clone(),
            ],
            1,
        );

        let output = self
            .classifier
            .forward(sentence_representation.clone(), keep.output);

        LcrRotOutput {
            logits:        output.logits,
            probabilities: output.probabilities,
            layers: LayerInformation {
                left_hidden_state,
                right_hidden_state,
                target_hidden_state,
                left_pool,
                right_pool,
                target_left,
                target_right,
                left: left_branch,
                right: right_branch,
                sentence_representation,
            },
        }
    }

    /// `l2 · Σ‖w‖² / 2` over the attention and classifier parameters.
    /// The recurrent cells are not regularised.
    pub fn l2_penalty(&self) -> Tensor<B, 1> {
        let total = self.target_left_attention.squared_norm()
            + self.target_right_attention.squared_norm()
            + self.left_attention.squared_norm()
            + self.right_attention.squared_norm()
            + self.classifier.squared_norm();
        total.mul_scalar(self.l2_regularization / 2.0)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, tensor::Distribution};

    type TestBackend = NdArray;

    const HIDDEN: usize = 5;
    const EMBED:  usize = 6;

    fn config() -> LcrRotInverseConfig {
        LcrRotInverseConfig::new(EMBED)
            .with_number_hidden_units(HIDDEN)
            .with_max_sentence_length(10)
            .with_max_target_length(3)
            .with_random_base(0.3)
    }

    fn segment(batch: usize, max_len: usize, lengths: &[i32]) -> Segment<TestBackend> {
        let device = Default::default();
        Segment {
            embedded: Tensor::random([batch, max_len, EMBED], Distribution::Default, &device),
            lengths:  Tensor::from_ints(lengths, &device),
        }
    }

    /// batch=4, left padded to 10, target to 3, right to 8
    fn segments() -> Segments<TestBackend> {
        Segments {
            left:   segment(4, 10, &[10, 4, 1, 7]),
            target: segment(4, 3, &[1, 3, 2, 1]),
            right:  segment(4, 8, &[3, 8, 5, 2]),
        }
    }

    fn floats<const D: usize>(t: Tensor<TestBackend, D>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_output_shapes() {
        let device = Default::default();
        let cfg    = config();
        let model  = cfg.init::<TestBackend>(&device);
        let out    = model.forward(segments(), KeepProbabilities::NONE);

        assert_eq!(out.probabilities.dims(), [4, 3]);
        assert_eq!(out.logits.dims(), [4, 3]);
        assert_eq!(
            out.layers.sentence_representation.dims(),
            [4, cfg.sentence_representation_dim()],
        );
        assert_eq!(out.layers.left_hidden_state.dims(), [4, 10, 2 * HIDDEN]);
        assert_eq!(out.layers.right_hidden_state.dims(), [4, 8, 2 * HIDDEN]);
        assert_eq!(out.layers.target_hidden_state.dims(), [4, 3, 2 * HIDDEN]);
        assert_eq!(out.layers.left.scores.dims(), [4, 1, 10]);
        assert_eq!(out.layers.right.scores.dims(), [4, 1, 8]);
        assert_eq!(out.layers.target_left.scores.dims(), [4, 1, 3]);
        assert_eq!(out.layers.target_right.weighted_hidden_state.dims(), [4, 3, 2 * HIDDEN]);
    }

    #[test]
    fn test_probabilities_are_distributions() {
        let device = Default::default();
        let model  = config().init::<TestBackend>(&device);
        let probs  = floats(model.forward(segments(), KeepProbabilities::NONE).probabilities);

        for row in probs.chunks(3) {
            assert!(row.iter().all(|&p| p >= 0.0));
            assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_attention_mass_beyond_length_is_zero() {
        let device = Default::default();
        let model  = config().init::<TestBackend>(&device);
        let layers = model.forward(segments(), KeepProbabilities::NONE).layers;

        let check = |scores: Tensor<TestBackend, 3>, lengths: &[usize]| {
            let [_, _, seq_len] = scores.dims();
            let weights = floats(scores);
            for (row, &len) in weights.chunks(seq_len).zip(lengths) {
                assert!(row[len..].iter().all(|&w| w == 0.0));
                assert!((row[..len].iter().sum::<f32>() - 1.0).abs() < 1e-5);
            }
        };
        check(layers.left.scores, &[10, 4, 1, 7]);
        check(layers.right.scores, &[3, 8, 5, 2]);
        check(layers.target_left.scores, &[1, 3, 2, 1]);
        check(layers.target_right.scores, &[1, 3, 2, 1]);
    }

    #[test]
    fn test_forward_without_dropout_is_deterministic() {
        let device = Default::default();
        let model  = config().init::<TestBackend>(&device);
        let input  = segments();

        let first  = floats(model.forward(input.clone(), KeepProbabilities::NONE).probabilities);
        let second = floats(model.forward(input, KeepProbabilities::NONE).probabilities);
        assert_eq!(first, second);
    }

    #[test]
    fn test_each_attention_pass_uses_its_own_query() {
        let device = Default::default();
        let model  = config().init::<TestBackend>(&device);
        let input  = segments();
        let layers = model.forward(input.clone(), KeepProbabilities::NONE).layers;

        let close = |a: Tensor<TestBackend, 3>, b: Tensor<TestBackend, 3>| {
            for (x, y) in floats(a).iter().zip(floats(b)) {
                assert!((x - y).abs() < 1e-6, "{x} != {y}");
            }
        };

        // Target against the context pools
        close(
            model.target_left_attention.forward(
                layers.target_hidden_state.clone(),
                layers.left_pool.clone(),
                input.target.lengths.clone(),
            ),
            layers.target_left.scores.clone(),
        );
        close(
            model.target_right_attention.forward(
                layers.target_hidden_state.clone(),
                layers.right_pool.clone(),
                input.target.lengths.clone(),
            ),
            layers.target_right.scores.clone(),
        );

        // Each context against the target representation of its own side
        close(
            model.left_attention.forward(
                layers.left_hidden_state.clone(),
                layers.target_left.representation.clone(),
                input.left.lengths.clone(),
            ),
            layers.left.scores.clone(),
        );
        close(
            model.right_attention.forward(
                layers.right_hidden_state.clone(),
                layers.target_right.representation.clone(),
                input.right.lengths.clone(),
            ),
            layers.right.scores.clone(),
        );

        // Crossed queries give different weights
        let crossed = model.left_attention.forward(
            layers.left_hidden_state.clone(),
            layers.target_right.representation.clone(),
            input.left.lengths,
        );
        assert_ne!(floats(crossed), floats(layers.left.scores));
    }

    #[test]
    fn test_sentence_representation_concatenates_branches_in_order() {
        let device = Default::default();
        let model  = config().init::<TestBackend>(&device);
        let layers = model.forward(segments(), KeepProbabilities::NONE).layers;

        let expected = Tensor::cat(
            vec![
                layers.left.representation,
                layers.target_left.representation,
                layers.target_right.representation,
                layers.right.representation,
            ],
            1,
        );
        assert_eq!(floats(expected), floats(layers.sentence_representation));
    }

    #[test]
    fn test_swapping_contexts_changes_the_prediction() {
        let device = Default::default();
        // Equal padded lengths so the swapped inputs fit either side
        let cfg   = config().with_max_sentence_length(8);
        let model = cfg.init::<TestBackend>(&device);

        let left   = segment(2, 8, &[8, 3]);
        let right  = segment(2, 8, &[5, 6]);
        let target = segment(2, 3, &[2, 1]);

        let forward = model.forward(
            Segments { left: left.clone(), target: target.clone(), right: right.clone() },
            KeepProbabilities::NONE,
        );
        let swapped = model.forward(
            Segments { left: right, target, right: left },
            KeepProbabilities::NONE,
        );

        let a = floats(forward.layers.sentence_representation);
        let b = floats(swapped.layers.sentence_representation);
        assert!(a.iter().zip(&b).any(|(x, y)| x != y));
        assert_ne!(floats(forward.probabilities), floats(swapped.probabilities));
    }

    #[test]
    fn test_empty_context_contributes_zero_vectors() {
        let device = Default::default();
        let model  = config().init::<TestBackend>(&device);
        let input  = Segments {
            left:   segment(2, 10, &[0, 3]),
            target: segment(2, 3, &[2, 2]),
            right:  segment(2, 8, &[4, 0]),
        };
        let out = model.forward(input, KeepProbabilities::NONE);

        let left_pool = floats(out.layers.left_pool);
        assert!(left_pool[..2 * HIDDEN].iter().all(|&v| v == 0.0));
        let left_repr = floats(out.layers.left.representation);
        assert!(left_repr[..2 * HIDDEN].iter().all(|&v| v == 0.0));
        let right_repr = floats(out.layers.right.representation);
        assert!(right_repr[2 * HIDDEN..].iter().all(|&v| v == 0.0));

        assert!(floats(out.probabilities).iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_l2_penalty_scales_with_strength() {
        let device = Default::default();
        let model  = config().with_l2_regularization(0.0).init::<TestBackend>(&device);
        let zero: f32 = model.l2_penalty().into_scalar().elem();
        assert_eq!(zero, 0.0);

        let model = config().with_l2_regularization(1.0).init::<TestBackend>(&device);
        let penalty: f32 = model.l2_penalty().into_scalar().elem();
        assert!(penalty > 0.0);
    }
}
