// ============================================================
// Layer 5 — Shared Layer Primitives
// ============================================================
// Building blocks the LCR-Rot-Inverse cascade is assembled from:
//
//   BiRecurrentEncoder — length-aware bidirectional LSTM
//   AttentionScorer    — tanh(hᵀ W q + b) scores, length-masked softmax
//   masked_mean        — mean over the valid timesteps only
//   SoftmaxClassifier  — dropout + affine + softmax
//   dropout            — nn::Dropout driven by a keep probability
//
// Every mask is derived from the per-example length tensors, so
// padded positions never contribute to a reduction.

use burn::{
    module::Param,
    nn::{DropoutConfig, Initializer, Linear, LinearConfig, Lstm, LstmConfig},
    prelude::*,
    tensor::{activation::softmax, Distribution},
};

/// Added to the masked softmax denominator so an empty segment yields zeros.
pub const MASKED_SOFTMAX_EPSILON: f64 = 1e-9;

// ─── Masking helpers ──────────────────────────────────────────────────────────

/// `[batch, max_len]` mask, true where `position < length`.
pub fn sequence_mask<B: Backend>(
    lengths: Tensor<B, 1, Int>,
    max_len: usize,
) -> Tensor<B, 2, Bool> {
    let [batch] = lengths.dims();
    let positions = positions::<B>(batch, max_len, &lengths.device());
    let lengths = lengths.reshape([batch, 1]).expand([batch, max_len]);
    positions.lower(lengths)
}

fn positions<B: Backend>(batch: usize, max_len: usize, device: &B::Device) -> Tensor<B, 2, Int> {
    Tensor::<B, 1, Int>::arange(0..max_len as i64, device)
        .reshape([1, max_len])
        .expand([batch, max_len])
}

/// Reverse every example along the time axis, but only inside its
/// valid length. Padding stays where it is, so applying this twice
/// gives back the input.
pub fn reverse_within_length<B: Backend>(
    x:       Tensor<B, 3>,
    lengths: Tensor<B, 1, Int>,
) -> Tensor<B, 3> {
    let [batch, max_len, features] = x.dims();
    let positions = positions::<B>(batch, max_len, &x.device());

    let mirrored = lengths
        .clone()
        .reshape([batch, 1])
        .expand([batch, max_len])
        .sub(positions.clone())
        .sub_scalar(1);
    let valid = sequence_mask(lengths, max_len);

    let indices = positions
        .mask_where(valid, mirrored)
        .reshape([batch, max_len, 1])
        .expand([batch, max_len, features]);
    x.gather(1, indices)
}

/// Mean of `hidden` over its first `length` timesteps.
///
/// hidden: [batch, max_len, features], lengths: [batch] → [batch, features]
///
/// The divisor is clamped to 1, so a zero-length segment pools to zeros.
pub fn masked_mean<B: Backend>(hidden: Tensor<B, 3>, lengths: Tensor<B, 1, Int>) -> Tensor<B, 2> {
    let [batch, max_len, features] = hidden.dims();
    let mask = sequence_mask(lengths.clone(), max_len)
        .float()
        .reshape([batch, max_len, 1])
        .expand([batch, max_len, features]);

    let summed = (hidden * mask).sum_dim(1).reshape([batch, features]);
    let divisor = lengths
        .clamp_min(1)
        .float()
        .reshape([batch, 1])
        .expand([batch, features]);
    summed / divisor
}

/// Normalise `scores` ([batch, 1, seq_len]) over the valid positions.
/// Out-of-length weights are exactly zero.
pub fn masked_softmax<B: Backend>(scores: Tensor<B, 3>, lengths: Tensor<B, 1, Int>) -> Tensor<B, 3> {
    let [batch, _, seq_len] = scores.dims();
    let mask = sequence_mask(lengths, seq_len)
        .float()
        .reshape([batch, 1, seq_len]);

    // Scores come out of tanh, so exp() cannot overflow here.
    let exp = scores.exp() * mask;
    let denominator = exp
        .clone()
        .sum_dim(2)
        .add_scalar(MASKED_SOFTMAX_EPSILON)
        .expand([batch, 1, seq_len]);
    exp / denominator
}

/// `nn::Dropout` driven by a keep probability instead of a drop rate.
///
/// The keep probability changes per call (training vs. evaluation), so the
/// module is built here rather than stored. Like `nn::Dropout`, this is the
/// identity on backends without autodiff and whenever `keep_prob >= 1`.
pub fn dropout<B: Backend, const D: usize>(x: Tensor<B, D>, keep_prob: f64) -> Tensor<B, D> {
    if keep_prob >= 1.0 {
        return x;
    }
    DropoutConfig::new(1.0 - keep_prob).init().forward(x)
}

fn squared_norm<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, 1> {
    x.powf_scalar(2.0).sum()
}

// ─── BiRecurrentEncoder ───────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct BiRecurrentEncoderConfig {
    pub d_input:  usize,
    pub d_hidden: usize,
}

impl BiRecurrentEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> BiRecurrentEncoder<B> {
        BiRecurrentEncoder {
            forward_cell:  LstmConfig::new(self.d_input, self.d_hidden, true).init(device),
            backward_cell: LstmConfig::new(self.d_input, self.d_hidden, true).init(device),
            d_hidden:      self.d_hidden,
        }
    }
}

/// Two LSTMs reading a segment in opposite directions.
///
/// The backward cell sees each example reversed within its own
/// length, so its first step is the last real token rather than
/// padding. Outputs past the length are zeroed.
#[derive(Module, Debug)]
pub struct BiRecurrentEncoder<B: Backend> {
    pub forward_cell:  Lstm<B>,
    pub backward_cell: Lstm<B>,
    pub d_hidden:      usize,
}

impl<B: Backend> BiRecurrentEncoder<B> {
    /// inputs: [batch, max_len, d_input] → [batch, max_len, 2 * d_hidden]
    pub fn forward(&self, inputs: Tensor<B, 3>, lengths: Tensor<B, 1, Int>) -> Tensor<B, 3> {
        let [batch, max_len, _] = inputs.dims();

        let (forward_states, _) = self.forward_cell.forward(inputs.clone(), None);

        let reversed = reverse_within_length(inputs, lengths.clone());
        let (backward_states, _) = self.backward_cell.forward(reversed, None);
        let backward_states = reverse_within_length(backward_states, lengths.clone());

        let mask = sequence_mask(lengths, max_len)
            .float()
            .reshape([batch, max_len, 1])
            .expand([batch, max_len, 2 * self.d_hidden]);
        Tensor::cat(vec![forward_states, backward_states], 2) * mask
    }

    pub fn output_dim(&self) -> usize {
        2 * self.d_hidden
    }
}

// ─── AttentionScorer ──────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct AttentionScorerConfig {
    /// Width of the hidden states being scored (and of the query)
    pub d_model: usize,
    /// Longest sequence this scorer will see; one bias per position
    pub max_len: usize,
    #[config(default = 0.01)]
    pub random_base: f64,
}

impl AttentionScorerConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> AttentionScorer<B> {
        let projection = Tensor::random(
            [self.d_model, self.d_model],
            Distribution::Uniform(-self.random_base, self.random_base),
            device,
        );
        let bias = Tensor::zeros([self.max_len], device);
        AttentionScorer {
            projection: Param::from_tensor(projection),
            bias:       Param::from_tensor(bias),
        }
    }
}

#[derive(Module, Debug)]
pub struct AttentionScorer<B: Backend> {
    pub projection: Param<Tensor<B, 2>>,
    pub bias:       Param<Tensor<B, 1>>,
}

impl<B: Backend> AttentionScorer<B> {
    /// Score every timestep of `hidden` against `query`.
    ///
    /// hidden: [batch, seq_len, d_model], query: [batch, d_model]
    /// → weights [batch, 1, seq_len], zero from `lengths` onwards.
    ///
    /// `seq_len` may be shorter than the configured `max_len`;
    /// the leading bias entries are used.
    pub fn forward(
        &self,
        hidden:  Tensor<B, 3>,
        query:   Tensor<B, 2>,
        lengths: Tensor<B, 1, Int>,
    ) -> Tensor<B, 3> {
        let [batch, seq_len, d_model] = hidden.dims();

        let projected = hidden
            .reshape([batch * seq_len, d_model])
            .matmul(self.projection.val())
            .reshape([batch, seq_len, d_model]);
        let scores = projected
            .matmul(query.reshape([batch, d_model, 1]))
            .reshape([batch, 1, seq_len]);

        let bias = self
            .bias
            .val()
            .slice([0..seq_len])
            .reshape([1, 1, seq_len])
            .expand([batch, 1, seq_len]);

        masked_softmax((scores + bias).tanh(), lengths)
    }

    pub fn squared_norm(&self) -> Tensor<B, 1> {
        squared_norm(self.projection.val()) + squared_norm(self.bias.val())
    }
}

// ─── SoftmaxClassifier ────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct SoftmaxClassifierConfig {
    pub d_input:     usize,
    pub num_classes: usize,
    #[config(default = 0.01)]
    pub random_base: f64,
}

impl SoftmaxClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SoftmaxClassifier<B> {
        let output = LinearConfig::new(self.d_input, self.num_classes)
            .with_initializer(Initializer::Uniform {
                min: -self.random_base,
                max: self.random_base,
            })
            .init(device);
        SoftmaxClassifier { output }
    }
}

#[derive(Module, Debug)]
pub struct SoftmaxClassifier<B: Backend> {
    pub output: Linear<B>,
}

pub struct ClassifierOutput<B: Backend> {
    /// [batch, num_classes], pre-softmax
    pub logits:        Tensor<B, 2>,
    /// [batch, num_classes], rows sum to one
    pub probabilities: Tensor<B, 2>,
}

impl<B: Backend> SoftmaxClassifier<B> {
    pub fn forward(&self, x: Tensor<B, 2>, keep_prob: f64) -> ClassifierOutput<B> {
        let logits = self.output.forward(dropout(x, keep_prob));
        let probabilities = softmax(logits.clone(), 1);
        ClassifierOutput { logits, probabilities }
    }

    pub fn squared_norm(&self) -> Tensor<B, 1> {
        let weight = squared_norm(self.output.weight.val());
        match &self.output.bias {
            Some(bias) => weight + squared_norm(bias.val()),
            None       => weight,
        }
    }
}
