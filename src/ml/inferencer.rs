// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds the trained model from a checkpoint directory and
// classifies sentences with dropout off.
//
// A prediction carries the class distribution and the weights
// of all four attention passes, paired with the words the model
// actually saw (after truncation).

use anyhow::{anyhow, Context, Result};
use burn::prelude::*;
use std::path::Path;
use tokenizers::Tokenizer;

use crate::data::{
    batcher::stack_sentences,
    dataset::{EncodedSentence, SegmentLimits, SentenceSample},
    preprocessor::Preprocessor,
};
use crate::domain::{
    prediction::{AttentionReport, EvaluationReport, Prediction},
    sentence::{AspectSentence, Polarity},
};
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::{
    model::KeepProbabilities,
    sentiment::{SentimentModel, SentimentModelConfig},
};

pub type InferBackend = burn::backend::Wgpu;

pub struct Inferencer<B: Backend> {
    model:        SentimentModel<B>,
    tokenizer:    Tokenizer,
    limits:       SegmentLimits,
    preprocessor: Preprocessor,
    num_classes:  usize,
    device:       B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(
        model:       SentimentModel<B>,
        tokenizer:   Tokenizer,
        limits:      SegmentLimits,
        num_classes: usize,
        device:      B::Device,
    ) -> Self {
        Self { model, tokenizer, limits, preprocessor: Preprocessor::new(), num_classes, device }
    }

    /// Load config, tokenizer and weights saved by a training run.
    pub fn from_checkpoint(dir: impl AsRef<Path>, device: B::Device) -> Result<Self> {
        let dir       = dir.as_ref();
        let ckpt      = CheckpointManager::new(dir)?;
        let cfg       = ckpt.load_config()?;
        let tokenizer = TokenizerStore::new(dir).load()?;

        let model_cfg = SentimentModelConfig::new(tokenizer.get_vocab_size(true), cfg.model_config());
        let model     = ckpt.load_model(model_cfg.init::<B>(&device), &device)?;
        tracing::info!("Model loaded from checkpoint '{}'", dir.display());

        Ok(Self::new(model, tokenizer, cfg.segment_limits(), cfg.number_of_classes, device))
    }

    /// Classify a raw sentence with `$T$` in place of `target`.
    pub fn classify_text(&self, sentence: &str, target: &str) -> Result<Prediction> {
        let sentence = self.preprocessor.split_marked(sentence, target, None)?;
        self.predict(&sentence)
    }

    pub fn predict(&self, sentence: &AspectSentence) -> Result<Prediction> {
        let visible  = self.limits.truncate(sentence);
        let encoded  = EncodedSentence::encode(&visible, &self.tokenizer, &self.limits)?;
        let segments = stack_sentences::<B>(&[&encoded], &self.device);

        let output        = self.model.forward(segments, KeepProbabilities::NONE);
        let probabilities = to_f32(output.probabilities)?;
        let polarity      = predicted_polarity(&probabilities)?;

        let layers    = output.layers;
        let attention = AttentionReport {
            left:         AttentionReport::pair(&visible.left, &to_f32(layers.left.scores)?),
            target_left:  AttentionReport::pair(&visible.target, &to_f32(layers.target_left.scores)?),
            target_right: AttentionReport::pair(&visible.target, &to_f32(layers.target_right.scores)?),
            right:        AttentionReport::pair(&visible.right, &to_f32(layers.right.scores)?),
        };

        tracing::debug!("Predicted {} with p={:?}", polarity, probabilities);
        Ok(Prediction { polarity, probabilities, attention })
    }

    /// Accuracy and confusion counts over labelled sentences.
    pub fn evaluate(&self, sentences: &[AspectSentence], batch_size: usize) -> Result<EvaluationReport> {
        let samples = SentenceSample::encode_all(sentences, &self.tokenizer, &self.limits)?;
        let mut report = EvaluationReport::new(self.num_classes);

        for chunk in samples.chunks(batch_size.max(1)) {
            let encoded: Vec<&EncodedSentence> = chunk.iter().map(|s| &s.sentence).collect();
            let segments = stack_sentences::<B>(&encoded, &self.device);
            let output   = self.model.forward(segments, KeepProbabilities::NONE);

            let [batch, _] = output.probabilities.dims();
            let predicted: Vec<i64> = output
                .probabilities
                .argmax(1)
                .reshape([batch])
                .into_data()
                .convert::<i64>()
                .to_vec::<i64>()
                .map_err(|e| anyhow!("Cannot read predictions: {e:?}"))?;

            for (sample, class) in chunk.iter().zip(predicted) {
                report.record(sample.label, class as usize);
            }
        }

        tracing::info!(
            "Evaluated {} sentences: accuracy {:.4}",
            report.total,
            report.accuracy()
        );
        Ok(report)
    }
}

fn to_f32<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read tensor data: {e:?}"))
}

fn predicted_polarity(probabilities: &[f32]) -> Result<Polarity> {
    let class = probabilities
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .context("Model returned no class probabilities")?;
    Polarity::from_class_id(class)
        .with_context(|| format!("Class id {class} has no polarity"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::preprocessor::Preprocessor;
    use crate::ml::model::LcrRotInverseConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn corpus() -> Vec<AspectSentence> {
        let p = Preprocessor::new();
        vec![
            p.split_marked("the $T$ was great", "pasta", Some(Polarity::Positive)).unwrap(),
            p.split_marked("awful $T$ , never again", "service", Some(Polarity::Negative)).unwrap(),
            p.split_marked("$T$ is a restaurant", "it", Some(Polarity::Neutral)).unwrap(),
        ]
    }

    fn inferencer(name: &str) -> (Inferencer<TestBackend>, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("lcr-infer-{name}-{}", std::process::id()));
        let _   = std::fs::remove_dir_all(&dir);
        let tokenizer = TokenizerStore::new(&dir).load_or_build(&corpus(), 100).unwrap();

        let device = Default::default();
        let config = SentimentModelConfig::new(
            tokenizer.get_vocab_size(true),
            LcrRotInverseConfig::new(4)
                .with_number_hidden_units(3)
                .with_max_sentence_length(3)
                .with_max_target_length(2)
                .with_random_base(0.1),
        );
        let model = config.init::<TestBackend>(&device);
        (Inferencer::new(model, tokenizer, SegmentLimits::new(3, 2), 3, device), dir)
    }

    #[test]
    fn test_predict_reports_distribution_and_attention() {
        let (inf, dir) = inferencer("predict");
        let pred = inf.classify_text("the staff was slow but the $T$ was great", "pasta").unwrap();

        assert_eq!(pred.probabilities.len(), 3);
        let total: f32 = pred.probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
        assert_eq!(pred.probabilities[pred.polarity.class_id()], pred.confidence());

        // Left context truncated to its last three words
        let left: Vec<&str> = pred.attention.left.iter().map(|t| t.token.as_str()).collect();
        assert_eq!(left, vec!["slow", "but", "the"]);
        assert_eq!(pred.attention.right.len(), 2);
        assert_eq!(pred.attention.target_left.len(), 1);

        for branch in [&pred.attention.left, &pred.attention.right, &pred.attention.target_right] {
            let mass: f32 = branch.iter().map(|t| t.weight).sum();
            assert!((mass - 1.0).abs() < 1e-4, "attention mass {mass}");
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_predict_with_empty_context() {
        let (inf, dir) = inferencer("empty");
        let pred = inf.classify_text("$T$", "pasta").unwrap();
        assert!(pred.attention.left.is_empty());
        assert!(pred.attention.right.is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rejects_sentence_without_marker() {
        let (inf, dir) = inferencer("marker");
        assert!(inf.classify_text("no marker here", "pasta").is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_evaluate_counts_every_sentence() {
        let (inf, dir) = inferencer("evaluate");
        let report = inf.evaluate(&corpus(), 2).unwrap();
        assert_eq!(report.total, 3);
        let counted: usize = report.confusion.iter().flatten().sum();
        assert_eq!(counted, 3);
        assert!((0.0..=1.0).contains(&report.accuracy()));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_predicted_polarity_picks_argmax() {
        assert_eq!(predicted_polarity(&[0.2, 0.1, 0.7]).unwrap(), Polarity::Positive);
        assert!(predicted_polarity(&[]).is_err());
    }
}
