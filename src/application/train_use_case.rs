// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the configuration
//   Step 2: Load the training corpus            (Layer 4 - data)
//   Step 3: Load or split off validation data   (Layer 4 - data)
//   Step 4: Build tokenizer                     (Layer 6 - infra)
//   Step 5: Encode padded samples               (Layer 4 - data)
//   Step 6: Load pretrained embeddings, if any  (Layer 6 - infra)
//   Step 7: Save config                         (Layer 6 - infra)
//   Step 8: Run training loop                   (Layer 5 - ml)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{
    dataset::{SegmentLimits, SentenceDataset, SentenceSample},
    loader::CorpusLoader,
    splitter::split_train_val,
};
use crate::domain::traits::SentenceSource;
use crate::infra::{
    checkpoint::CheckpointManager,
    embeddings::EmbeddingTable,
    metrics::MetricsLogger,
    tokenizer_store::TokenizerStore,
};
use crate::ml::{
    model::{KeepProbabilities, LcrRotInverseConfig},
    trainer::{run_training, TrainingSummary},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    /// SGD with momentum
    #[default]
    Momentum,
    Adam,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Every hyperparameter of a run. Saved next to the checkpoints
// so inference can rebuild the exact same model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub train_file:          String,
    /// Separate validation corpus; split off the training data when absent
    pub val_file:            Option<String>,
    pub checkpoint_dir:      String,
    /// GloVe-format word vectors
    pub embeddings_file:     Option<String>,
    pub freeze_embeddings:   bool,
    pub embedding_dim:       usize,
    pub vocab_size:          usize,
    pub number_hidden_units: usize,
    pub max_sentence_length: usize,
    pub max_target_length:   usize,
    pub l2_regularization:   f64,
    pub random_base:         f64,
    pub number_of_classes:   usize,
    pub keep_prob1:          f64,
    pub keep_prob2:          f64,
    pub optimizer:           OptimizerKind,
    pub learning_rate:       f64,
    pub momentum:            f64,
    pub batch_size:          usize,
    pub epochs:              usize,
    pub train_fraction:      f64,
    pub seed:                u64,
    pub num_workers:         usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_file:          "data/train.txt".to_string(),
            val_file:            None,
            checkpoint_dir:      "checkpoints".to_string(),
            embeddings_file:     None,
            freeze_embeddings:   false,
            embedding_dim:       300,
            vocab_size:          50_000,
            number_hidden_units: 300,
            max_sentence_length: 80,
            max_target_length:   19,
            l2_regularization:   1e-5,
            random_base:         0.01,
            number_of_classes:   3,
            keep_prob1:          0.5,
            keep_prob2:          0.5,
            optimizer:           OptimizerKind::Momentum,
            learning_rate:       0.07,
            momentum:            0.85,
            batch_size:          20,
            epochs:              50,
            train_fraction:      0.8,
            seed:                42,
            num_workers:         1,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, keep) in [("keep_prob1", self.keep_prob1), ("keep_prob2", self.keep_prob2)] {
            if !(keep > 0.0 && keep <= 1.0) {
                bail!("{name} must be in (0, 1], got {keep}");
            }
        }
        if !(self.train_fraction > 0.0 && self.train_fraction <= 1.0) {
            bail!("train_fraction must be in (0, 1], got {}", self.train_fraction);
        }
        for (name, value) in [
            ("embedding_dim", self.embedding_dim),
            ("number_hidden_units", self.number_hidden_units),
            ("max_sentence_length", self.max_sentence_length),
            ("max_target_length", self.max_target_length),
            ("number_of_classes", self.number_of_classes),
            ("batch_size", self.batch_size),
        ] {
            if value == 0 {
                bail!("{name} must be positive");
            }
        }
        if self.number_of_classes < 3 {
            bail!("number_of_classes must cover negative, neutral and positive (>= 3)");
        }
        if self.l2_regularization < 0.0 || self.random_base < 0.0 {
            bail!("l2_regularization and random_base must not be negative");
        }
        Ok(())
    }

    pub fn model_config(&self) -> LcrRotInverseConfig {
        LcrRotInverseConfig::new(self.embedding_dim)
            .with_number_hidden_units(self.number_hidden_units)
            .with_max_sentence_length(self.max_sentence_length)
            .with_max_target_length(self.max_target_length)
            .with_l2_regularization(self.l2_regularization)
            .with_random_base(self.random_base)
            .with_number_of_classes(self.number_of_classes)
    }

    pub fn segment_limits(&self) -> SegmentLimits {
        SegmentLimits::new(self.max_sentence_length, self.max_target_length)
    }

    /// Keep probabilities used while training.
    pub fn keep_probabilities(&self) -> KeepProbabilities {
        KeepProbabilities::new(self.keep_prob1, self.keep_prob2)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainingSummary> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Training corpus ───────────────────────────────────────────
        let train_sentences = CorpusLoader::new(&cfg.train_file).load_all()?;
        if train_sentences.is_empty() {
            bail!("Training corpus '{}' is empty", cfg.train_file);
        }

        // ── Step 3: Validation corpus or split ────────────────────────────────
        let (train_sentences, val_sentences) = match &cfg.val_file {
            Some(path) => (train_sentences, CorpusLoader::new(path).load_all()?),
            None       => split_train_val(train_sentences, cfg.train_fraction, cfg.seed),
        };
        tracing::info!(
            "Split: {} train, {} validation",
            train_sentences.len(),
            val_sentences.len()
        );

        // ── Step 4: Tokenizer (vocabulary from training data only) ────────────
        let tok_store = TokenizerStore::new(&cfg.checkpoint_dir);
        let tokenizer = tok_store.load_or_build(&train_sentences, cfg.vocab_size)?;
        let vocab_size = tokenizer.get_vocab_size(true);

        // ── Step 5: Encode samples ────────────────────────────────────────────
        let limits        = cfg.segment_limits();
        let train_samples = SentenceSample::encode_all(&train_sentences, &tokenizer, &limits)?;
        let val_samples   = SentenceSample::encode_all(&val_sentences, &tokenizer, &limits)?;
        let train_dataset = SentenceDataset::new(train_samples);
        let val_dataset   = SentenceDataset::new(val_samples);
        tracing::info!(
            "Class counts (neg/neu/pos): train {:?}, validation {:?}",
            train_dataset.class_counts(cfg.number_of_classes),
            val_dataset.class_counts(cfg.number_of_classes),
        );

        // ── Step 6: Pretrained embeddings ─────────────────────────────────────
        let embeddings = match &cfg.embeddings_file {
            Some(path) => Some(EmbeddingTable::load_glove(
                Path::new(path),
                &tokenizer.get_vocab(true),
                cfg.embedding_dim,
                cfg.random_base,
                cfg.seed,
            )?),
            None => None,
        };

        // ── Step 7: Save config for inference ─────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

        // ── Step 8: Training loop ─────────────────────────────────────────────
        run_training(
            cfg,
            vocab_size,
            train_dataset,
            val_dataset,
            embeddings,
            &ckpt_manager,
            &metrics,
        )
    }
}
