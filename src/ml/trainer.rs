// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop on Burn's DataLoader.
//
//   - Training runs on Autodiff<Wgpu> with the configured
//     keep probabilities (dropout on)
//   - model.valid() moves the model to the inner backend for
//     validation, with keep probabilities of 1 (dropout off)
//   - Loss = cross entropy + L2 penalty on the attention and
//     classifier weights
//   - Every epoch is checkpointed; the epoch with the best
//     validation accuracy is marked for inference
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{momentum::MomentumConfig, AdamConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::Serialize;

use crate::application::train_use_case::{OptimizerKind, TrainConfig};
use crate::data::{
    batcher::{SentenceBatch, SentenceBatcher},
    dataset::SentenceDataset,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    embeddings::EmbeddingTable,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    model::KeepProbabilities,
    sentiment::{SentimentModel, SentimentModelConfig},
};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    pub epochs:       usize,
    pub best_epoch:   Option<usize>,
    pub best_val_acc: Option<f64>,
    pub last:         Option<EpochMetrics>,
}

pub fn run_training(
    cfg:           &TrainConfig,
    vocab_size:    usize,
    train_dataset: SentenceDataset,
    val_dataset:   SentenceDataset,
    embeddings:    Option<EmbeddingTable>,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
) -> Result<TrainingSummary> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_on::<MyBackend>(
        cfg, vocab_size, train_dataset, val_dataset, embeddings, ckpt_manager, metrics, &device,
    )
}

/// Build the model on `B` and train it with the configured optimizer.
#[allow(clippy::too_many_arguments)]
pub fn train_on<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    vocab_size:    usize,
    train_dataset: SentenceDataset,
    val_dataset:   SentenceDataset,
    embeddings:    Option<EmbeddingTable>,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
    device:        &B::Device,
) -> Result<TrainingSummary> {
    let model_cfg = SentimentModelConfig::new(vocab_size, cfg.model_config());
    let mut model: SentimentModel<B> = model_cfg.init(device);

    if let Some(table) = embeddings {
        if table.vocab_size != vocab_size || table.dim != cfg.embedding_dim {
            bail!(
                "Embedding table is {}x{}, model expects {}x{}",
                table.vocab_size, table.dim, vocab_size, cfg.embedding_dim
            );
        }
        model = model.with_embeddings(table.to_tensor(device), cfg.freeze_embeddings);
    }
    tracing::info!(
        "Model ready: vocab={}, H={}, classes={}, optimizer={:?}",
        vocab_size, cfg.number_hidden_units, cfg.number_of_classes, cfg.optimizer
    );

    let loop_inputs = LoopInputs { cfg, train_dataset, val_dataset, ckpt_manager, metrics };
    match cfg.optimizer {
        OptimizerKind::Momentum => {
            let optim = SgdConfig::new()
                .with_momentum(Some(MomentumConfig::new().with_momentum(cfg.momentum)))
                .init();
            train_loop(model, optim, loop_inputs)
        }
        OptimizerKind::Adam => {
            let optim = AdamConfig::new().with_epsilon(1e-8).init();
            train_loop(model, optim, loop_inputs)
        }
    }
}

struct LoopInputs<'a> {
    cfg:           &'a TrainConfig,
    train_dataset: SentenceDataset,
    val_dataset:   SentenceDataset,
    ckpt_manager:  &'a CheckpointManager,
    metrics:       &'a MetricsLogger,
}

/// Running loss and accuracy over one pass.
#[derive(Debug, Default)]
struct PassStats {
    loss_sum: f64,
    batches:  usize,
    correct:  usize,
    total:    usize,
}

impl PassStats {
    fn record<B: Backend>(&mut self, loss: f64, logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) {
        let [batch, _] = logits.dims();
        let predicted = logits.argmax(1).reshape([batch]);
        let correct: i64 = predicted.equal(labels).int().sum().into_scalar().elem::<i64>();

        self.loss_sum += loss;
        self.batches  += 1;
        self.correct  += correct as usize;
        self.total    += batch;
    }

    fn mean_loss(&self) -> f64 {
        if self.batches > 0 { self.loss_sum / self.batches as f64 } else { f64::NAN }
    }

    fn accuracy(&self) -> f64 {
        if self.total > 0 { self.correct as f64 / self.total as f64 } else { 0.0 }
    }
}

fn train_loop<B, O>(
    mut model: SentimentModel<B>,
    mut optim: O,
    inputs:    LoopInputs<'_>,
) -> Result<TrainingSummary>
where
    B: AutodiffBackend,
    O: Optimizer<SentimentModel<B>, B>,
{
    let LoopInputs { cfg, train_dataset, val_dataset, ckpt_manager, metrics } = inputs;

    let train_loader = DataLoaderBuilder::new(SentenceBatcher::new())
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(cfg.num_workers)
        .build(train_dataset);

    // Validation runs on the inner backend, no autodiff overhead
    let val_loader = DataLoaderBuilder::new(SentenceBatcher::new())
        .batch_size(cfg.batch_size)
        .num_workers(cfg.num_workers)
        .build(val_dataset);

    let keep = cfg.keep_probabilities();
    let mut summary = TrainingSummary {
        epochs:       cfg.epochs,
        best_epoch:   None,
        best_val_acc: None,
        last:         None,
    };

    for epoch in 1..=cfg.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut train_stats = PassStats::default();
        for batch in train_loader.iter() {
            let batch: SentenceBatch<B> = batch;
            let out = model.forward_classification(batch.segments, batch.labels.clone(), keep);

            let loss_val: f64 = out.loss.clone().into_scalar().elem::<f64>();
            train_stats.record(loss_val, out.output.logits.detach(), batch.labels);

            let grads = out.loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let mut val_stats = PassStats::default();
        for batch in val_loader.iter() {
            let batch: SentenceBatch<B::InnerBackend> = batch;
            let out = model_valid.forward_classification(
                batch.segments,
                batch.labels.clone(),
                KeepProbabilities::NONE,
            );
            let loss_val: f64 = out.loss.into_scalar().elem::<f64>();
            val_stats.record(loss_val, out.output.logits, batch.labels);
        }

        let epoch_metrics = EpochMetrics::new(
            epoch,
            train_stats.mean_loss(),
            train_stats.accuracy(),
            val_stats.mean_loss(),
            val_stats.accuracy(),
        );

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | train_acc={:.1}% | val_loss={:.4} | val_acc={:.1}%",
            epoch, cfg.epochs,
            epoch_metrics.train_loss, epoch_metrics.train_acc * 100.0,
            epoch_metrics.val_loss, epoch_metrics.val_acc * 100.0,
        );

        metrics.log(&epoch_metrics)?;
        ckpt_manager.save_model(&model, epoch)?;
        if epoch_metrics.is_improvement(summary.best_val_acc) {
            ckpt_manager.mark_best(epoch)?;
            summary.best_epoch   = Some(epoch);
            summary.best_val_acc = Some(epoch_metrics.val_acc);
            tracing::info!("New best validation accuracy {:.4} at epoch {}", epoch_metrics.val_acc, epoch);
        }
        summary.last = Some(epoch_metrics);
    }

    tracing::info!("Training complete!");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::{EncodedSegment, EncodedSentence, SentenceSample};
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    fn sample(word: u32, label: usize) -> SentenceSample {
        let segment = |ids: Vec<u32>, length| EncodedSegment { ids, length };
        SentenceSample {
            sentence: EncodedSentence {
                left:   segment(vec![word, 2, 0, 0], 2),
                target: segment(vec![3, 0], 1),
                right:  segment(vec![4, word, 5, 0], 3),
            },
            label,
        }
    }

    fn tiny_config(dir: &str, optimizer: OptimizerKind) -> TrainConfig {
        TrainConfig {
            checkpoint_dir:      dir.to_string(),
            embedding_dim:       4,
            number_hidden_units: 3,
            max_sentence_length: 4,
            max_target_length:   2,
            random_base:         0.1,
            optimizer,
            learning_rate:       0.05,
            batch_size:          2,
            epochs:              2,
            ..TrainConfig::default()
        }
    }

    fn run(optimizer: OptimizerKind, name: &str) -> (TrainingSummary, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("lcr-train-{name}-{}", std::process::id()));
        let _   = std::fs::remove_dir_all(&dir);
        let cfg = tiny_config(dir.to_str().unwrap(), optimizer);

        let ckpt    = CheckpointManager::new(&dir).unwrap();
        let metrics = MetricsLogger::new(&dir).unwrap();
        let train = SentenceDataset::new(vec![sample(6, 0), sample(7, 2), sample(8, 1), sample(6, 0)]);
        let val   = SentenceDataset::new(vec![sample(7, 2), sample(8, 1)]);

        let summary = train_on::<TestBackend>(
            &cfg, 10, train, val, None, &ckpt, &metrics, &Default::default(),
        )
        .unwrap();
        (summary, dir)
    }

    #[test]
    fn test_momentum_training_writes_checkpoints_and_metrics() {
        let (summary, dir) = run(OptimizerKind::Momentum, "momentum");

        let last = summary.last.unwrap();
        assert_eq!(last.epoch, 2);
        assert!(last.train_loss.is_finite());
        assert!((0.0..=1.0).contains(&last.val_acc));
        assert!(summary.best_epoch.is_some());

        let ckpt = CheckpointManager::new(&dir).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), 2);
        let csv = std::fs::read_to_string(dir.join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_adam_training_runs() {
        let (summary, dir) = run(OptimizerKind::Adam, "adam");
        assert!(summary.last.unwrap().val_loss.is_finite());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rejects_mismatched_embedding_table() {
        let dir     = std::env::temp_dir().join(format!("lcr-train-emb-{}", std::process::id()));
        let cfg     = tiny_config(dir.to_str().unwrap(), OptimizerKind::Momentum);
        let ckpt    = CheckpointManager::new(&dir).unwrap();
        let metrics = MetricsLogger::new(&dir).unwrap();
        let table   = EmbeddingTable::random(10, 7, 0.1, 0);

        let result = train_on::<TestBackend>(
            &cfg,
            10,
            SentenceDataset::new(vec![sample(6, 0)]),
            SentenceDataset::new(vec![sample(6, 0)]),
            Some(table),
            &ckpt,
            &metrics,
            &Default::default(),
        );
        assert!(result.is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
