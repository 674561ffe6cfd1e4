// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// Layout:
//   checkpoints/
//     model_epoch_1.mpk.gz   ← weights after epoch 1
//     model_epoch_2.mpk.gz
//     ...
//     latest_epoch.json      ← last epoch written
//     best_epoch.json        ← epoch with the best validation accuracy
//     train_config.json      ← hyperparameters, needed to rebuild the model
//     tokenizer.json         ← written by TokenizerStore
//
// Loading prefers the best epoch and falls back to the latest.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::ml::sentiment::SentimentModel;

const LATEST_EPOCH_FILE: &str = "latest_epoch.json";
const BEST_EPOCH_FILE:   &str = "best_epoch.json";
const CONFIG_FILE:       &str = "train_config.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Write `{dir}/model_epoch_{epoch}.mpk.gz` and move the latest pointer.
    pub fn save_model<B: Backend>(&self, model: &SentimentModel<B>, epoch: usize) -> Result<()> {
        let path = self.model_path(epoch);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        self.write_epoch(LATEST_EPOCH_FILE, epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    pub fn mark_best(&self, epoch: usize) -> Result<()> {
        self.write_epoch(BEST_EPOCH_FILE, epoch)
    }

    /// Restore weights into `model`, whose architecture must match.
    pub fn load_model<B: Backend>(
        &self,
        model:  SentimentModel<B>,
        device: &B::Device,
    ) -> Result<SentimentModel<B>> {
        let epoch = match self.best_epoch()? {
            Some(epoch) => epoch,
            None        => self.latest_epoch()?,
        };
        let path = self.model_path(epoch);
        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' first.",
                    path.display()
                )
            })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid config in '{}'", path.display()))
    }

    pub fn latest_epoch(&self) -> Result<usize> {
        self.read_epoch(LATEST_EPOCH_FILE)?
            .context("No checkpoint found. Have you run 'train' first?")
    }

    pub fn best_epoch(&self) -> Result<Option<usize>> {
        self.read_epoch(BEST_EPOCH_FILE)
    }

    fn model_path(&self, epoch: usize) -> PathBuf {
        // The recorder appends its own extension
        self.dir.join(format!("model_epoch_{epoch}"))
    }

    fn write_epoch(&self, file: &str, epoch: usize) -> Result<()> {
        let path = self.dir.join(file);
        fs::write(&path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write '{}'", path.display()))
    }

    fn read_epoch(&self, file: &str) -> Result<Option<usize>> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        Ok(Some(serde_json::from_str::<usize>(&s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{model::LcrRotInverseConfig, sentiment::SentimentModelConfig};
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lcr-ckpt-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn model_config() -> SentimentModelConfig {
        SentimentModelConfig::new(
            10,
            LcrRotInverseConfig::new(4)
                .with_number_hidden_units(2)
                .with_max_sentence_length(5)
                .with_max_target_length(2),
        )
    }

    #[test]
    fn test_config_round_trip() {
        let dir  = temp_dir("config");
        let ckpt = CheckpointManager::new(&dir).unwrap();
        let cfg  = TrainConfig { epochs: 3, seed: 9, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();

        let loaded = ckpt.load_config().unwrap();
        assert_eq!(loaded.epochs, 3);
        assert_eq!(loaded.seed, 9);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_best_epoch_wins_over_latest() {
        let dir    = temp_dir("best");
        let ckpt   = CheckpointManager::new(&dir).unwrap();
        let device = Default::default();

        let first: SentimentModel<TestBackend>  = model_config().init(&device);
        let second: SentimentModel<TestBackend> = model_config().init(&device);
        ckpt.save_model(&first, 1).unwrap();
        ckpt.save_model(&second, 2).unwrap();
        ckpt.mark_best(1).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), 2);
        assert_eq!(ckpt.best_epoch().unwrap(), Some(1));

        let fresh: SentimentModel<TestBackend> = model_config().init(&device);
        let loaded = ckpt.load_model(fresh, &device).unwrap();

        let weights = |m: &SentimentModel<TestBackend>| {
            m.embedding.weight.val().into_data().to_vec::<f32>().unwrap()
        };
        // CompactRecorder stores half precision
        for (a, b) in weights(&loaded).iter().zip(weights(&first)) {
            assert!((a - b).abs() < 1e-4, "{a} != {b}");
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir  = temp_dir("missing");
        let ckpt = CheckpointManager::new(&dir).unwrap();
        assert!(ckpt.latest_epoch().is_err());
        assert!(ckpt.load_config().is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
