// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to {checkpoint_dir}/metrics.csv,
// one row per epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: mean cross entropy + L2 penalty per batch
//   - train_acc:  fraction of training sentences classified correctly
//   - val_loss:   same loss on the validation set, dropout off
//   - val_acc:    validation accuracy; picks the best checkpoint
//
// Example CSV output:
//   epoch,train_loss,train_acc,val_loss,val_acc
//   1,1.043210,0.512000,0.998700,0.561000
//   2,0.931100,0.598000,0.942300,0.604000
//   ...
//
// How to read the metrics:
//   - train_loss should fall every epoch
//   - val_loss rising while train_loss falls → overfitting
//   - A flat train_acc near the majority-class share means
//     the model only ever predicts one polarity
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

const HEADER: &str = "epoch,train_loss,train_acc,val_loss,val_acc";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub train_loss: f64,
    pub train_acc:  f64,
    pub val_loss:   f64,
    pub val_acc:    f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, train_acc: f64, val_loss: f64, val_acc: f64) -> Self {
        Self { epoch, train_loss, train_acc, val_loss, val_acc }
    }

    /// True if this epoch beats the best validation accuracy so far
    pub fn is_improvement(&self, best_val_acc: Option<f64>) -> bool {
        best_val_acc.map_or(true, |best| self.val_acc > best)
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the header only when the file is new, so repeated
    /// runs append to the same log.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.train_acc, m.val_loss, m.val_acc,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_acc={:.4}",
            m.epoch,
            m.train_loss,
            m.val_acc,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
