// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a trained checkpoint against a labelled corpus file.

use anyhow::{bail, Result};
use burn::prelude::Backend;
use std::path::PathBuf;

use crate::data::loader::CorpusLoader;
use crate::domain::{prediction::EvaluationReport, traits::SentenceSource};
use crate::ml::inferencer::{InferBackend, Inferencer};

pub struct EvaluateUseCase<B: Backend = InferBackend> {
    inferencer: Inferencer<B>,
    batch_size: usize,
}

impl EvaluateUseCase<InferBackend> {
    pub fn new(checkpoint_dir: impl Into<PathBuf>, batch_size: usize) -> Result<Self> {
        let dir: PathBuf = checkpoint_dir.into();
        let device       = burn::backend::wgpu::WgpuDevice::default();
        let inferencer   = Inferencer::from_checkpoint(&dir, device)?;
        Ok(Self::with_inferencer(inferencer, batch_size))
    }
}

impl<B: Backend> EvaluateUseCase<B> {
    pub fn with_inferencer(inferencer: Inferencer<B>, batch_size: usize) -> Self {
        Self { inferencer, batch_size }
    }

    pub fn execute(&self, source: &dyn SentenceSource) -> Result<EvaluationReport> {
        let sentences = source.load_all()?;
        if sentences.is_empty() {
            bail!("Evaluation corpus is empty");
        }
        self.inferencer.evaluate(&sentences, self.batch_size)
    }

    pub fn execute_file(&self, path: impl Into<PathBuf>) -> Result<EvaluationReport> {
        self.execute(&CorpusLoader::new(path))
    }
}
