// ============================================================
// Layer 2 — ClassifyUseCase
// ============================================================
// Loads a trained checkpoint once and classifies any number of
// (sentence, target) pairs against it.

use anyhow::Result;
use burn::prelude::Backend;
use std::path::Path;

use crate::domain::{prediction::Prediction, traits::SentimentClassifier};
use crate::ml::inferencer::{InferBackend, Inferencer};

pub struct ClassifyUseCase<B: Backend = InferBackend> {
    inferencer: Inferencer<B>,
}

impl ClassifyUseCase<InferBackend> {
    pub fn new(checkpoint_dir: impl AsRef<Path>) -> Result<Self> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        Ok(Self::with_inferencer(Inferencer::from_checkpoint(checkpoint_dir, device)?))
    }
}

impl<B: Backend> ClassifyUseCase<B> {
    pub fn with_inferencer(inferencer: Inferencer<B>) -> Self {
        Self { inferencer }
    }
}

impl<B: Backend> SentimentClassifier for ClassifyUseCase<B> {
    fn classify(&self, sentence: &str, target: &str) -> Result<Prediction> {
        tracing::info!("Classifying target '{}'", target);
        self.inferencer.classify_text(sentence, target)
    }
}
