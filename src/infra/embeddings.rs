// ============================================================
// Layer 6 — Pretrained Word Embeddings
// ============================================================
// Reads GloVe-style text files, one word per line:
//
//   the 0.418 0.24968 -0.41242 ...
//   food -0.16768 0.54862 0.9212 ...
//
// Only words in the tokenizer vocabulary are kept. Vocabulary
// words missing from the file get a small random vector, and
// the [PAD] row stays zero.

use anyhow::{bail, Context, Result};
use burn::prelude::*;
use rand::{distributions::Uniform, rngs::StdRng, Rng, SeedableRng};
use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::infra::tokenizer_store::PAD_ID;

/// Row-major [vocab_size, dim] table, row i = vector of token id i.
#[derive(Debug, Clone)]
pub struct EmbeddingTable {
    pub vocab_size: usize,
    pub dim:        usize,
    pub values:     Vec<f32>,
    /// Vocabulary words found in the pretrained file
    pub hits:       usize,
}

impl EmbeddingTable {
    /// Every row uniform in ±random_base, except [PAD].
    pub fn random(vocab_size: usize, dim: usize, random_base: f64, seed: u64) -> Self {
        let mut rng   = StdRng::seed_from_u64(seed);
        let range     = Uniform::new_inclusive(-random_base as f32, random_base as f32);
        let mut values: Vec<f32> = (0..vocab_size * dim).map(|_| rng.sample(range)).collect();

        let pad = PAD_ID as usize * dim;
        if pad + dim <= values.len() {
            values[pad..pad + dim].fill(0.0);
        }
        Self { vocab_size, dim, values, hits: 0 }
    }

    pub fn load_glove(
        path:        &Path,
        vocab:       &HashMap<String, u32>,
        dim:         usize,
        random_base: f64,
        seed:        u64,
    ) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Cannot open embeddings '{}'", path.display()))?;
        let table = Self::read_glove(BufReader::new(file), vocab, dim, random_base, seed)
            .with_context(|| format!("Malformed embeddings '{}'", path.display()))?;

        tracing::info!(
            "Pretrained vectors for {}/{} vocabulary words ({:.1}%)",
            table.hits,
            vocab.len(),
            100.0 * table.hits as f64 / vocab.len().max(1) as f64,
        );
        Ok(table)
    }

    pub fn read_glove(
        reader:      impl BufRead,
        vocab:       &HashMap<String, u32>,
        dim:         usize,
        random_base: f64,
        seed:        u64,
    ) -> Result<Self> {
        let vocab_size = vocab.values().max().map_or(0, |&id| id as usize + 1);
        let mut table  = Self::random(vocab_size, dim, random_base, seed);
        let mut filled = HashSet::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("line {}", i + 1))?;
            let mut fields = line.split(' ');
            let Some(word) = fields.next().filter(|w| !w.is_empty()) else {
                continue;
            };
            let Some(&id) = vocab.get(word) else {
                continue;
            };
            // First vector wins when a word is listed twice
            if id == PAD_ID || filled.contains(&id) {
                continue;
            }

            let vector = fields
                .filter(|f| !f.is_empty())
                .map(str::parse::<f32>)
                .collect::<Result<Vec<f32>, _>>()
                .with_context(|| format!("line {}: non-numeric component for '{word}'", i + 1))?;
            if vector.len() != dim {
                bail!(
                    "line {}: '{word}' has {} components, expected {dim}",
                    i + 1,
                    vector.len()
                );
            }

            let start = id as usize * dim;
            table.values[start..start + dim].copy_from_slice(&vector);
            filled.insert(id);
        }
        table.hits = filled.len();
        Ok(table)
    }

    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        Tensor::from_data(
            TensorData::new(self.values.clone(), [self.vocab_size, self.dim]),
            device,
        )
    }
}
