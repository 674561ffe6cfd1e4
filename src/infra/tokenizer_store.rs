// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Word-level vocabulary persisted as a HuggingFace tokenizer
// JSON. The corpora are already tokenised, so the tokenizer only
// lowercases and splits on whitespace; every word maps to exactly
// one id, which keeps ids aligned with the words shown in
// attention reports.
//
// Ids:
//   0  [PAD]
//   1  [UNK]
//   2… corpus words, most frequent first

use anyhow::{Context, Result};
use std::{collections::HashMap, path::PathBuf};
use tokenizers::Tokenizer;

use crate::domain::sentence::AspectSentence;

pub const PAD_TOKEN: &str = "[PAD]";
pub const UNK_TOKEN: &str = "[UNK]";
pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;
const RESERVED: usize = 2;

const TOKENIZER_FILE: &str = "tokenizer.json";

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load an existing tokenizer or build one from `sentences`
    pub fn load_or_build(
        &self,
        sentences:  &[AspectSentence],
        vocab_size: usize,
    ) -> Result<Tokenizer> {
        if self.dir.join(TOKENIZER_FILE).exists() {
            tracing::info!("Loading existing tokenizer from disk");
            self.load()
        } else {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(sentences, vocab_size)
        }
    }

    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.dir.join(TOKENIZER_FILE);
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    fn build_and_save(&self, sentences: &[AspectSentence], vocab_size: usize) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let vocab = build_vocab(sentences, vocab_size);
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": PAD_ID, "content": PAD_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": UNK_ID, "content": UNK_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": { "type": "Lowercase" },
            "pre_tokenizer": { "type": "WhitespaceSplit" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let tok_path = self.dir.join(TOKENIZER_FILE);
        std::fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write '{}'", tok_path.display()))?;

        tracing::info!(
            "Tokenizer built with {} entries, saved to '{}'",
            vocab.len(),
            tok_path.display()
        );

        Tokenizer::from_file(&tok_path)
            .map_err(|e| anyhow::anyhow!("Cannot reload tokenizer: {e}"))
    }
}

/// Word → id, capped at `vocab_size` entries including the
/// reserved ones. Ties in frequency are broken alphabetically so
/// the same corpus always yields the same ids.
pub fn build_vocab(sentences: &[AspectSentence], vocab_size: usize) -> HashMap<String, u32> {
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for word in sentences.iter().flat_map(AspectSentence::words) {
        *freq.entry(word).or_insert(0) += 1;
    }

    let mut words: Vec<(&str, usize)> = freq
        .into_iter()
        .filter(|(w, _)| *w != PAD_TOKEN && *w != UNK_TOKEN)
        .collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    words.truncate(vocab_size.saturating_sub(RESERVED));

    let mut vocab = HashMap::with_capacity(words.len() + RESERVED);
    vocab.insert(PAD_TOKEN.to_string(), PAD_ID);
    vocab.insert(UNK_TOKEN.to_string(), UNK_ID);
    for (i, (word, _)) in words.into_iter().enumerate() {
        vocab.insert(word.to_string(), (i + RESERVED) as u32);
    }
    vocab
}

/// Encode already-split words; one id per word.
pub fn encode_words(tokenizer: &Tokenizer, words: &[String]) -> Result<Vec<u32>> {
    if words.is_empty() {
        return Ok(Vec::new());
    }
    let encoding = tokenizer
        .encode(words.join(" "), false)
        .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
    Ok(encoding.get_ids().to_vec())
}
