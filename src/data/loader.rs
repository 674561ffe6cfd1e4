// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Reads target-level sentiment corpora stored as line triples:
//
//   the $T$ was cold but the staff were lovely
//   soup
//   -1
//   the soup was cold but the $T$ were lovely
//   staff
//   1
//
// Line 1: sentence with the target replaced by $T$
// Line 2: the target phrase
// Line 3: polarity, -1 / 0 / 1
//
// Blank lines are skipped so hand-edited files with spacing
// between records still load.

use anyhow::{bail, Context, Result};
use std::{fs, path::PathBuf};

use crate::data::preprocessor::Preprocessor;
use crate::domain::sentence::{AspectSentence, Polarity};
use crate::domain::traits::SentenceSource;

pub struct CorpusLoader {
    path:         PathBuf,
    preprocessor: Preprocessor,
}

impl CorpusLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), preprocessor: Preprocessor::new() }
    }
}

impl SentenceSource for CorpusLoader {
    fn load_all(&self) -> Result<Vec<AspectSentence>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read corpus '{}'", self.path.display()))?;
        let sentences = parse_corpus(&text, &self.preprocessor)
            .with_context(|| format!("Malformed corpus '{}'", self.path.display()))?;
        tracing::info!("Loaded {} sentences from '{}'", sentences.len(), self.path.display());
        Ok(sentences)
    }
}

/// Parse line-triple records. Errors name the 1-based line of the
/// record's sentence.
pub fn parse_corpus(text: &str, preprocessor: &Preprocessor) -> Result<Vec<AspectSentence>> {
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect();

    if lines.len() % 3 != 0 {
        let (last_line, _) = lines[lines.len() - lines.len() % 3];
        bail!(
            "incomplete record starting at line {last_line}: \
             expected sentence, target and polarity lines"
        );
    }

    lines
        .chunks(3)
        .map(|record| {
            let (line_no, sentence) = record[0];
            let (_, target) = record[1];
            let (label_line, label) = record[2];

            let polarity = Polarity::from_label(label).with_context(|| {
                format!("line {label_line}: unknown polarity '{label}', expected -1, 0 or 1")
            })?;
            preprocessor
                .split_marked(sentence, target, Some(polarity))
                .with_context(|| format!("record starting at line {line_no}"))
        })
        .collect()
}
