// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Turns a raw corpus sentence into an AspectSentence.
//
// Corpus sentences carry the target as a `$T$` placeholder:
//
//   "the $T$ was cold but the staff were lovely"   target: "soup"
//
// Steps:
//   1. Normalise characters (tabs, NBSP, zero-width, control chars)
//   2. Lowercase
//   3. Split on whitespace — the corpora ship pre-tokenised,
//      punctuation is already separated and kept as tokens
//   4. Cut the token stream at the marker into left / right

use anyhow::{bail, Result};

use crate::domain::sentence::{AspectSentence, Polarity};

/// Placeholder standing for the target inside a corpus sentence.
pub const TARGET_MARKER: &str = "$T$";

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Map problematic Unicode to plain spaces and lowercase.
    pub fn clean(&self, text: &str) -> String {
        text.chars()
            .map(|c| match c {
                '\t' | '\r' | '\n' => ' ',
                '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_control() => ' ',
                c => c,
            })
            .collect::<String>()
            .to_lowercase()
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.clean(text)
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Split `sentence` at its single `$T$` marker.
    ///
    /// The marker may be glued to punctuation (`$T$,`); whatever
    /// follows it on the same token stays in the right context.
    pub fn split_marked(
        &self,
        sentence: &str,
        target:   &str,
        polarity: Option<Polarity>,
    ) -> Result<AspectSentence> {
        let Some((before, after)) = sentence.split_once(TARGET_MARKER) else {
            bail!("sentence has no {TARGET_MARKER} marker: '{sentence}'");
        };
        if after.contains(TARGET_MARKER) {
            bail!("sentence has more than one {TARGET_MARKER} marker: '{sentence}'");
        }

        let target = self.tokenize(target);
        if target.is_empty() {
            bail!("empty target for sentence '{sentence}'");
        }

        Ok(AspectSentence::new(
            self.tokenize(before),
            target,
            self.tokenize(after),
            polarity,
        ))
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
