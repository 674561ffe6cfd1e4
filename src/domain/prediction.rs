// ============================================================
// Layer 3 — Prediction Domain Types
// ============================================================
// What the classifier hands back to the user: a polarity,
// the class distribution, and where each attention pass looked.

use serde::{Deserialize, Serialize};

use crate::domain::sentence::Polarity;

/// One token and the attention weight it received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenWeight {
    pub token:  String,
    pub weight: f32,
}

/// Token-level weights of the four attention passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttentionReport {
    /// Left context, attended with the target-left representation
    pub left:         Vec<TokenWeight>,
    /// Target, attended with the left-context pool
    pub target_left:  Vec<TokenWeight>,
    /// Target, attended with the right-context pool
    pub target_right: Vec<TokenWeight>,
    /// Right context, attended with the target-right representation
    pub right:        Vec<TokenWeight>,
}

impl AttentionReport {
    /// Pair `tokens` with the leading `tokens.len()` weights.
    pub fn pair(tokens: &[String], weights: &[f32]) -> Vec<TokenWeight> {
        tokens
            .iter()
            .zip(weights)
            .map(|(token, &weight)| TokenWeight { token: token.clone(), weight })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub polarity:      Polarity,
    /// Indexed by class id
    pub probabilities: Vec<f32>,
    pub attention:     AttentionReport,
}

impl Prediction {
    pub fn confidence(&self) -> f32 {
        self.probabilities
            .get(self.polarity.class_id())
            .copied()
            .unwrap_or_default()
    }
}

/// Accuracy and confusion counts over a labelled corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub total:     usize,
    pub correct:   usize,
    /// `confusion[true_class][predicted_class]`
    pub confusion: Vec<Vec<usize>>,
}

impl EvaluationReport {
    pub fn new(num_classes: usize) -> Self {
        Self { total: 0, correct: 0, confusion: vec![vec![0; num_classes]; num_classes] }
    }

    pub fn record(&mut self, truth: usize, predicted: usize) {
        self.total += 1;
        if truth == predicted {
            self.correct += 1;
        }
        if let Some(cell) = self.confusion.get_mut(truth).and_then(|row| row.get_mut(predicted)) {
            *cell += 1;
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.correct as f64 / self.total as f64 }
    }

    /// Fraction of `class` samples predicted as `class`; None when the class is absent.
    pub fn class_recall(&self, class: usize) -> Option<f64> {
        let row   = self.confusion.get(class)?;
        let total: usize = row.iter().sum();
        (total > 0).then(|| row[class] as f64 / total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_stops_at_shorter_side() {
        let tokens  = vec!["good".to_string(), "food".to_string()];
        let weights = [0.7, 0.3, 0.0, 0.0];
        let paired  = AttentionReport::pair(&tokens, &weights);
        assert_eq!(paired.len(), 2);
        assert_eq!(paired[1], TokenWeight { token: "food".into(), weight: 0.3 });
    }

    #[test]
    fn test_confidence_reads_predicted_class() {
        let p = Prediction {
            polarity:      Polarity::Positive,
            probabilities: vec![0.1, 0.2, 0.7],
            attention:     AttentionReport::default(),
        };
        assert_eq!(p.confidence(), 0.7);
    }

    #[test]
    fn test_evaluation_report_counts() {
        let mut report = EvaluationReport::new(3);
        report.record(0, 0);
        report.record(2, 1);
        report.record(2, 2);
        report.record(2, 2);

        assert_eq!(report.total, 4);
        assert_eq!(report.correct, 3);
        assert!((report.accuracy() - 0.75).abs() < 1e-12);
        assert_eq!(report.confusion[2], vec![0, 1, 2]);
        assert_eq!(report.class_recall(1), None);
        assert!((report.class_recall(2).unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }
}
