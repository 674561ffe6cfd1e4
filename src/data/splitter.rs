// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Used when no separate validation corpus is given. Shuffles
// the sentences and cuts them into two sets:
//   - Training set:   used to update model weights
//   - Validation set: used to pick the best epoch
//
// Why hold out validation sentences?
//   Training accuracy keeps climbing as the model memorises
//   the corpus. Accuracy on sentences it never trained on is
//   what tells us which epoch's checkpoint to keep.
//
// Why shuffle before splitting?
//   Benchmark files are often grouped: all sentences about
//   one review, or several targets of the same sentence in a
//   row. Cutting without a shuffle would put whole reviews on
//   one side only.
//
// The shuffle uses a seeded StdRng, so the same seed always
// produces the same split and runs can be compared.
//
// Reference: rand crate documentation (SliceRandom)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, validation).
///
/// `train_fraction` of the samples (rounded) go to training.
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;
    let split_at = split_at.min(total);

    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        samples.len(),
        val.len(),
        (samples.len() * 100) / total.max(1),
        (val.len()     * 100) / total.max(1),
    );

    (samples, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = split_train_val(items, 0.8, 7);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize>     = (0..50).collect();
        let (train, val)          = split_train_val(items, 0.7, 7);
        let mut all: Vec<usize>   = train.into_iter().chain(val).collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_train_val((0..30).collect::<Vec<usize>>(), 0.5, 42);
        let b = split_train_val((0..30).collect::<Vec<usize>>(), 0.5, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, val)      = split_train_val(items, 0.8, 1);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_full_training_split() {
        let items: Vec<usize> = (0..10).collect();
        let (train, val)      = split_train_val(items, 1.0, 1);
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }
}
