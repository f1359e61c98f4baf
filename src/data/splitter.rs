// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles samples and splits them into two sets:
//   - Training set:   used to update model weights
//   - Validation set: used to pick the best checkpoint
//
// The shuffle is seeded. `validate` runs long after `train`
// finished and must see exactly the same validation words, so
// the split has to be reproducible from the saved config.
//
// Split ratio: 95% training, 5% validation (configurable)
//
// Reference: rand crate documentation (SeedableRng, SliceRandom)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, validation).
///
/// # Arguments
/// * `samples`        - All available samples (consumed by this function)
/// * `train_fraction` - Proportion for training, e.g. 0.95 = 95%
/// * `seed`           - Shuffle seed; same seed, same split
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    // e.g. 100 samples * 0.95 = 95 → first 95 are training
    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;

    // Clamp to valid range to avoid panics on tiny datasets
    let split_at = split_at.min(total);

    // After this: samples = [0..split_at], val = [split_at..total]
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
        let (train, val)      = split_train_val(items, 0.95, 7);
        assert_eq!(train.len(), 95);
        assert_eq!(val.len(),   5);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..50).collect();
        let (train, val)      = split_train_val(items, 0.7, 7);
        let mut all: Vec<usize> = train.into_iter().chain(val).collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_train_val((0..40).collect::<Vec<u32>>(), 0.8, 42);
        let b = split_train_val((0..40).collect::<Vec<u32>>(), 0.8, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, val)      = split_train_val(items, 0.95, 0);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }
}
