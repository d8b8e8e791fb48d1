use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::types::GameRecord;

pub type SimRng = ChaCha8Rng;

const DECISION_STREAM: u64 = 0xD1CE_0000_0000_0000;

/// Generator for the record's next tick. The same seed and month always
/// produce the same stream.
pub fn tick_rng(record: &GameRecord) -> SimRng {
    SimRng::seed_from_u64(derive_seed(record.seed, record.months_elapsed as u64))
}

/// Generator for a decision issued between ticks. Keyed by the decision log
/// length so consecutive decisions in one month do not replay the same rolls.
pub fn decision_rng(record: &GameRecord) -> SimRng {
    let key = DECISION_STREAM ^ ((record.months_elapsed as u64) << 20) ^ record.decision_log.len() as u64;
    SimRng::seed_from_u64(derive_seed(record.seed, key))
}

pub fn derive_seed(base_seed: u64, key: u64) -> u64 {
    splitmix64(base_seed ^ key.rotate_left(32))
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Symmetric uniform noise in `[-spread, spread]`.
pub fn noise<R: Rng + ?Sized>(rng: &mut R, spread: f64) -> f64 {
    if spread <= 0.0 {
        return 0.0;
    }
    rng.gen_range(-spread..=spread)
}

pub fn roll<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    if probability <= 0.0 {
        return false;
    }
    if probability >= 1.0 {
        return true;
    }
    rng.gen_bool(probability)
}

/// Cumulative weight walk. Returns `None` when no item carries positive weight.
pub fn weighted_index<R: Rng + ?Sized>(rng: &mut R, weights: &[f64]) -> Option<usize> {
    let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
    if total <= 0.0 {
        return None;
    }
    let mut target = rng.gen_range(0.0..total);
    let mut last_positive = None;
    for (idx, weight) in weights.iter().enumerate() {
        if *weight <= 0.0 {
            continue;
        }
        if target < *weight {
            return Some(idx);
        }
        target -= weight;
        last_positive = Some(idx);
    }
    last_positive
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_seed_changes_per_key() {
        let a = derive_seed(42, 0);
        let b = derive_seed(42, 1);
        let c = derive_seed(43, 0);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn weighted_index_skips_zero_weights() {
        let mut rng = SimRng::seed_from_u64(9);
        for _ in 0..200 {
            let idx = weighted_index(&mut rng, &[0.0, 3.0, 0.0, 1.0]).expect("has weight");
            assert!(idx == 1 || idx == 3);
        }
        assert_eq!(weighted_index(&mut rng, &[0.0, -1.0]), None);
        assert_eq!(weighted_index(&mut rng, &[]), None);
    }

    #[test]
    fn weighted_index_tracks_weights() {
        let mut rng = SimRng::seed_from_u64(3);
        let mut hits = [0_u32; 2];
        for _ in 0..4_000 {
            hits[weighted_index(&mut rng, &[1.0, 3.0]).expect("has weight")] += 1;
        }
        let share = hits[1] as f64 / 4_000.0;
        assert!((share - 0.75).abs() < 0.05, "share {share}");
    }

    #[test]
    fn noise_is_bounded() {
        let mut rng = SimRng::seed_from_u64(1);
        for _ in 0..500 {
            let n = noise(&mut rng, 0.02);
            assert!((-0.02..=0.02).contains(&n));
        }
        assert_eq!(noise(&mut rng, 0.0), 0.0);
    }
}
