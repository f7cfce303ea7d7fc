//! Greedy constructions giving quick upper bounds on the minimal span.
//!
//! The deterministic seeder appends the smallest admissible value at every step. The
//! randomized variant occasionally skips an admissible value, which sometimes lands on a
//! shorter sequence; the best of several attempts is kept.

use crate::diffs::{DiffCounts, MultiplicityTracker};
use rand::Rng;

/// Builds a valid `k`-element sequence by always appending the smallest admissible value.
pub fn greedy_sequence(k: usize, gamma: usize) -> Vec<u32> {
    let mut tracker = DiffCounts::new(gamma);
    extend_greedy(&mut tracker, vec![0], k, |_| true)
}

/// Like [`greedy_sequence`], but each admissible value is rejected with probability `skip`.
///
/// # Panics
/// Panics in debug builds if `skip` is not in `[0, 1)`.
pub fn randomized_greedy<R: Rng>(rng: &mut R, k: usize, gamma: usize, skip: f64) -> Vec<u32> {
    debug_assert!((0.0..1.0).contains(&skip), "skip must be in [0, 1)");
    let mut tracker = DiffCounts::new(gamma);
    extend_greedy(&mut tracker, vec![0], k, |_| !rng.random_bool(skip))
}

/// Returns the shortest-span sequence among the deterministic greedy and `attempts`
/// randomized ones.
pub fn best_of<R: Rng>(rng: &mut R, k: usize, gamma: usize, attempts: usize) -> Vec<u32> {
    let mut best = greedy_sequence(k, gamma);
    for attempt in 0..attempts {
        // Sweep skip probabilities from light to heavy perturbation.
        let skip = 0.05 + 0.3 * (attempt % 8) as f64 / 8.0;
        let candidate = randomized_greedy(rng, k, gamma, skip);
        if candidate.last() < best.last() {
            best = candidate;
        }
    }
    best
}

/// Extends `sequence` to `k` elements, taking the first admissible value that `accept` agrees to.
fn extend_greedy<T, F>(tracker: &mut T, mut sequence: Vec<u32>, k: usize, mut accept: F) -> Vec<u32>
where
    T: MultiplicityTracker,
    F: FnMut(u32) -> bool,
{
    if k == 0 {
        return Vec::new();
    }
    while sequence.len() < k {
        let mut val = sequence[sequence.len() - 1] + 1;
        loop {
            if tracker.can_add(val, &sequence) && accept(val) {
                tracker.apply(val, &sequence);
                sequence.push(val);
                break;
            }
            val += 1;
        }
    }
    sequence
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_sequence;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    #[test]
    fn greedy_small_cases() {
        assert!(greedy_sequence(0, 3).is_empty());
        assert_eq!(greedy_sequence(1, 3), vec![0]);
        assert_eq!(greedy_sequence(4, 3), vec![0, 1, 2, 3]);
        assert_eq!(greedy_sequence(5, 3), vec![0, 1, 2, 3, 5]);
        assert_eq!(greedy_sequence(3, 1), vec![0, 1, 3]);
    }

    #[test]
    fn greedy_sequences_are_valid() {
        for gamma in 1..=4 {
            for k in 1..=20 {
                let s = greedy_sequence(k, gamma);
                assert_eq!(s.len(), k);
                assert_eq!(s[0], 0);
                assert!(validate_sequence(&s, gamma).is_valid(), "k={k} gamma={gamma}");
            }
        }
    }

    #[test]
    fn randomized_greedy_is_valid() {
        let mut rng = XorShiftRng::seed_from_u64(7);
        for _ in 0..50 {
            let s = randomized_greedy(&mut rng, 12, 3, 0.3);
            assert_eq!(s.len(), 12);
            assert!(s.windows(2).all(|w| w[0] < w[1]));
            assert!(validate_sequence(&s, 3).is_valid());
        }
    }

    #[test]
    fn best_of_never_worse_than_deterministic() {
        let mut rng = XorShiftRng::seed_from_u64(99);
        for k in 5..=16 {
            let det = greedy_sequence(k, 3);
            let best = best_of(&mut rng, k, 3, 32);
            assert!(best.last() <= det.last());
            assert!(validate_sequence(&best, 3).is_valid());
        }
    }
}
