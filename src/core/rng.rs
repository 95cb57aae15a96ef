//! Seedable randomness for shuffles and random draws.
//!
//! All randomness on the table flows through the [`Shuffler`] trait:
//! - [`TableRng`]: ChaCha8-backed, deterministic for a given seed
//! - [`SequenceShuffler`]: scripted indices, for tests that need to
//!   verify an exact Fisher–Yates trace
//!
//! ```
//! use rust_tabletop::core::{fisher_yates, TableRng};
//!
//! let mut rng = TableRng::new(42);
//! let mut cards = vec!["c1", "c2", "c3"];
//! fisher_yates(&mut cards, &mut rng);
//!
//! let mut sorted = cards.clone();
//! sorted.sort();
//! assert_eq!(sorted, vec!["c1", "c2", "c3"]);
//! ```

use im::Vector;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniform indices.
pub trait Shuffler {
    /// Return an index uniformly distributed in `0..upper`.
    ///
    /// Callers guarantee `upper > 0`.
    fn next_index(&mut self, upper: usize) -> usize;
}

/// Deterministic RNG for table play.
///
/// Uses ChaCha8 for speed; the same seed always reproduces the same
/// sequence of shuffles and random draws.
#[derive(Clone, Debug)]
pub struct TableRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl TableRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create an RNG seeded from the thread-local entropy source.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// The seed this RNG was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Shuffler for TableRng {
    fn next_index(&mut self, upper: usize) -> usize {
        self.inner.gen_range(0..upper)
    }
}

/// Scripted shuffler: replays a fixed list of indices.
///
/// Each value is reduced modulo the requested bound, and the script
/// wraps around when exhausted. An empty script always yields 0.
#[derive(Clone, Debug, Default)]
pub struct SequenceShuffler {
    script: Vec<usize>,
    cursor: usize,
}

impl SequenceShuffler {
    #[must_use]
    pub fn new(script: impl Into<Vec<usize>>) -> Self {
        Self {
            script: script.into(),
            cursor: 0,
        }
    }

    /// Number of indices handed out so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.cursor
    }
}

impl Shuffler for SequenceShuffler {
    fn next_index(&mut self, upper: usize) -> usize {
        let value = if self.script.is_empty() {
            0
        } else {
            self.script[self.cursor % self.script.len()]
        };
        self.cursor += 1;
        value % upper
    }
}

/// Core Fisher–Yates loop over an abstract sequence of length `len`.
///
/// Walks `i` from `len - 1` down to 1, swapping `i` with
/// `j = next_index(i + 1)`.
fn fisher_yates_by(len: usize, rng: &mut impl Shuffler, mut swap: impl FnMut(usize, usize)) {
    for i in (1..len).rev() {
        let j = rng.next_index(i + 1);
        swap(i, j);
    }
}

/// Shuffle a slice in place.
pub fn fisher_yates<T>(slice: &mut [T], rng: &mut impl Shuffler) {
    fisher_yates_by(slice.len(), rng, |i, j| slice.swap(i, j));
}

/// Shuffle a persistent vector in place.
pub fn fisher_yates_vector<T: Clone>(vector: &mut Vector<T>, rng: &mut impl Shuffler) {
    fisher_yates_by(vector.len(), rng, |i, j| vector.swap(i, j));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut rng1 = TableRng::new(42);
        let mut rng2 = TableRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.next_index(1000), rng2.next_index(1000));
        }
    }

    #[test]
    fn test_different_seeds() {
        let mut rng1 = TableRng::new(1);
        let mut rng2 = TableRng::new(2);

        let seq1: Vec<_> = (0..10).map(|_| rng1.next_index(1000)).collect();
        let seq2: Vec<_> = (0..10).map(|_| rng2.next_index(1000)).collect();

        assert_ne!(seq1, seq2);
    }

    #[test]
    fn test_shuffle_keeps_elements() {
        let mut rng = TableRng::new(42);
        let mut data = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        let original = data.clone();

        fisher_yates(&mut data, &mut rng);

        assert_eq!(data.len(), original.len());
        assert_ne!(data, original);

        data.sort();
        assert_eq!(data, original);
    }

    #[test]
    fn test_scripted_trace() {
        // i=2 -> j=0: [c3, c2, c1]; i=1 -> j=1: unchanged
        let mut rng = SequenceShuffler::new(vec![0, 1]);
        let mut deck = vec!["c1", "c2", "c3"];

        fisher_yates(&mut deck, &mut rng);

        assert_eq!(deck, vec!["c3", "c2", "c1"]);
        assert_eq!(rng.calls(), 2);
    }

    #[test]
    fn test_vector_shuffle_matches_slice_shuffle() {
        let mut slice = vec![1, 2, 3, 4, 5];
        let mut vector: Vector<i32> = slice.iter().copied().collect();

        fisher_yates(&mut slice, &mut SequenceShuffler::new(vec![3, 0, 2, 1]));
        fisher_yates_vector(&mut vector, &mut SequenceShuffler::new(vec![3, 0, 2, 1]));

        assert_eq!(slice, vector.iter().copied().collect::<Vec<_>>());
    }

    #[test]
    fn test_sequence_shuffler_wraps_and_reduces() {
        let mut rng = SequenceShuffler::new(vec![7]);
        assert_eq!(rng.next_index(3), 1);
        assert_eq!(rng.next_index(5), 2);

        let mut empty = SequenceShuffler::default();
        assert_eq!(empty.next_index(4), 0);
    }

    #[test]
    fn test_empty_and_single_are_noops() {
        let mut rng = SequenceShuffler::new(vec![5]);
        let mut empty: Vec<u8> = vec![];
        fisher_yates(&mut empty, &mut rng);
        let mut one = vec![9];
        fisher_yates(&mut one, &mut rng);

        assert_eq!(one, vec![9]);
        assert_eq!(rng.calls(), 0);
    }
}
