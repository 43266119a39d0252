//! Shuffle order generation
//!
//! The queue never reorders its items; shuffle produces a permutation of
//! queue indices (the play order) using Fisher-Yates.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Create the random source used for shuffling
///
/// A seed gives a reproducible order, otherwise the generator is seeded from
/// the OS.
pub fn shuffle_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Random permutation of `0..len` with `first` (if any) moved to the front
///
/// Keeping the current item first means the rest of the shuffled queue plays
/// after it.
pub fn shuffled_order<R: Rng + ?Sized>(len: usize, first: Option<usize>, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);

    if let Some(first) = first {
        if let Some(pos) = order.iter().position(|&i| i == first) {
            order.swap(0, pos);
        }
    }

    order
}

/// Random insertion point in `after..=len` for a newly added item
///
/// Items are only inserted after the current position so the upcoming part
/// of the shuffled order absorbs them.
pub fn insertion_point<R: Rng + ?Sized>(after: usize, len: usize, rng: &mut R) -> usize {
    if after >= len {
        return len;
    }
    rng.gen_range(after..=len)
}
