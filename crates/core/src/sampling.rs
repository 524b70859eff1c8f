//! Shuffle and distractor-sampling helpers for session generation.
//!
//! All functions are pure given the supplied RNG; callers pass a seeded
//! `StdRng` in tests and `rand::rng()` in production.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::{Term, TermId};

/// Returns a uniformly random permutation of `items` (Fisher–Yates).
#[must_use]
pub fn shuffled<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}

/// Samples up to `limit` incorrect definitions for a multiple-choice question.
///
/// Draws without replacement from every term except `exclude`. When fewer than
/// `limit` alternatives exist, returns as many as are available; never pads
/// with duplicates.
#[must_use]
pub fn distractors<R: Rng + ?Sized>(
    terms: &[Term],
    exclude: &TermId,
    limit: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut pool: Vec<String> = terms
        .iter()
        .filter(|t| t.id != *exclude)
        .map(|t| t.definition.clone())
        .collect();
    pool.shuffle(rng);
    pool.truncate(limit);
    pool
}
