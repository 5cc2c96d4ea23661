use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

/// Picks up to `count` distinct reviewers uniformly at random, without
/// replacement, from the candidates not listed in `exclude`. Returns
/// fewer than `count` ids when the filtered pool is too small; never
/// fails. The RNG is injected so tests can pin the outcome with a seed.
pub fn pick_reviewers<R: Rng + ?Sized>(
    rng: &mut R,
    candidates: &[String],
    count: usize,
    exclude: &HashSet<String>,
) -> Vec<String> {
    let eligible: Vec<&String> = candidates
        .iter()
        .filter(|id| !exclude.contains(*id))
        .collect();

    eligible
        .choose_multiple(rng, count)
        .map(|id| (*id).clone())
        .collect()
}
