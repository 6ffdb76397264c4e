use rand::Rng;
use tracing::warn;

/// Consecutive empty draws tolerated before a roll gives up on the remainder.
pub const MAX_EMPTY_DRAWS: usize = 4;

fn draw<T, R: Rng + ?Sized>(bucket: &mut Vec<T>, rng: &mut R) -> Option<T> {
    if bucket.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..bucket.len());
    Some(bucket.swap_remove(index))
}

/// Draws up to `count` items uniformly at random, each at most once
/// (partial Fisher-Yates over `bucket`).
///
/// Callers clamp `count` to the bucket size first. If the bucket still runs
/// dry, the draw is retried and after [`MAX_EMPTY_DRAWS`] consecutive misses
/// the items chosen so far are returned.
pub fn sample_without_replacement<T, R: Rng + ?Sized>(
    mut bucket: Vec<T>,
    count: usize,
    rng: &mut R,
) -> Vec<T> {
    let mut chosen = Vec::with_capacity(count.min(bucket.len()));
    let mut empty_draws = 0;

    while chosen.len() < count {
        if let Some(item) = draw(&mut bucket, rng) {
            empty_draws = 0;
            chosen.push(item);
            continue;
        }

        empty_draws += 1;
        if empty_draws >= MAX_EMPTY_DRAWS {
            warn!(
                "Bucket ran dry after {} of {} draws, returning a partial roll",
                chosen.len(),
                count
            );
            break;
        }
    }

    chosen
}
