use crate::math::{FlatVectors, nearest_center};
use rand::Rng;

/// Lloyd refinement is capped; shard-local clusterings converge fast and a
/// hard cap keeps the representative-building stage predictable.
pub const MAX_LLOYD_ITERS: usize = 15;

pub struct KMeansResult {
    pub centers: FlatVectors,
    /// Training rows assigned to each center in the final pass.
    pub counts: Vec<u32>,
}

/// k-means++ seeding followed by at most [`MAX_LLOYD_ITERS`] Lloyd
/// iterations and a final assignment pass that fills `counts`.
///
/// The number of centers is capped at the number of training rows, so a
/// degenerate request (`k > rows`) yields fewer centers instead of
/// crashing; callers pad the missing slots.
pub fn run_kmeans(data: &FlatVectors, k: usize, rng: &mut impl Rng) -> KMeansResult {
    let n = data.rows();
    assert!(n > 0, "run_kmeans: empty training data");
    let k = k.min(n);
    let dim = data.dim;

    let mut centers = seed_plus_plus(data, k, rng);

    // usize::MAX forces the first pass to count as a change, so a single
    // cluster still gets its mean update.
    let mut assignment = vec![usize::MAX; n];
    for _ in 0..MAX_LLOYD_ITERS {
        // A. Assign
        let mut changed = false;
        for i in 0..n {
            let (best, _) = nearest_center(data.row(i), &centers);
            if assignment[i] != best {
                assignment[i] = best;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        // B. Update means; a center that lost all its rows keeps its spot
        let mut sums = vec![0.0f32; k * dim];
        let mut sizes = vec![0u32; k];
        for i in 0..n {
            let c = assignment[i];
            sizes[c] += 1;
            let acc = &mut sums[c * dim..(c + 1) * dim];
            for (a, &x) in acc.iter_mut().zip(data.row(i)) {
                *a += x;
            }
        }
        for c in 0..k {
            if sizes[c] == 0 {
                continue;
            }
            let inv = 1.0 / sizes[c] as f32;
            let row = centers.row_mut(c);
            for (dst, &s) in row.iter_mut().zip(&sums[c * dim..(c + 1) * dim]) {
                *dst = s * inv;
            }
        }
    }

    // C. Final counts against the settled centers
    let mut counts = vec![0u32; k];
    for i in 0..n {
        counts[nearest_center(data.row(i), &centers).0] += 1;
    }

    KMeansResult { centers, counts }
}

/// k-means++: first center uniform, the rest sampled proportionally to the
/// squared distance from the nearest already-chosen center.
fn seed_plus_plus(data: &FlatVectors, k: usize, rng: &mut impl Rng) -> FlatVectors {
    let n = data.rows();
    let mut centers = FlatVectors::zeroed(k, data.dim);

    let first = rng.random_range(0..n);
    centers.row_mut(0).copy_from_slice(data.row(first));

    let mut min_dist = vec![f32::MAX; n];
    for c in 1..k {
        for i in 0..n {
            let d = crate::math::l2_sq(data.row(i), centers.row(c - 1));
            if d < min_dist[i] {
                min_dist[i] = d;
            }
        }

        let total: f32 = min_dist.iter().sum();
        if total <= 0.0 {
            // All remaining mass is zero (duplicate points); fall back to uniform.
            let idx = rng.random_range(0..n);
            centers.row_mut(c).copy_from_slice(data.row(idx));
            continue;
        }

        let target = rng.random_range(0.0..total);
        let mut cumulative = 0.0;
        let mut pick = n - 1;
        for (i, &d) in min_dist.iter().enumerate() {
            cumulative += d;
            if cumulative >= target {
                pick = i;
                break;
            }
        }
        centers.row_mut(c).copy_from_slice(data.row(pick));
    }

    centers
}
