use crate::kmeans;
use crate::math::{FlatVectors, closest_centers, dot, l2_sq};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;
use tracing::warn;

/// Sentinel coordinate for the representatives of an empty shard; far
/// enough that no finite query ever ranks the shard early.
pub const JUNK_COORD: f32 = 1e15;

/// Weiszfeld runs a fixed even number of iterations so the two-buffer
/// alternation lands on the primary buffer.
pub const WEISZFELD_ITERS: usize = 100;

const WEISZFELD_EPS: f32 = 1e-9;

/// `K_sub` representatives per shard, stored flat: rows
/// `s * per_shard .. (s + 1) * per_shard` belong to shard `s`.
#[derive(Debug, Clone)]
pub struct Subcenters {
    pub centers: FlatVectors,
    pub per_shard: usize,
}

impl Subcenters {
    #[inline]
    pub fn shard_of_row(&self, row: usize) -> u32 {
        (row / self.per_shard) as u32
    }

    #[inline]
    pub fn row(&self, shard: usize, slot: usize) -> &[f32] {
        self.centers.row(shard * self.per_shard + slot)
    }
}

/// Representative set of the whole partition. The shapes differ per
/// builder, so this is a sum type rather than optional fields.
#[derive(Debug, Clone)]
pub enum ShardRepresentatives {
    /// One vector per shard (centroid or geometric median).
    Single(FlatVectors),
    /// `K_sub` vectors per shard, no occupancy information.
    Multi(Subcenters),
    /// `K_sub` vectors per shard plus the k-means subcluster sizes.
    MultiWithCounts(Subcenters, Vec<u32>),
}

pub fn fill_junk(row: &mut [f32]) {
    row.fill(JUNK_COORD);
}

/// Mean of each shard's points. Empty shards get the junk sentinel.
pub fn build_centroids(points: &FlatVectors, members: &[Vec<u32>]) -> FlatVectors {
    let dim = points.dim;
    let mut out = FlatVectors::zeroed(members.len(), dim);
    out.data
        .par_chunks_mut(dim)
        .zip(members.par_iter())
        .for_each(|(row, ids)| {
            if ids.is_empty() {
                fill_junk(row);
                return;
            }
            for &p in ids {
                for (acc, &x) in row.iter_mut().zip(points.row(p as usize)) {
                    *acc += x;
                }
            }
            let inv = 1.0 / ids.len() as f32;
            for v in row.iter_mut() {
                *v *= inv;
            }
        });
    out
}

/// Geometric median of each shard via Weiszfeld's fixed-point iteration.
pub fn build_geomedians(points: &FlatVectors, members: &[Vec<u32>]) -> FlatVectors {
    let dim = points.dim;
    let mut out = FlatVectors::zeroed(members.len(), dim);
    out.data
        .par_chunks_mut(dim)
        .zip(members.par_iter())
        .for_each(|(row, ids)| weiszfeld(points, ids, row));
    out
}

fn weiszfeld(points: &FlatVectors, ids: &[u32], out: &mut [f32]) {
    match ids.len() {
        0 => fill_junk(out),
        1 => out.copy_from_slice(points.row(ids[0] as usize)),
        _ => {
            let dim = out.len();
            // Estimate starts at the midpoint of the first two members.
            let mut cur = vec![0.0f32; dim];
            let a = points.row(ids[0] as usize);
            let b = points.row(ids[1] as usize);
            for i in 0..dim {
                cur[i] = (a[i] + b[i]) / 2.0;
            }
            let mut next = vec![0.0f32; dim];
            let mut numerator = vec![0.0f32; dim];

            for _ in 0..WEISZFELD_ITERS {
                numerator.fill(0.0);
                let mut denominator = 0.0f32;
                for &p in ids {
                    let prow = points.row(p as usize);
                    let dist = l2_sq(prow, &cur).sqrt();
                    if dist > WEISZFELD_EPS {
                        for i in 0..dim {
                            numerator[i] += prow[i] / dist;
                        }
                        denominator += 1.0 / dist;
                    }
                }
                if denominator > 0.0 {
                    for i in 0..dim {
                        next[i] = numerator[i] / denominator;
                    }
                } else {
                    // Every member sits on the estimate already.
                    next.copy_from_slice(&cur);
                }
                std::mem::swap(&mut cur, &mut next);
            }
            out.copy_from_slice(&cur);
        }
    }
}

/// Per-shard k-means subcentroids plus subcluster sizes.
///
/// Each shard clusters under its own RNG derived from `base_seed`, so the
/// result is reproducible and the shards can run in parallel. When a shard
/// has fewer points than `k_sub`, the unused slots are junk with count 0.
pub fn build_kmeans_subcenters(
    points: &FlatVectors,
    members: &[Vec<u32>],
    k_sub: usize,
    base_seed: u64,
) -> (Subcenters, Vec<u32>) {
    let dim = points.dim;
    let mut centers = FlatVectors::zeroed(members.len() * k_sub, dim);
    let mut counts = vec![0u32; members.len() * k_sub];

    centers
        .data
        .par_chunks_mut(k_sub * dim)
        .zip(counts.par_chunks_mut(k_sub))
        .enumerate()
        .for_each(|(shard, (block, shard_counts))| {
            let ids = &members[shard];
            if ids.is_empty() {
                fill_junk(block);
                return;
            }

            // Project the shard into a dense training block.
            let mut train = FlatVectors::zeroed(ids.len(), dim);
            for (i, &p) in ids.iter().enumerate() {
                train.row_mut(i).copy_from_slice(points.row(p as usize));
            }

            let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(shard as u64));
            let result = kmeans::run_kmeans(&train, k_sub, &mut rng);

            let k_eff = result.centers.rows();
            block[..k_eff * dim].copy_from_slice(&result.centers.data);
            shard_counts[..k_eff].copy_from_slice(&result.counts);
            for slot in k_eff..k_sub {
                fill_junk(&mut block[slot * dim..(slot + 1) * dim]);
            }
        });

    (
        Subcenters {
            centers,
            per_shard: k_sub,
        },
        counts,
    )
}

/// First slot is the shard centroid; the rest are members drawn uniformly
/// with replacement. The RNG is entropy-seeded by the caller, so this
/// builder is explicitly nondeterministic. Runs sequentially because the
/// draws share one RNG.
pub fn build_random_subcenters(
    points: &FlatVectors,
    members: &[Vec<u32>],
    centroids: &FlatVectors,
    k_sub: usize,
    rng: &mut impl Rng,
) -> Subcenters {
    let dim = points.dim;
    let mut centers = FlatVectors::zeroed(members.len() * k_sub, dim);

    for (shard, ids) in members.iter().enumerate() {
        let base = shard * k_sub;
        if ids.is_empty() {
            for slot in 0..k_sub {
                fill_junk(centers.row_mut(base + slot));
            }
            continue;
        }
        centers.row_mut(base).copy_from_slice(centroids.row(shard));
        for slot in 1..k_sub {
            let p = ids[rng.random_range(0..ids.len())];
            centers
                .row_mut(base + slot)
                .copy_from_slice(points.row(p as usize));
        }
    }

    Subcenters {
        centers,
        per_shard: k_sub,
    }
}

/// Slot `k` interpolates toward the k-th closest shard centroid:
/// `2/3 * own + 1/3 * kth_closest`. Slot 0 is the shard's own centroid,
/// because a centroid is always its own nearest center.
pub fn build_neighbor_subcenters(
    centroids: &FlatVectors,
    members: &[Vec<u32>],
    k_sub: usize,
) -> Subcenters {
    let dim = centroids.dim;
    assert!(
        k_sub <= centroids.rows(),
        "neighbor subcenters need k_sub <= num_shards"
    );
    let neighbor_order = closest_centers(centroids, centroids, k_sub);
    let mut centers = FlatVectors::zeroed(members.len() * k_sub, dim);

    centers
        .data
        .par_chunks_mut(k_sub * dim)
        .zip(members.par_iter())
        .enumerate()
        .for_each(|(shard, (block, ids))| {
            if ids.is_empty() {
                fill_junk(block);
                return;
            }
            let own = centroids.row(shard);
            for (slot, &kth) in neighbor_order[shard].iter().enumerate() {
                if slot == 0 && kth != shard as u32 {
                    warn!(shard, "own centroid is not its nearest center");
                }
                let other = centroids.row(kth as usize);
                let row = &mut block[slot * dim..(slot + 1) * dim];
                for i in 0..dim {
                    row[i] = own[i] * (2.0 / 3.0) + other[i] * (1.0 / 3.0);
                }
            }
        });

    Subcenters {
        centers,
        per_shard: k_sub,
    }
}

/// First slot is the shard centroid; each further slot takes the unvisited
/// member maximizing the dot product with a fresh standard-normal
/// direction, sketching the shard's extreme points. Entropy-seeded and
/// sequential, like the random-sample builder.
pub fn build_linmax_subcenters(
    points: &FlatVectors,
    members: &[Vec<u32>],
    centroids: &FlatVectors,
    k_sub: usize,
    rng: &mut impl Rng,
) -> Subcenters {
    let dim = points.dim;
    let mut centers = FlatVectors::zeroed(members.len() * k_sub, dim);
    let mut direction = vec![0.0f32; dim];

    for (shard, ids) in members.iter().enumerate() {
        let base = shard * k_sub;
        if ids.is_empty() {
            for slot in 0..k_sub {
                fill_junk(centers.row_mut(base + slot));
            }
            continue;
        }
        centers.row_mut(base).copy_from_slice(centroids.row(shard));

        let mut used = vec![false; ids.len()];
        for slot in 1..k_sub {
            for d in direction.iter_mut() {
                *d = rng.sample(StandardNormal);
            }
            let mut best: Option<(usize, f32)> = None;
            for (j, &p) in ids.iter().enumerate() {
                if used[j] {
                    continue;
                }
                let value = dot(points.row(p as usize), &direction);
                if best.is_none_or(|(_, max)| value > max) {
                    best = Some((j, value));
                }
            }
            match best {
                Some((j, _)) => {
                    centers
                        .row_mut(base + slot)
                        .copy_from_slice(points.row(ids[j] as usize));
                    used[j] = true;
                }
                // Shard exhausted; the remaining slots stay out of reach.
                None => fill_junk(centers.row_mut(base + slot)),
            }
        }
    }

    Subcenters {
        centers,
        per_shard: k_sub,
    }
}
