use crate::error::{Result, ScatterError};
use crate::math::{FlatVectors, closest_centers, l2_sq, order_by_score_desc};
use crate::oracle::ShardCoverage;
use crate::representatives::{ShardRepresentatives, Subcenters};
use rayon::prelude::*;
use std::fmt;

/// KDE distance blocks are computed for this many queries at a time, which
/// bounds the `batch x N` scratch matrix.
pub const KDE_QUERY_BATCH: usize = 100;

/// How queries are ranked against shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    FromGroundTruth,
    Centroids,
    Geomedian,
    Multicentroids,
    MulticentroidsRandom,
    MulticentroidsNeighbors,
    MulticentroidsLinmax,
    Kde,
}

impl Mode {
    pub fn parse(s: &str) -> Option<Mode> {
        match s {
            "from_ground_truth" => Some(Mode::FromGroundTruth),
            "centroids" => Some(Mode::Centroids),
            "geomedian" => Some(Mode::Geomedian),
            "multicentroids" => Some(Mode::Multicentroids),
            "multicentroids-random" => Some(Mode::MulticentroidsRandom),
            "multicentroids-neighbors" => Some(Mode::MulticentroidsNeighbors),
            "multicentroids-linmax" => Some(Mode::MulticentroidsLinmax),
            "kde" => Some(Mode::Kde),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::FromGroundTruth => "from_ground_truth",
            Mode::Centroids => "centroids",
            Mode::Geomedian => "geomedian",
            Mode::Multicentroids => "multicentroids",
            Mode::MulticentroidsRandom => "multicentroids-random",
            Mode::MulticentroidsNeighbors => "multicentroids-neighbors",
            Mode::MulticentroidsLinmax => "multicentroids-linmax",
            Mode::Kde => "kde",
        }
    }

    pub fn is_multicentroid(&self) -> bool {
        matches!(
            self,
            Mode::Multicentroids
                | Mode::MulticentroidsRandom
                | Mode::MulticentroidsNeighbors
                | Mode::MulticentroidsLinmax
        )
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ranking rule applied on top of multicentroid representatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submode {
    /// Order shards by their closest subcentroid (the default policy).
    MinDistance,
    /// Score shards by subcluster mass over distance; needs k-means counts.
    SubclusterMass,
    /// Accumulate expected coverage while walking subcenters; needs the
    /// random-sample builder and the truthset cutoff `K`.
    WorthWalk,
}

impl Submode {
    pub fn parse(value: u32) -> Option<Submode> {
        match value {
            1 => Some(Submode::MinDistance),
            2 => Some(Submode::SubclusterMass),
            3 => Some(Submode::WorthWalk),
            _ => None,
        }
    }
}

/// Everything a strategy might need; the constructor picks what applies.
pub struct RouterContext<'a> {
    pub representatives: Option<&'a ShardRepresentatives>,
    pub shard_sizes: &'a [u32],
    /// Full dataset, needed by the KDE strategy only.
    pub points: Option<&'a FlatVectors>,
    /// Subsampled shard members, needed by the KDE strategy only.
    pub subsampled: Option<&'a [Vec<u32>]>,
    pub kde_sigma: f32,
    /// Truthset cutoff; 0 when no truthset was supplied.
    pub k: usize,
    pub has_truthset: bool,
}

/// A routing strategy bound to its inputs. One shape of output for all
/// eight variants: per query, an ordered list of `(shard, coverage)`.
#[derive(Debug)]
pub enum Strategy<'a> {
    FromGroundTruth,
    NearestRepresentative {
        centers: &'a FlatVectors,
    },
    SubcenterSweep {
        sub: &'a Subcenters,
    },
    SubclusterMass {
        sub: &'a Subcenters,
        counts: &'a [u32],
    },
    WorthWalk {
        sub: &'a Subcenters,
        shard_sizes: &'a [u32],
        k: usize,
    },
    Kde {
        points: &'a FlatVectors,
        shard_sizes: &'a [u32],
        subsampled: &'a [Vec<u32>],
        sigma: f32,
    },
}

impl<'a> Strategy<'a> {
    /// Binds `mode`/`submode` to the prepared inputs, rejecting
    /// incompatible combinations up front.
    pub fn build(mode: Mode, submode: Submode, ctx: RouterContext<'a>) -> Result<Strategy<'a>> {
        if mode.is_multicentroid() {
            let (sub, counts) = match ctx.representatives {
                Some(ShardRepresentatives::Multi(sub)) => (sub, None),
                Some(ShardRepresentatives::MultiWithCounts(sub, counts)) => {
                    (sub, Some(counts.as_slice()))
                }
                _ => {
                    return Err(ScatterError::Config(format!(
                        "mode {mode} requires subcentroid representatives"
                    )));
                }
            };
            return match submode {
                Submode::MinDistance => Ok(Strategy::SubcenterSweep { sub }),
                Submode::SubclusterMass => {
                    if mode != Mode::Multicentroids {
                        return Err(ScatterError::Config(format!(
                            "submode 2 only works with multicentroids, not {mode}; \
                             it needs the k-means subcluster counts"
                        )));
                    }
                    let counts = counts.ok_or_else(|| {
                        ScatterError::Config(
                            "submode 2 requires k-means subcluster counts".to_string(),
                        )
                    })?;
                    Ok(Strategy::SubclusterMass { sub, counts })
                }
                Submode::WorthWalk => {
                    if mode != Mode::MulticentroidsRandom {
                        return Err(ScatterError::Config(format!(
                            "submode 3 only works with multicentroids-random, not {mode}"
                        )));
                    }
                    if ctx.k == 0 {
                        return Err(ScatterError::Config(
                            "submode 3 needs K (the truthset cutoff)".to_string(),
                        ));
                    }
                    Ok(Strategy::WorthWalk {
                        sub,
                        shard_sizes: ctx.shard_sizes,
                        k: ctx.k,
                    })
                }
            };
        }

        match mode {
            Mode::FromGroundTruth => {
                if !ctx.has_truthset {
                    return Err(ScatterError::Config(
                        "from_ground_truth routing needs a truthset".to_string(),
                    ));
                }
                Ok(Strategy::FromGroundTruth)
            }
            Mode::Centroids | Mode::Geomedian => match ctx.representatives {
                Some(ShardRepresentatives::Single(centers)) => {
                    Ok(Strategy::NearestRepresentative { centers })
                }
                _ => Err(ScatterError::Config(format!(
                    "mode {mode} requires one representative per shard"
                ))),
            },
            Mode::Kde => {
                if ctx.kde_sigma <= 0.0 {
                    return Err(ScatterError::Config(format!(
                        "kde needs a positive sigma, got {}",
                        ctx.kde_sigma
                    )));
                }
                let points = ctx.points.ok_or_else(|| {
                    ScatterError::Config("kde routing needs the dataset in memory".to_string())
                })?;
                let subsampled = ctx.subsampled.ok_or_else(|| {
                    ScatterError::Config("kde routing needs the shard subsample".to_string())
                })?;
                Ok(Strategy::Kde {
                    points,
                    shard_sizes: ctx.shard_sizes,
                    subsampled,
                    sigma: ctx.kde_sigma,
                })
            }
            _ => unreachable!("multicentroid modes handled above"),
        }
    }

    /// Produces, for each query, every shard exactly once in preference
    /// order, tagged with the query's ground-truth coverage of that shard.
    /// Output order across queries equals input order.
    pub fn rank(
        &self,
        queries: &FlatVectors,
        coverage: &ShardCoverage,
        num_shards: usize,
    ) -> Vec<Vec<(u32, u32)>> {
        match self {
            Strategy::FromGroundTruth => (0..coverage.num_queries())
                .into_par_iter()
                .map(|q| {
                    let mut list: Vec<(u32, u32)> = coverage.entries(q).to_vec();
                    // Stable: equal counts keep their first-touch order.
                    list.sort_by(|a, b| b.1.cmp(&a.1));
                    let mut seen = vec![false; num_shards];
                    for &(s, _) in &list {
                        seen[s as usize] = true;
                    }
                    for s in 0..num_shards as u32 {
                        if !seen[s as usize] {
                            list.push((s, 0));
                        }
                    }
                    list
                })
                .collect(),

            Strategy::NearestRepresentative { centers } => {
                closest_centers(queries, *centers, num_shards)
                    .into_par_iter()
                    .enumerate()
                    .map(|(q, order)| attach_coverage(order, q, coverage))
                    .collect()
            }

            Strategy::SubcenterSweep { sub } => {
                closest_centers(queries, &sub.centers, sub.centers.rows())
                    .into_par_iter()
                    .enumerate()
                    .map(|(q, order)| {
                        let mut seen = vec![false; num_shards];
                        let mut list = Vec::with_capacity(num_shards);
                        for row in order {
                            let shard = sub.shard_of_row(row as usize);
                            if !seen[shard as usize] {
                                seen[shard as usize] = true;
                                list.push((shard, coverage.get(q, shard)));
                            }
                        }
                        list
                    })
                    .collect()
            }

            Strategy::SubclusterMass { sub, counts } => (0..queries.rows())
                .into_par_iter()
                .map(|q| {
                    let qrow = queries.row(q);
                    let scores: Vec<f32> = (0..num_shards)
                        .map(|shard| {
                            let mut score = 0.0f32;
                            for slot in 0..sub.per_shard {
                                let idx = shard * sub.per_shard + slot;
                                let count = counts[idx];
                                if count == 0 {
                                    continue;
                                }
                                let dist = l2_sq(qrow, sub.centers.row(idx)).sqrt();
                                score += count as f32 / dist;
                            }
                            score
                        })
                        .collect();
                    attach_coverage(order_by_score_desc(&scores), q, coverage)
                })
                .collect(),

            Strategy::WorthWalk {
                sub,
                shard_sizes,
                k,
            } => closest_centers(queries, &sub.centers, sub.centers.rows())
                .into_par_iter()
                .enumerate()
                .map(|(q, order)| {
                    // Each subcenter seen stands for |shard|/K_sub points at
                    // most this far out; stop once the expected coverage
                    // reaches K.
                    let mut worth = vec![0.0f32; num_shards];
                    let mut total = 0.0f32;
                    for row in order {
                        let shard = sub.shard_of_row(row as usize) as usize;
                        let gain = shard_sizes[shard] as f32 / sub.per_shard as f32;
                        worth[shard] += gain;
                        total += gain;
                        if total >= *k as f32 {
                            break;
                        }
                    }
                    attach_coverage(order_by_score_desc(&worth), q, coverage)
                })
                .collect(),

            Strategy::Kde {
                points,
                shard_sizes,
                subsampled,
                sigma,
            } => {
                let num_queries = queries.rows();
                let inv_two_sigma_sq = 1.0 / (2.0 * sigma * sigma);
                let mut lists = Vec::with_capacity(num_queries);

                for batch_start in (0..num_queries).step_by(KDE_QUERY_BATCH) {
                    let batch_end = (batch_start + KDE_QUERY_BATCH).min(num_queries);

                    // Exact batch x N squared distances, parallel over the
                    // batch; released at batch end.
                    let distances: Vec<Vec<f32>> = (batch_start..batch_end)
                        .into_par_iter()
                        .map(|q| {
                            let qrow = queries.row(q);
                            (0..points.rows())
                                .map(|p| l2_sq(qrow, points.row(p)))
                                .collect()
                        })
                        .collect();

                    for (q, dist_row) in (batch_start..batch_end).zip(&distances) {
                        let scores: Vec<f32> = (0..num_shards)
                            .map(|shard| {
                                let sample = &subsampled[shard];
                                if sample.is_empty() {
                                    return 0.0;
                                }
                                let mut kde = 0.0f32;
                                for &p in sample {
                                    kde += (-dist_row[p as usize] * inv_two_sigma_sq).exp();
                                }
                                // Scale the sample estimate back up to the
                                // full shard population.
                                kde / sample.len() as f32 * shard_sizes[shard] as f32
                            })
                            .collect();
                        lists.push(attach_coverage(order_by_score_desc(&scores), q, coverage));
                    }
                }
                lists
            }
        }
    }
}

fn attach_coverage(order: Vec<u32>, query: usize, coverage: &ShardCoverage) -> Vec<(u32, u32)> {
    order
        .into_iter()
        .map(|shard| (shard, coverage.get(query, shard)))
        .collect()
}
