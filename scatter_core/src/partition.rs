use crate::error::{Result, ScatterError};
use rand::Rng;
use std::io::Read;

/// Sanity bound on shard ids coming out of the external partitioner.
pub const MAX_SHARDS: usize = 10_000;

/// Seed for everything that must be reproducible across runs: the KDE
/// subsample and the k-means++ draws.
pub const REPRODUCIBLE_SEED: u64 = 3500;

/// The shard assignment produced by the external hypergraph partitioner,
/// loaded once and immutable for the rest of the run.
#[derive(Debug, Clone)]
pub struct Partition {
    /// 0-based shard id of every point, in point-id order.
    pub shard_of: Vec<u32>,
    /// Inverse mapping; member lists are strictly increasing because the
    /// assignment is scanned in point-id order.
    pub members: Vec<Vec<u32>>,
}

impl Partition {
    /// Parses `num_points` whitespace-separated shard ids and inverts them.
    pub fn parse(input: &mut impl Read, num_points: usize) -> Result<Self> {
        let mut text = String::new();
        input.read_to_string(&mut text)?;

        let mut shard_of = Vec::with_capacity(num_points);
        let mut num_shards = 0usize;
        for token in text.split_whitespace().take(num_points) {
            let shard: usize = token.parse().map_err(|_| {
                ScatterError::Format(format!("partition file: invalid shard id {token:?}"))
            })?;
            if shard >= MAX_SHARDS {
                return Err(ScatterError::Format(format!(
                    "partition file: shard id {shard} exceeds the sanity bound {MAX_SHARDS}"
                )));
            }
            num_shards = num_shards.max(shard + 1);
            shard_of.push(shard as u32);
        }
        if shard_of.len() < num_points {
            return Err(ScatterError::Format(format!(
                "partition file: expected {num_points} shard ids, found {}",
                shard_of.len()
            )));
        }

        let mut members = vec![Vec::new(); num_shards];
        for (point, &shard) in shard_of.iter().enumerate() {
            members[shard as usize].push(point as u32);
        }

        Ok(Self { shard_of, members })
    }

    pub fn num_shards(&self) -> usize {
        self.members.len()
    }

    pub fn shard_sizes(&self) -> Vec<u32> {
        self.members.iter().map(|m| m.len() as u32).collect()
    }

    /// Independently keeps each point with probability `rate`. Feeding a
    /// seeded RNG makes the subsample reproducible run-to-run.
    pub fn subsample(&self, rate: f32, rng: &mut impl Rng) -> Vec<Vec<u32>> {
        self.members
            .iter()
            .map(|members| {
                members
                    .iter()
                    .copied()
                    .filter(|_| rng.random::<f32>() < rate)
                    .collect()
            })
            .collect()
    }
}
