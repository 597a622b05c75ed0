use crate::error::{Result, ScatterError};

/// Per-query count of true nearest neighbors falling into each shard.
///
/// Entries are sparse (at most `K` per query) and kept in first-touch
/// order, which makes the oracle ordering deterministic.
#[derive(Debug, Clone)]
pub struct ShardCoverage {
    per_query: Vec<Vec<(u32, u32)>>,
}

impl ShardCoverage {
    /// Coverage when no truthset was supplied: every lookup yields 0.
    pub fn empty(num_queries: usize) -> Self {
        Self {
            per_query: vec![Vec::new(); num_queries],
        }
    }

    /// Folds the first `k` truth ids of every query through the partition.
    pub fn from_truthset(
        gt_ids: &[u32],
        num_queries: usize,
        gt_dim: usize,
        k: usize,
        shard_of: &[u32],
    ) -> Result<Self> {
        if gt_dim < k {
            return Err(ScatterError::Format(format!(
                "ground truth dimension {gt_dim} smaller than K {k}"
            )));
        }

        let mut per_query = Vec::with_capacity(num_queries);
        for q in 0..num_queries {
            let mut entries: Vec<(u32, u32)> = Vec::new();
            for &gt_id in &gt_ids[q * gt_dim..q * gt_dim + k] {
                let shard = *shard_of.get(gt_id as usize).ok_or_else(|| {
                    ScatterError::Format(format!(
                        "truthset: point id {gt_id} outside the dataset (query {q})"
                    ))
                })?;
                match entries.iter_mut().find(|(s, _)| *s == shard) {
                    Some((_, count)) => *count += 1,
                    None => entries.push((shard, 1)),
                }
            }
            per_query.push(entries);
        }

        Ok(Self { per_query })
    }

    pub fn num_queries(&self) -> usize {
        self.per_query.len()
    }

    /// Coverage of `shard` for `query`; 0 when the shard holds none of the
    /// query's truth ids (or no truthset was given).
    #[inline]
    pub fn get(&self, query: usize, shard: u32) -> u32 {
        self.per_query[query]
            .iter()
            .find(|(s, _)| *s == shard)
            .map_or(0, |(_, count)| *count)
    }

    /// Sparse `(shard, count)` entries for `query`, in first-touch order.
    pub fn entries(&self, query: usize) -> &[(u32, u32)] {
        &self.per_query[query]
    }
}
