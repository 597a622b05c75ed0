use crate::error::{Result, ScatterError};
use std::fmt;

/// Fanout statistics against the ground-truth oracle.
#[derive(Debug, Clone)]
pub struct FanoutReport {
    pub num_queries: usize,
    pub k: usize,
    pub max_bucket: usize,
    pub mean_fanout: f64,
    pub weighted_fanout: f64,
    /// `histogram[f]` = queries with fanout `f`, for `f` in
    /// `1..=max_bucket`; over-limit fanouts land in the last bucket.
    pub histogram: Vec<usize>,
    /// `coverage_at[f - 1]` = fraction of truth ids covered when every
    /// query asks its top `f` shards.
    pub coverage_at: Vec<f64>,
}

/// Pops trailing zero-coverage entries from every list; those are shards
/// the router would ask in vain. The trimmed length is the query's fanout,
/// and the dispatcher consumes the trimmed lists.
pub fn prune_zero_tails(lists: &mut [Vec<(u32, u32)>]) -> Result<()> {
    for (q, list) in lists.iter_mut().enumerate() {
        while list.last().is_some_and(|&(_, cov)| cov == 0) {
            list.pop();
        }
        if list.is_empty() {
            return Err(ScatterError::Internal(format!(
                "query {q}: routing list empty after tail pruning"
            )));
        }
    }
    Ok(())
}

/// Largest fanout tracked individually by the histogram and the coverage
/// curve. The oracle cannot need more than `K` shards; approximate
/// strategies get headroom.
pub fn max_bucket(num_shards: usize, k: usize, oracle: bool) -> usize {
    if oracle {
        k
    } else {
        num_shards.min(100.max((1.5 * k as f64).ceil() as usize))
    }
}

/// Computes the report from tail-pruned routing lists.
pub fn fanout_report(
    lists: &[Vec<(u32, u32)>],
    num_shards: usize,
    k: usize,
    oracle: bool,
) -> FanoutReport {
    let num_queries = lists.len();
    let max_bucket = max_bucket(num_shards, k, oracle);
    let denom = (num_queries * k) as f64;

    let mean_fanout = lists.iter().map(Vec::len).sum::<usize>() as f64 / num_queries as f64;

    let mut weighted_fanout = 0.0f64;
    for list in lists {
        for (i, &(_, cov)) in list.iter().enumerate() {
            weighted_fanout += (i as u64 * cov as u64) as f64;
        }
    }
    weighted_fanout /= denom;

    let mut histogram = vec![0usize; max_bucket + 1];
    for list in lists {
        histogram[list.len().min(max_bucket)] += 1;
    }

    let mut coverage_at = Vec::with_capacity(max_bucket);
    let mut covered = 0u64;
    for f in 1..=max_bucket {
        for list in lists {
            if let Some(&(_, cov)) = list.get(f - 1) {
                covered += cov as u64;
            }
        }
        coverage_at.push(covered as f64 / denom);
    }

    FanoutReport {
        num_queries,
        k,
        max_bucket,
        mean_fanout,
        weighted_fanout,
        histogram,
        coverage_at,
    }
}

impl fmt::Display for FanoutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Statistics on fanout:")?;
        writeln!(f, "Average fanout: {:.2}", self.mean_fanout)?;
        writeln!(
            f,
            "\"Weighted average\" fanout: {:.2}",
            self.weighted_fanout
        )?;
        writeln!(f)?;

        writeln!(f, "Histogram of fanouts:")?;
        for fanout in 1..=self.max_bucket {
            let marker = if fanout < self.max_bucket { " " } else { "+" };
            writeln!(
                f,
                "{fanout:>3}{marker} -- {:.2}%",
                100.0 * self.histogram[fanout] as f64 / self.num_queries as f64
            )?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "Coverage (best possible recall) if taking top F shards for every query:"
        )?;
        for fanout in 1..=self.max_bucket {
            writeln!(
                f,
                "{fanout:>3} -- {:.2}%",
                100.0 * self.coverage_at[fanout - 1]
            )?;
        }
        Ok(())
    }
}
