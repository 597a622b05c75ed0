use rayon::prelude::*;
use std::cmp::Ordering;

/// Flat row-major storage for fixed-dimension vectors.
///
/// Keeping the rows contiguous gives the distance kernels cache locality
/// and lets callers hand out disjoint row chunks to worker threads.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatVectors {
    pub data: Vec<f32>,
    pub dim: usize,
}

impl FlatVectors {
    pub fn zeroed(rows: usize, dim: usize) -> Self {
        Self {
            data: vec![0.0; rows * dim],
            dim,
        }
    }

    pub fn from_vec(data: Vec<f32>, dim: usize) -> Self {
        assert!(dim > 0, "FlatVectors: dim must be positive");
        assert_eq!(data.len() % dim, 0, "FlatVectors: ragged data");
        Self { data, dim }
    }

    pub fn rows(&self) -> usize {
        self.data.len() / self.dim
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [f32] {
        let dim = self.dim;
        &mut self.data[i * dim..(i + 1) * dim]
    }
}

/// Squared Euclidean distance (L2^2).
#[inline]
pub fn l2_sq(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Index and squared distance of the center closest to `vec`.
#[inline]
pub fn nearest_center(vec: &[f32], centers: &FlatVectors) -> (usize, f32) {
    let mut best_idx = 0;
    let mut min_dist = f32::MAX;
    for i in 0..centers.rows() {
        let dist = l2_sq(vec, centers.row(i));
        if dist < min_dist {
            min_dist = dist;
            best_idx = i;
        }
    }
    (best_idx, min_dist)
}

/// For every query row, the indices of the `k` closest center rows in
/// ascending distance order. Ties go to the lower center index, so the
/// ordering is deterministic. Parallel over queries.
pub fn closest_centers(queries: &FlatVectors, centers: &FlatVectors, k: usize) -> Vec<Vec<u32>> {
    assert_eq!(
        queries.dim, centers.dim,
        "closest_centers: dimension mismatch"
    );
    let num_centers = centers.rows();
    let k = k.min(num_centers);

    (0..queries.rows())
        .into_par_iter()
        .map(|q| {
            let qrow = queries.row(q);
            let dists: Vec<f32> = (0..num_centers)
                .map(|c| l2_sq(qrow, centers.row(c)))
                .collect();
            let mut order: Vec<u32> = (0..num_centers as u32).collect();
            // Stable sort keeps the lower index first on equal distances.
            order.sort_by(|&a, &b| {
                dists[a as usize]
                    .partial_cmp(&dists[b as usize])
                    .unwrap_or(Ordering::Equal)
            });
            order.truncate(k);
            order
        })
        .collect()
}

/// Ranks indices by descending score; ties go to the lower index.
pub fn order_by_score_desc(scores: &[f32]) -> Vec<u32> {
    let mut order: Vec<u32> = (0..scores.len() as u32).collect();
    order.sort_by(|&a, &b| {
        scores[b as usize]
            .total_cmp(&scores[a as usize])
            .then(a.cmp(&b))
    });
    order
}
