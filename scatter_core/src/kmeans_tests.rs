#[cfg(test)]
mod tests {
    use crate::kmeans::run_kmeans;
    use crate::math::FlatVectors;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_k_equals_1_is_the_mean() {
        // With K=1, the center must be the exact average of all rows.
        let data = FlatVectors::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3);
        let mut rng = StdRng::seed_from_u64(7);

        let result = run_kmeans(&data, 1, &mut rng);

        let c = result.centers.row(0);
        assert!((c[0] - 2.5).abs() < 0.001);
        assert!((c[1] - 3.5).abs() < 0.001);
        assert!((c[2] - 4.5).abs() < 0.001);
        assert_eq!(result.counts, vec![2]);
    }

    #[test]
    fn test_separates_two_blobs() {
        let mut data = Vec::new();
        for _ in 0..100 {
            data.extend_from_slice(&[10.0, 10.0]);
        }
        for _ in 0..100 {
            data.extend_from_slice(&[-10.0, -10.0]);
        }
        let data = FlatVectors::from_vec(data, 2);
        let mut rng = StdRng::seed_from_u64(42);

        let result = run_kmeans(&data, 2, &mut rng);

        let mut firsts: Vec<f32> = (0..2).map(|c| result.centers.row(c)[0]).collect();
        firsts.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((firsts[0] + 10.0).abs() < 0.001);
        assert!((firsts[1] - 10.0).abs() < 0.001);
        assert_eq!(result.counts.iter().sum::<u32>(), 200);
        assert_eq!(result.counts, vec![100, 100]);
    }

    #[test]
    fn test_caps_k_at_row_count() {
        let data = FlatVectors::from_vec(vec![0.0, 0.0, 9.0, 9.0], 2);
        let mut rng = StdRng::seed_from_u64(1);

        let result = run_kmeans(&data, 5, &mut rng);

        assert_eq!(result.centers.rows(), 2);
        assert_eq!(result.counts.iter().sum::<u32>(), 2);
    }

    #[test]
    fn test_identical_points_produce_no_nan() {
        // 50 copies of the same row; the distance mass is zero everywhere.
        let data = FlatVectors::from_vec(vec![1.0; 50 * 4], 4);
        let mut rng = StdRng::seed_from_u64(3);

        let result = run_kmeans(&data, 5, &mut rng);

        for c in 0..result.centers.rows() {
            for &v in result.centers.row(c) {
                assert!(!v.is_nan());
            }
        }
        assert_eq!(result.counts.iter().sum::<u32>(), 50);
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let data = FlatVectors::from_vec((0..60).map(|i| i as f32).collect(), 3);

        let a = run_kmeans(&data, 4, &mut StdRng::seed_from_u64(3500));
        let b = run_kmeans(&data, 4, &mut StdRng::seed_from_u64(3500));

        assert_eq!(a.centers.data, b.centers.data);
        assert_eq!(a.counts, b.counts);
    }
}
