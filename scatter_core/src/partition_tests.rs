#[cfg(test)]
mod tests {
    use crate::partition::{Partition, REPRODUCIBLE_SEED};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_parse_and_invert() {
        let mut input = "0 0 1 1".as_bytes();
        let partition = Partition::parse(&mut input, 4).unwrap();

        assert_eq!(partition.num_shards(), 2);
        assert_eq!(partition.shard_of, vec![0, 0, 1, 1]);
        assert_eq!(partition.members, vec![vec![0, 1], vec![2, 3]]);
        assert_eq!(partition.shard_sizes(), vec![2, 2]);
    }

    #[test]
    fn test_members_cover_all_points_disjointly() {
        let mut input = "2 0 1\n1 2 0".as_bytes();
        let partition = Partition::parse(&mut input, 6).unwrap();

        let total: usize = partition.members.iter().map(Vec::len).sum();
        assert_eq!(total, 6);

        let mut seen = vec![false; 6];
        for members in &partition.members {
            for &p in members {
                assert!(!seen[p as usize], "point {p} in two shards");
                seen[p as usize] = true;
            }
            // Scanning in point order keeps member lists strictly increasing.
            assert!(members.windows(2).all(|w| w[0] < w[1]));
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_rejects_out_of_range_shard_id() {
        let mut input = "0 12000".as_bytes();
        let err = Partition::parse(&mut input, 2).unwrap_err();
        assert!(err.to_string().contains("sanity bound"));
    }

    #[test]
    fn test_rejects_non_numeric_token() {
        let mut input = "0 abc".as_bytes();
        assert!(Partition::parse(&mut input, 2).is_err());
    }

    #[test]
    fn test_rejects_short_read() {
        let mut input = "0 1".as_bytes();
        let err = Partition::parse(&mut input, 4).unwrap_err();
        assert!(err.to_string().contains("expected 4"));
    }

    #[test]
    fn test_subsample_rate_one_keeps_everything() {
        let mut input = "0 1 0 1".as_bytes();
        let partition = Partition::parse(&mut input, 4).unwrap();

        let mut rng = StdRng::seed_from_u64(REPRODUCIBLE_SEED);
        let sub = partition.subsample(1.0, &mut rng);
        assert_eq!(sub, partition.members);
    }

    #[test]
    fn test_subsample_is_reproducible() {
        let mut input = "0 0 0 0 1 1 1 1".as_bytes();
        let partition = Partition::parse(&mut input, 8).unwrap();

        let mut rng_a = StdRng::seed_from_u64(REPRODUCIBLE_SEED);
        let mut rng_b = StdRng::seed_from_u64(REPRODUCIBLE_SEED);
        let a = partition.subsample(0.5, &mut rng_a);
        let b = partition.subsample(0.5, &mut rng_b);
        assert_eq!(a, b);
    }
}
