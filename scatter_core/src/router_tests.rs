#[cfg(test)]
mod tests {
    use crate::math::FlatVectors;
    use crate::oracle::ShardCoverage;
    use crate::representatives::{JUNK_COORD, ShardRepresentatives, Subcenters};
    use crate::router::{Mode, RouterContext, Strategy, Submode};

    fn ctx<'a>(
        reps: Option<&'a ShardRepresentatives>,
        shard_sizes: &'a [u32],
    ) -> RouterContext<'a> {
        RouterContext {
            representatives: reps,
            shard_sizes,
            points: None,
            subsampled: None,
            kde_sigma: 0.0,
            k: 0,
            has_truthset: false,
        }
    }

    fn shards_of(list: &[(u32, u32)]) -> Vec<u32> {
        list.iter().map(|&(s, _)| s).collect()
    }

    #[test]
    fn test_mode_parsing_round_trips() {
        for name in [
            "from_ground_truth",
            "centroids",
            "geomedian",
            "multicentroids",
            "multicentroids-random",
            "multicentroids-neighbors",
            "multicentroids-linmax",
            "kde",
        ] {
            assert_eq!(Mode::parse(name).unwrap().as_str(), name);
        }
        assert!(Mode::parse("medoids").is_none());
    }

    #[test]
    fn test_centroid_tie_routes_to_lower_shard() {
        // Shard centroids (0,1) and (10,1); the query (5,1) is equidistant,
        // so shard 0 wins the tie.
        let centers = FlatVectors::from_vec(vec![0.0, 1.0, 10.0, 1.0], 2);
        let reps = ShardRepresentatives::Single(centers);
        let sizes = [2u32, 2];
        let strategy = Strategy::build(Mode::Centroids, Submode::MinDistance, ctx(Some(&reps), &sizes))
            .unwrap();

        let queries = FlatVectors::from_vec(vec![5.0, 1.0], 2);
        let lists = strategy.rank(&queries, &ShardCoverage::empty(1), 2);

        // The full ordering is produced, not just the winner.
        assert_eq!(lists[0].len(), 2);
        assert_eq!(shards_of(&lists[0]), vec![0, 1]);
    }

    #[test]
    fn test_oracle_orders_by_coverage_with_zeros_last() {
        let shard_of = vec![0, 0, 1, 1, 2, 2, 3, 3];
        // Coverage: shard 1 twice, shard 0 once; shards 2 and 3 untouched.
        let gt_ids = vec![2, 3, 0];
        let coverage = ShardCoverage::from_truthset(&gt_ids, 1, 3, 3, &shard_of).unwrap();

        let sizes = [2u32; 4];
        let mut c = ctx(None, &sizes);
        c.has_truthset = true;
        let strategy = Strategy::build(Mode::FromGroundTruth, Submode::MinDistance, c).unwrap();

        let queries = FlatVectors::from_vec(vec![0.0], 1);
        let lists = strategy.rank(&queries, &coverage, 4);

        assert_eq!(lists[0], vec![(1, 2), (0, 1), (2, 0), (3, 0)]);
    }

    #[test]
    fn test_oracle_requires_truthset() {
        let sizes = [1u32; 2];
        let err =
            Strategy::build(Mode::FromGroundTruth, Submode::MinDistance, ctx(None, &sizes))
                .unwrap_err();
        assert!(err.to_string().contains("truthset"));
    }

    #[test]
    fn test_subcenter_sweep_emits_each_shard_once() {
        // Shard 0 subcenters around x=0, shard 1 subcenters around x=10.
        let centers = FlatVectors::from_vec(vec![0.0, 1.0, 10.0, 11.0], 1);
        let reps = ShardRepresentatives::Multi(Subcenters {
            centers,
            per_shard: 2,
        });
        let sizes = [2u32, 2];
        let strategy = Strategy::build(
            Mode::MulticentroidsLinmax,
            Submode::MinDistance,
            ctx(Some(&reps), &sizes),
        )
        .unwrap();

        let queries = FlatVectors::from_vec(vec![9.0], 1);
        let lists = strategy.rank(&queries, &ShardCoverage::empty(1), 2);

        assert_eq!(shards_of(&lists[0]), vec![1, 0]);
    }

    #[test]
    fn test_junk_shard_sinks_to_the_end() {
        // Shard 1 is empty: its subcenters carry the junk sentinel.
        let centers = FlatVectors::from_vec(vec![0.0, 1.0, JUNK_COORD, JUNK_COORD, 5.0, 6.0], 1);
        let reps = ShardRepresentatives::Multi(Subcenters {
            centers,
            per_shard: 2,
        });
        let sizes = [2u32, 0, 2];
        let strategy = Strategy::build(
            Mode::MulticentroidsRandom,
            Submode::MinDistance,
            ctx(Some(&reps), &sizes),
        )
        .unwrap();

        let queries = FlatVectors::from_vec(vec![0.0], 1);
        let lists = strategy.rank(&queries, &ShardCoverage::empty(1), 3);

        assert_eq!(shards_of(&lists[0]), vec![0, 2, 1]);
    }

    #[test]
    fn test_subcluster_mass_weighs_occupancy() {
        // Equidistant subcenters; the heavier subcluster wins.
        let centers = FlatVectors::from_vec(vec![1.0, 0.0, -1.0, 0.0], 2);
        let counts = vec![10, 1];
        let reps = ShardRepresentatives::MultiWithCounts(
            Subcenters {
                centers,
                per_shard: 1,
            },
            counts,
        );
        let sizes = [10u32, 1];
        let strategy = Strategy::build(
            Mode::Multicentroids,
            Submode::SubclusterMass,
            ctx(Some(&reps), &sizes),
        )
        .unwrap();

        let queries = FlatVectors::from_vec(vec![0.0, 0.0], 2);
        let lists = strategy.rank(&queries, &ShardCoverage::empty(1), 2);

        assert_eq!(shards_of(&lists[0]), vec![0, 1]);
    }

    #[test]
    fn test_subcluster_mass_rejects_plain_subcenters() {
        let centers = FlatVectors::from_vec(vec![0.0, 1.0], 1);
        let reps = ShardRepresentatives::Multi(Subcenters {
            centers,
            per_shard: 1,
        });
        let sizes = [1u32, 1];
        let err = Strategy::build(
            Mode::MulticentroidsRandom,
            Submode::SubclusterMass,
            ctx(Some(&reps), &sizes),
        )
        .unwrap_err();
        assert!(err.to_string().contains("submode 2"));
    }

    #[test]
    fn test_worth_walk_stops_at_k() {
        let centers = FlatVectors::from_vec(vec![0.0, 10.0], 1);
        let reps = ShardRepresentatives::Multi(Subcenters {
            centers,
            per_shard: 1,
        });
        let sizes = [10u32, 10];
        let mut c = ctx(Some(&reps), &sizes);
        c.k = 5;
        let strategy =
            Strategy::build(Mode::MulticentroidsRandom, Submode::WorthWalk, c).unwrap();

        let queries = FlatVectors::from_vec(vec![1.0], 1);
        let lists = strategy.rank(&queries, &ShardCoverage::empty(1), 2);

        // Shard 0's single subcenter already accounts for 10 >= K expected
        // points, so shard 1 never accumulates worth.
        assert_eq!(shards_of(&lists[0]), vec![0, 1]);
    }

    #[test]
    fn test_worth_walk_requires_random_subcenters() {
        let centers = FlatVectors::from_vec(vec![0.0, 10.0], 1);
        let reps = ShardRepresentatives::Multi(Subcenters {
            centers,
            per_shard: 1,
        });
        let sizes = [1u32, 1];
        let mut c = ctx(Some(&reps), &sizes);
        c.k = 5;
        let err = Strategy::build(Mode::Multicentroids, Submode::WorthWalk, c).unwrap_err();
        assert!(err.to_string().contains("submode 3"));
    }

    #[test]
    fn test_kde_exact_hit_ranks_its_shard_first() {
        // The query coincides with shard 0's only point; shard 1 is far away.
        let points = FlatVectors::from_vec(vec![0.0, 0.0, 100.0, 100.0], 2);
        let subsampled = vec![vec![0u32], vec![1u32]];
        let sizes = [1u32, 1];
        let mut c = ctx(None, &sizes);
        c.points = Some(&points);
        c.subsampled = Some(&subsampled);
        c.kde_sigma = 1.0;
        let strategy = Strategy::build(Mode::Kde, Submode::MinDistance, c).unwrap();

        let queries = FlatVectors::from_vec(vec![0.0, 0.0], 2);
        let lists = strategy.rank(&queries, &ShardCoverage::empty(1), 2);

        assert_eq!(shards_of(&lists[0]), vec![0, 1]);
    }

    #[test]
    fn test_kde_empty_subsample_scores_zero() {
        let points = FlatVectors::from_vec(vec![50.0, 50.0, 0.0, 0.0], 2);
        // Shard 1 lost all its points to subsampling.
        let subsampled = vec![vec![0u32], vec![]];
        let sizes = [1u32, 1];
        let mut c = ctx(None, &sizes);
        c.points = Some(&points);
        c.subsampled = Some(&subsampled);
        c.kde_sigma = 10.0;
        let strategy = Strategy::build(Mode::Kde, Submode::MinDistance, c).unwrap();

        // Far from everything: shard 0 still gets a tiny positive score,
        // shard 1 gets exactly zero.
        let queries = FlatVectors::from_vec(vec![60.0, 60.0], 2);
        let lists = strategy.rank(&queries, &ShardCoverage::empty(1), 2);

        assert_eq!(shards_of(&lists[0]), vec![0, 1]);
    }

    #[test]
    fn test_kde_rejects_non_positive_sigma() {
        let points = FlatVectors::from_vec(vec![0.0], 1);
        let subsampled = vec![vec![0u32]];
        let sizes = [1u32];
        let mut c = ctx(None, &sizes);
        c.points = Some(&points);
        c.subsampled = Some(&subsampled);
        c.kde_sigma = 0.0;
        let err = Strategy::build(Mode::Kde, Submode::MinDistance, c).unwrap_err();
        assert!(err.to_string().contains("sigma"));
    }

    #[test]
    fn test_routing_lists_carry_coverage() {
        let shard_of = vec![0, 1];
        let coverage = ShardCoverage::from_truthset(&[0, 1], 1, 2, 2, &shard_of).unwrap();

        let centers = FlatVectors::from_vec(vec![0.0, 10.0], 1);
        let reps = ShardRepresentatives::Single(centers);
        let sizes = [1u32, 1];
        let strategy = Strategy::build(
            Mode::Centroids,
            Submode::MinDistance,
            ctx(Some(&reps), &sizes),
        )
        .unwrap();

        let queries = FlatVectors::from_vec(vec![8.0], 1);
        let lists = strategy.rank(&queries, &coverage, 2);

        assert_eq!(lists[0], vec![(1, 1), (0, 1)]);
    }
}
