#[cfg(test)]
mod tests {
    use crate::dispatch::route_queries;

    #[test]
    fn test_top_f_inversion() {
        let lists = vec![vec![(0, 5), (1, 2)], vec![(1, 4), (0, 1)]];

        let routed = route_queries(&lists, 1, 2);
        assert_eq!(routed, vec![vec![0], vec![1]]);

        let routed = route_queries(&lists, 2, 2);
        assert_eq!(routed, vec![vec![0, 1], vec![0, 1]]);
    }

    #[test]
    fn test_short_lists_dispatch_what_they_have() {
        // The second query's list was tail-pruned below the fanout.
        let lists = vec![vec![(0, 1), (1, 1), (2, 1)], vec![(2, 3)]];

        let routed = route_queries(&lists, 2, 3);
        assert_eq!(routed, vec![vec![0], vec![0], vec![1]]);
    }

    #[test]
    fn test_query_ids_ascend_per_shard() {
        let lists = vec![
            vec![(1, 0)],
            vec![(0, 0)],
            vec![(1, 0)],
            vec![(1, 0)],
        ];
        let routed = route_queries(&lists, 1, 2);
        assert_eq!(routed[1], vec![0, 2, 3]);
        assert!(routed[1].windows(2).all(|w| w[0] < w[1]));
    }
}
