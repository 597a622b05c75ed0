/// Inverts each query's ordered shard list into per-shard query lists,
/// keeping only the first `fanout` entries (or fewer when a pruned list is
/// shorter). Query ids come out ascending per shard because queries are
/// walked in input order.
pub fn route_queries(lists: &[Vec<(u32, u32)>], fanout: usize, num_shards: usize) -> Vec<Vec<u32>> {
    let mut routed = vec![Vec::new(); num_shards];
    for (query, list) in lists.iter().enumerate() {
        for &(shard, _) in list.iter().take(fanout) {
            routed[shard as usize].push(query as u32);
        }
    }
    routed
}
