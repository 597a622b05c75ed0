use crate::config::{Config, Resolved};
use scatter_core::math::FlatVectors;
use scatter_core::oracle::ShardCoverage;
use scatter_core::partition::{Partition, REPRODUCIBLE_SEED};
use scatter_core::representatives::{
    ShardRepresentatives, build_centroids, build_geomedians, build_kmeans_subcenters,
    build_linmax_subcenters, build_neighbor_subcenters, build_random_subcenters,
};
use scatter_core::router::{Mode, RouterContext, Strategy};
use scatter_core::{Result, ScatterError, dispatch, stats};
use scatter_storage::element::{DataType, VectorElement};
use scatter_storage::shard_writer::{write_point_shards, write_query_shards};
use scatter_storage::vector_file::{VectorSet, load_truthset, save_f32};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::info;

/// One-shot batch pipeline: materialize the shards, then (when a query set
/// is given) rank shards per query and dispatch the top of each list.
pub fn run(config: &Config) -> Result<()> {
    let resolved = config.resolve()?;

    if resolved.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(resolved.threads)
            .build_global()
            .map_err(|e| ScatterError::Config(format!("thread pool: {e}")))?;
    }

    match resolved.data_type {
        DataType::Float => run_typed::<f32>(&resolved),
        DataType::Int8 => run_typed::<i8>(&resolved),
        DataType::Uint8 => run_typed::<u8>(&resolved),
    }
}

fn run_typed<T: VectorElement>(cfg: &Resolved) -> Result<()> {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    info!("reading the dataset {}", cfg.input_file.display());
    let points = VectorSet::<T>::load(&cfg.input_file)?;

    let mut partition_file = File::open(&cfg.hmetis_file).map_err(|e| {
        io::Error::new(e.kind(), format!("{}: {e}", cfg.hmetis_file.display()))
    })?;
    let partition = Partition::parse(&mut partition_file, points.count)?;
    let num_shards = partition.num_shards();
    info!("partition: {} points over {num_shards} shards", points.count);

    // The subsample (the KDE input) comes from the reproducible stream.
    let mut seeded = StdRng::seed_from_u64(REPRODUCIBLE_SEED);
    let subsampled = partition.subsample(cfg.kde_subsampling_rate, &mut seeded);

    info!("writing shards to disk");
    write_point_shards(&cfg.output_file_prefix, &points, &partition.members)?;

    let Some(query_file) = &cfg.query_file else {
        info!("produced {num_shards} shards");
        return Ok(());
    };

    if cfg.query_fanout > num_shards {
        return Err(ScatterError::Config(format!(
            "query fanout {} is larger than the number of shards {num_shards}",
            cfg.query_fanout
        )));
    }

    info!("reading the query set {}", query_file.display());
    let queries = VectorSet::<T>::load(query_file)?;
    if queries.dim != points.dim {
        return Err(ScatterError::Format(format!(
            "dimension mismatch between dataset ({}) and query file ({})",
            points.dim, queries.dim
        )));
    }

    let points_f32 = points.to_f32();
    let queries_f32 = queries.to_f32();
    let shard_sizes = partition.shard_sizes();

    // One representative per shard is computed for every mode and saved;
    // geomedian mode saves the medians under the same _centroids.bin name.
    let singles = if cfg.mode == Mode::Geomedian {
        info!("computing geometric medians");
        build_geomedians(&points_f32, &partition.members)
    } else {
        info!("computing centroids");
        build_centroids(&points_f32, &partition.members)
    };
    let centroids_path = format!("{}_centroids.bin", cfg.output_file_prefix);
    info!("saving per-shard representatives to {centroids_path}");
    save_f32(Path::new(&centroids_path), &singles)?;

    let representatives = match cfg.mode {
        Mode::Centroids | Mode::Geomedian => Some(ShardRepresentatives::Single(singles)),
        Mode::Multicentroids => {
            let (sub, counts) = build_kmeans_subcenters(
                &points_f32,
                &partition.members,
                cfg.num_subcentroids,
                REPRODUCIBLE_SEED,
            );
            info!("computed subcentroids");
            Some(ShardRepresentatives::MultiWithCounts(sub, counts))
        }
        Mode::MulticentroidsRandom => {
            let mut entropy = StdRng::from_os_rng();
            Some(ShardRepresentatives::Multi(build_random_subcenters(
                &points_f32,
                &partition.members,
                &singles,
                cfg.num_subcentroids,
                &mut entropy,
            )))
        }
        Mode::MulticentroidsNeighbors => {
            if cfg.num_subcentroids > num_shards {
                return Err(ScatterError::Config(format!(
                    "num_subcentroids {} exceeds the number of shards {num_shards}",
                    cfg.num_subcentroids
                )));
            }
            Some(ShardRepresentatives::Multi(build_neighbor_subcenters(
                &singles,
                &partition.members,
                cfg.num_subcentroids,
            )))
        }
        Mode::MulticentroidsLinmax => {
            let mut entropy = StdRng::from_os_rng();
            Some(ShardRepresentatives::Multi(build_linmax_subcenters(
                &points_f32,
                &partition.members,
                &singles,
                cfg.num_subcentroids,
                &mut entropy,
            )))
        }
        Mode::FromGroundTruth | Mode::Kde => None,
    };

    let coverage = load_coverage(cfg, &queries_f32, &partition)?;

    let strategy = Strategy::build(
        cfg.mode,
        cfg.submode,
        RouterContext {
            representatives: representatives.as_ref(),
            shard_sizes: &shard_sizes,
            points: Some(&points_f32),
            subsampled: Some(&subsampled),
            kde_sigma: cfg.kde_sigma,
            k: cfg.k,
            has_truthset: cfg.gt_file.is_some(),
        },
    )?;

    let mut lists = strategy.rank(&queries_f32, &coverage, num_shards);
    info!("computed the query -> shard assignment using {}", cfg.mode);

    if cfg.gt_file.is_some() {
        stats::prune_zero_tails(&mut lists)?;
        let report = stats::fanout_report(
            &lists,
            num_shards,
            cfg.k,
            cfg.mode == Mode::FromGroundTruth,
        );
        println!("{report}");
    }

    let routed = dispatch::route_queries(&lists, cfg.query_fanout, num_shards);
    info!("writing query assignments to disk");
    write_query_shards(&cfg.output_file_prefix, &routed)?;

    info!("produced {num_shards} shards");
    Ok(())
}

fn load_coverage(
    cfg: &Resolved,
    queries: &FlatVectors,
    partition: &Partition,
) -> Result<ShardCoverage> {
    let Some(gt_path) = &cfg.gt_file else {
        return Ok(ShardCoverage::empty(queries.rows()));
    };

    info!("reading the truthset {}", gt_path.display());
    let truthset = load_truthset(gt_path)?;
    if truthset.num_queries != queries.rows() {
        return Err(ScatterError::Format(format!(
            "{}: truthset covers {} queries but the query file holds {}",
            gt_path.display(),
            truthset.num_queries,
            queries.rows()
        )));
    }
    ShardCoverage::from_truthset(
        &truthset.ids,
        truthset.num_queries,
        truthset.gt_dim,
        cfg.k,
        &partition.shard_of,
    )
}
