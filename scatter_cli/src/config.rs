use clap::Parser;
use scatter_core::router::{Mode, Submode};
use scatter_core::{Result, ScatterError};
use scatter_storage::element::DataType;
use std::path::PathBuf;

/// Applies an externally computed shard assignment to a vector dataset and
/// routes a query set to the resulting shards.
#[derive(Parser, Debug, Clone)]
#[command(name = "scatter", version, about, long_about = None)]
pub struct Config {
    /// Element type of points and queries <float/int8/uint8>
    #[arg(long, default_value = "float")]
    pub data_type: String,

    /// Path to the dataset .bin file
    #[arg(long)]
    pub input_file: PathBuf,

    /// Path to the partition file (i-th token = 0-based shard id of point i)
    #[arg(long)]
    pub hmetis_file: PathBuf,

    /// Output file prefix. Produces <prefix>_subshard-<s>.bin,
    /// <prefix>_subshard-<s>_ids_uint32.bin and <prefix>_centroids.bin
    #[arg(long)]
    pub output_file_prefix: String,

    /// Path to the query .bin file (optional)
    #[arg(long)]
    pub query_file: Option<PathBuf>,

    /// Path to the ground-truth .bin file (optional)
    #[arg(long)]
    pub gt_file: Option<PathBuf>,

    /// How to route queries to shards (from_ground_truth / centroids /
    /// multicentroids / multicentroids-random / multicentroids-neighbors /
    /// multicentroids-linmax / geomedian / kde)
    #[arg(long, default_value = "centroids")]
    pub mode: String,

    /// Truthset cutoff: how many true neighbors count per query
    #[arg(long = "K", visible_alias = "recall_at", default_value_t = 0)]
    pub k: u32,

    /// How many shards each query is dispatched to
    #[arg(long, default_value_t = 0)]
    pub query_fanout: u32,

    /// Subcentroids per shard (multicentroids modes)
    #[arg(long, default_value_t = 0)]
    pub num_subcentroids: u32,

    /// Gaussian bandwidth for kde routing
    #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
    pub kde_sigma: f32,

    /// Probability of keeping a point in the kde subsample
    #[arg(long, default_value_t = 1.0)]
    pub kde_subsampling_rate: f32,

    /// Multicentroid ranking rule: 1 = closest subcentroid, 2 = subcluster
    /// mass, 3 = worth walk
    #[arg(long, default_value_t = 1)]
    pub multicentroid_submode: u32,

    /// Worker threads for the parallel stages (0 = one per core)
    #[arg(long, env = "SCATTER_THREADS", default_value_t = 0)]
    pub threads: usize,
}

/// Configuration after the cross-option checks, with strings resolved to
/// their enums. Everything here is consistent; later stages only validate
/// facts that need the loaded inputs (e.g. fanout vs. shard count).
#[derive(Debug, Clone)]
pub struct Resolved {
    pub data_type: DataType,
    pub mode: Mode,
    pub submode: Submode,
    pub input_file: PathBuf,
    pub hmetis_file: PathBuf,
    pub output_file_prefix: String,
    pub query_file: Option<PathBuf>,
    pub gt_file: Option<PathBuf>,
    pub k: usize,
    pub query_fanout: usize,
    pub num_subcentroids: usize,
    pub kde_sigma: f32,
    pub kde_subsampling_rate: f32,
    pub threads: usize,
}

impl Config {
    pub fn resolve(&self) -> Result<Resolved> {
        let data_type = DataType::parse(&self.data_type).ok_or_else(|| {
            ScatterError::Config(format!(
                "unsupported data type {:?}; use float, int8 or uint8",
                self.data_type
            ))
        })?;

        let mode = Mode::parse(&self.mode).ok_or_else(|| {
            ScatterError::Config(format!(
                "unsupported mode {:?}; use from_ground_truth, centroids, \
                 multicentroids, multicentroids-random, multicentroids-neighbors, \
                 multicentroids-linmax, geomedian or kde",
                self.mode
            ))
        })?;

        let submode = Submode::parse(self.multicentroid_submode).ok_or_else(|| {
            ScatterError::Config(format!(
                "multicentroid submode must be 1, 2 or 3, got {}",
                self.multicentroid_submode
            ))
        })?;

        if self.query_file.is_some() && self.query_fanout == 0 {
            return Err(ScatterError::Config(
                "query_fanout must be given if a query file is to be partitioned".to_string(),
            ));
        }
        if mode == Mode::FromGroundTruth && self.gt_file.is_none() {
            return Err(ScatterError::Config(
                "using from_ground_truth mode but no ground truth file given".to_string(),
            ));
        }
        if self.gt_file.is_some() && self.k == 0 {
            return Err(ScatterError::Config(
                "if ground truth given, must also specify K".to_string(),
            ));
        }
        if mode.is_multicentroid() && self.num_subcentroids == 0 {
            return Err(ScatterError::Config(
                "if multicentroids mode, must specify num_subcentroids".to_string(),
            ));
        }
        if mode == Mode::Kde && self.kde_sigma <= 0.0 {
            return Err(ScatterError::Config(format!(
                "if kde mode, must specify a positive kde_sigma (got {})",
                self.kde_sigma
            )));
        }
        if !(self.kde_subsampling_rate > 0.0 && self.kde_subsampling_rate <= 1.0) {
            return Err(ScatterError::Config(format!(
                "kde_subsampling_rate must be in (0, 1], got {}",
                self.kde_subsampling_rate
            )));
        }
        if submode == Submode::SubclusterMass && mode != Mode::Multicentroids {
            return Err(ScatterError::Config(
                "submode 2 only works with multicentroids as it needs the \
                 k-means subcluster counts"
                    .to_string(),
            ));
        }
        if submode == Submode::WorthWalk && mode != Mode::MulticentroidsRandom {
            return Err(ScatterError::Config(
                "submode 3 only works with multicentroids-random".to_string(),
            ));
        }
        if submode == Submode::WorthWalk && self.k == 0 {
            return Err(ScatterError::Config(
                "submode 3 needs K (the truthset cutoff)".to_string(),
            ));
        }

        Ok(Resolved {
            data_type,
            mode,
            submode,
            input_file: self.input_file.clone(),
            hmetis_file: self.hmetis_file.clone(),
            output_file_prefix: self.output_file_prefix.clone(),
            query_file: self.query_file.clone(),
            gt_file: self.gt_file.clone(),
            k: self.k as usize,
            query_fanout: self.query_fanout as usize,
            num_subcentroids: self.num_subcentroids as usize,
            kde_sigma: self.kde_sigma,
            kde_subsampling_rate: self.kde_subsampling_rate,
            threads: self.threads,
        })
    }
}
