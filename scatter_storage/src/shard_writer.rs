use crate::element::VectorElement;
use crate::vector_file::VectorSet;
use byteorder::{LittleEndian, WriteBytesExt};
use scatter_core::{Result, ScatterError};
use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use tracing::info;

/// Second header word of an id-map file; ids are a single column.
const IDMAP_DIM: u32 = 1;

/// Which flavor of id map a pass produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardPass {
    /// Vectors plus point-id maps.
    Points,
    /// Query-id maps only, no vector payload.
    Queries,
}

pub fn vectors_path(prefix: &str, shard: usize) -> String {
    format!("{prefix}_subshard-{shard}.bin")
}

pub fn idmap_path(prefix: &str, shard: usize, pass: ShardPass) -> String {
    match pass {
        ShardPass::Points => format!("{prefix}_subshard-{shard}_ids_uint32.bin"),
        ShardPass::Queries => format!("{prefix}_subshard-{shard}_query_ids_uint32.bin"),
    }
}

/// One output file with a patchable leading count.
///
/// The count is pre-written as zero so the body can stream through the
/// buffer; `finalize` seeks back and patches the real value.
struct CountedFile {
    writer: BufWriter<File>,
    count: u32,
}

impl CountedFile {
    fn create(path: &str, second_word: u32) -> Result<CountedFile> {
        let file = File::create(path).map_err(|e| open_error(path, e))?;
        let mut writer = BufWriter::new(file);
        writer.write_u32::<LittleEndian>(0)?;
        writer.write_u32::<LittleEndian>(second_word)?;
        Ok(CountedFile { writer, count: 0 })
    }

    fn finalize(mut self) -> Result<u32> {
        self.writer.seek(SeekFrom::Start(0))?;
        self.writer.write_u32::<LittleEndian>(self.count)?;
        self.writer.flush()?;
        Ok(self.count)
    }
}

fn open_error(path: &str, e: io::Error) -> ScatterError {
    ScatterError::Io(io::Error::new(
        e.kind(),
        format!(
            "{path}: {e}; every shard file is open at once, so check the \
             open-file limit (on Linux, `ulimit -n` to check and \
             `ulimit -n 12000` to raise)"
        ),
    ))
}

/// Streams one pass of shard files: vector files plus id maps for points,
/// id maps only for queries. Holds one writer per shard file for the whole
/// pass, like the downstream index builder expects.
pub struct ShardWriter {
    vectors: Vec<Option<CountedFile>>,
    idmaps: Vec<CountedFile>,
    pass: ShardPass,
}

impl ShardWriter {
    pub fn create(prefix: &str, num_shards: usize, dim: u32, pass: ShardPass) -> Result<Self> {
        let mut vectors = Vec::with_capacity(num_shards);
        let mut idmaps = Vec::with_capacity(num_shards);
        for shard in 0..num_shards {
            vectors.push(match pass {
                ShardPass::Points => Some(CountedFile::create(&vectors_path(prefix, shard), dim)?),
                ShardPass::Queries => None,
            });
            idmaps.push(CountedFile::create(
                &idmap_path(prefix, shard, pass),
                IDMAP_DIM,
            )?);
        }
        Ok(Self {
            vectors,
            idmaps,
            pass,
        })
    }

    /// Appends one id to a shard's id map.
    pub fn append_id(&mut self, shard: usize, id: u32) -> Result<()> {
        let idmap = &mut self.idmaps[shard];
        idmap.writer.write_u32::<LittleEndian>(id)?;
        idmap.count += 1;
        Ok(())
    }

    /// Appends one id and its vector (the vector only lands on a point pass).
    pub fn append<T: VectorElement>(&mut self, shard: usize, id: u32, vector: &[T]) -> Result<()> {
        if let Some(data) = &mut self.vectors[shard] {
            for &v in vector {
                v.write_to(&mut data.writer)?;
            }
            data.count += 1;
        }
        self.append_id(shard, id)
    }

    /// Patches every leading count and reports the shard sizes.
    pub fn finish(self) -> Result<Vec<u32>> {
        let mut sizes = Vec::with_capacity(self.idmaps.len());
        for (data, idmap) in self.vectors.into_iter().zip(self.idmaps) {
            if let Some(data) = data {
                data.finalize()?;
            }
            sizes.push(idmap.finalize()?);
        }
        let label = match self.pass {
            ShardPass::Points => "shard sizes",
            ShardPass::Queries => "query counts per shard",
        };
        info!(
            "{label}: {:?} (total {})",
            sizes,
            sizes.iter().map(|&c| c as u64).sum::<u64>()
        );
        Ok(sizes)
    }
}

/// Writes every shard's vectors and point-id map in member order.
pub fn write_point_shards<T: VectorElement>(
    prefix: &str,
    points: &VectorSet<T>,
    members: &[Vec<u32>],
) -> Result<Vec<u32>> {
    let mut writer = ShardWriter::create(prefix, members.len(), points.dim as u32, ShardPass::Points)?;
    for (shard, ids) in members.iter().enumerate() {
        for &point in ids {
            writer.append(shard, point, points.row(point as usize))?;
        }
    }
    writer.finish()
}

/// Writes the per-shard query-id maps produced by the dispatcher.
pub fn write_query_shards(prefix: &str, routed: &[Vec<u32>]) -> Result<Vec<u32>> {
    let mut writer = ShardWriter::create(prefix, routed.len(), 0, ShardPass::Queries)?;
    for (shard, queries) in routed.iter().enumerate() {
        for &query in queries {
            writer.append_id(shard, query)?;
        }
    }
    writer.finish()
}
