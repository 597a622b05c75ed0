use crate::element::VectorElement;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use scatter_core::math::FlatVectors;
use scatter_core::{Result, ScatterError};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

fn open_named(path: &Path) -> io::Result<File> {
    File::open(path).map_err(|e| io::Error::new(e.kind(), format!("{}: {e}", path.display())))
}

/// A dataset or query set loaded from the `count | dim | body` layout.
#[derive(Debug, Clone)]
pub struct VectorSet<T> {
    pub data: Vec<T>,
    pub count: usize,
    pub dim: usize,
}

impl<T: VectorElement> VectorSet<T> {
    /// Loads a vector file, validating the header against the file size so
    /// a short or padded file fails loudly instead of truncating.
    pub fn load(path: &Path) -> Result<Self> {
        let file = open_named(path)?;
        let actual_size = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let count = reader.read_u32::<LittleEndian>()? as usize;
        let dim = reader.read_u32::<LittleEndian>()? as usize;
        if dim == 0 {
            return Err(ScatterError::Format(format!(
                "{}: zero dimension in header",
                path.display()
            )));
        }

        let expected_size = 8 + (count * dim * T::WIDTH) as u64;
        if actual_size != expected_size {
            return Err(ScatterError::Format(format!(
                "{}: header claims {count} x {dim} vectors ({expected_size} bytes) \
                 but the file holds {actual_size} bytes",
                path.display()
            )));
        }

        let mut data = Vec::with_capacity(count * dim);
        for _ in 0..count * dim {
            data.push(T::read_from(&mut reader)?);
        }

        Ok(Self { data, count, dim })
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Widens the whole set to `f32` for the distance kernels.
    pub fn to_f32(&self) -> FlatVectors {
        FlatVectors::from_vec(self.data.iter().map(|&v| v.to_f32()).collect(), self.dim)
    }
}

/// Saves `rows x dim` floats under the same `count | dim | body` layout
/// (used for the per-shard representative file).
pub fn save_f32(path: &Path, vectors: &FlatVectors) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| io::Error::new(e.kind(), format!("{}: {e}", path.display())))?;
    let mut writer = BufWriter::new(file);

    writer.write_u32::<LittleEndian>(vectors.rows() as u32)?;
    writer.write_u32::<LittleEndian>(vectors.dim as u32)?;
    for &v in &vectors.data {
        writer.write_f32::<LittleEndian>(v)?;
    }
    writer.flush()?;
    Ok(())
}

/// Ground-truth neighbor ids, `gt_dim` per query.
#[derive(Debug, Clone)]
pub struct Truthset {
    pub ids: Vec<u32>,
    pub num_queries: usize,
    pub gt_dim: usize,
}

/// Loads a truthset: `num_queries | gt_dim | ids`, optionally followed by
/// the same count of f32 distances. The distance block is detected by file
/// size and skipped; the router only needs the ids.
pub fn load_truthset(path: &Path) -> Result<Truthset> {
    let file = open_named(path)?;
    let actual_size = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let num_queries = reader.read_u32::<LittleEndian>()? as usize;
    let gt_dim = reader.read_u32::<LittleEndian>()? as usize;

    let ids_only = 8 + (num_queries * gt_dim * 4) as u64;
    let with_distances = 8 + (num_queries * gt_dim * 8) as u64;
    if actual_size != ids_only && actual_size != with_distances {
        return Err(ScatterError::Format(format!(
            "{}: header claims {num_queries} x {gt_dim} entries but the file \
             holds {actual_size} bytes (expected {ids_only} or {with_distances})",
            path.display()
        )));
    }

    let mut ids = Vec::with_capacity(num_queries * gt_dim);
    for _ in 0..num_queries * gt_dim {
        ids.push(reader.read_u32::<LittleEndian>()?);
    }

    Ok(Truthset {
        ids,
        num_queries,
        gt_dim,
    })
}
