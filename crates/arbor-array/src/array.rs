//! The [`Array`] handle: metadata accessors and whole-array chunk I/O.
//!
//! Chunks are stored raw (no compressor, no filters) in the chunk store under
//! `<path>/<i>.<j>...`, each holding a full chunk in C order. Edge chunks are
//! padded with the fill value.

use std::sync::Arc;

use arbor_store::path::{basename, join, key_prefix};
use arbor_store::{
    decode_array_metadata, ArrayMetadata, DType, Store, StoreError, ARRAY_META_KEY, ATTRS_KEY,
};
use arbor_sync::{with_lock, Synchronizer};
use serde_json::Value;
use tracing::debug;

use crate::attrs::Attributes;
use crate::data::{element_count, encode_fill_value, ArrayData, ArrayLike};
use crate::error::{ArrayError, ArrayResult};

/// Where an array lives and how its handle is configured.
#[derive(Clone)]
pub struct ArrayLocation {
    pub store: Arc<dyn Store>,
    /// Normalized storage path.
    pub path: String,
    pub chunk_store: Option<Arc<dyn Store>>,
    pub synchronizer: Option<Arc<dyn Synchronizer>>,
    pub read_only: bool,
}

impl ArrayLocation {
    /// A writable location with no separate chunk store or synchronizer.
    pub fn new(store: Arc<dyn Store>, path: impl Into<String>) -> Self {
        Self {
            store,
            path: path.into(),
            chunk_store: None,
            synchronizer: None,
            read_only: false,
        }
    }
}

/// View over an initialized array.
///
/// Metadata is read once when the handle is opened; chunk data is always
/// read from the store.
#[derive(Clone)]
pub struct Array {
    location: ArrayLocation,
    meta: ArrayMetadata,
    attrs: Attributes,
}

impl Array {
    /// Open the array at `location.path`.
    pub fn open(location: ArrayLocation) -> ArrayResult<Self> {
        let meta_key = join(&location.path, ARRAY_META_KEY);
        let meta = match location.store.get(&meta_key) {
            Ok(bytes) => decode_array_metadata(&bytes)?,
            Err(StoreError::KeyNotFound(_)) => {
                return Err(ArrayError::ArrayNotFound(location.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let attrs = Attributes::new(
            Arc::clone(&location.store),
            join(&location.path, ATTRS_KEY),
            location.read_only,
            location.synchronizer.clone(),
        );
        Ok(Self {
            location,
            meta,
            attrs,
        })
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.location.store
    }

    /// Store holding chunk data (the metadata store unless configured).
    pub fn chunk_store(&self) -> &Arc<dyn Store> {
        self.location
            .chunk_store
            .as_ref()
            .unwrap_or(&self.location.store)
    }

    pub fn synchronizer(&self) -> Option<&Arc<dyn Synchronizer>> {
        self.location.synchronizer.as_ref()
    }

    /// Storage path.
    pub fn path(&self) -> &str {
        &self.location.path
    }

    /// Path with a leading `/`.
    pub fn name(&self) -> String {
        format!("/{}", self.location.path)
    }

    /// Last path segment.
    pub fn basename(&self) -> &str {
        basename(&self.location.path)
    }

    pub fn read_only(&self) -> bool {
        self.location.read_only
    }

    pub fn metadata(&self) -> &ArrayMetadata {
        &self.meta
    }

    pub fn shape(&self) -> &[u64] {
        &self.meta.shape
    }

    pub fn chunks(&self) -> &[u64] {
        &self.meta.chunks
    }

    pub fn dtype(&self) -> DType {
        self.meta.dtype
    }

    pub fn fill_value(&self) -> &Value {
        &self.meta.fill_value
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    /// Number of elements.
    pub fn size(&self) -> u64 {
        element_count(&self.meta.shape)
    }

    /// Number of chunks in the chunk grid.
    pub fn nchunks(&self) -> u64 {
        self.grid().iter().product()
    }

    /// Read the whole array. Chunks that were never written read as the
    /// fill value.
    pub fn read_all(&self) -> ArrayResult<ArrayData> {
        let item = self.meta.dtype.item_size();
        let fill = encode_fill_value(self.meta.dtype, &self.meta.fill_value)?;
        let mut out = ArrayData::filled(self.meta.dtype, self.meta.shape.clone(), &fill);
        let chunk_len = element_count(&self.meta.chunks) as usize * item;

        for_each_index(&self.grid(), |grid_idx| -> ArrayResult<()> {
            let key = self.chunk_key(grid_idx);
            let chunk = match self.chunk_store().get(&key) {
                Ok(bytes) => bytes,
                Err(StoreError::KeyNotFound(_)) => return Ok(()),
                Err(e) => return Err(e.into()),
            };
            if chunk.len() != chunk_len {
                return Err(ArrayError::InvalidData(format!(
                    "chunk {key:?} holds {} bytes, expected {chunk_len}",
                    chunk.len()
                )));
            }
            let buf = out.bytes_mut();
            chunk_runs(&self.meta.shape, &self.meta.chunks, grid_idx, item, |at, from, len| {
                buf[at..at + len].copy_from_slice(&chunk[from..from + len]);
            });
            Ok(())
        })?;
        Ok(out)
    }

    /// Replace the whole array contents with `data`.
    pub fn write_all(&self, data: &ArrayData) -> ArrayResult<()> {
        if self.location.read_only {
            return Err(ArrayError::ReadOnly(self.location.path.clone()));
        }
        if data.shape() != self.meta.shape.as_slice() {
            return Err(ArrayError::ShapeMismatch {
                expected: self.meta.shape.clone(),
                actual: data.shape().to_vec(),
            });
        }
        if data.dtype() != self.meta.dtype {
            return Err(ArrayError::DTypeMismatch {
                expected: self.meta.dtype,
                actual: data.dtype(),
            });
        }

        match self.synchronizer() {
            Some(sync) => {
                let lock_name = join(&self.location.path, ARRAY_META_KEY);
                with_lock(sync.as_ref(), &lock_name, || self.write_chunks(data))?
            }
            None => self.write_chunks(data)?,
        }
        debug!(path = %self.location.path, chunks = self.nchunks(), "array data written");
        Ok(())
    }

    fn write_chunks(&self, data: &ArrayData) -> ArrayResult<()> {
        let item = self.meta.dtype.item_size();
        let fill = encode_fill_value(self.meta.dtype, &self.meta.fill_value)?;
        let chunk_elems = element_count(&self.meta.chunks) as usize;

        for_each_index(&self.grid(), |grid_idx| -> ArrayResult<()> {
            let mut chunk = fill.repeat(chunk_elems);
            chunk_runs(&self.meta.shape, &self.meta.chunks, grid_idx, item, |at, to, len| {
                chunk[to..to + len].copy_from_slice(&data.bytes()[at..at + len]);
            });
            self.chunk_store().set(&self.chunk_key(grid_idx), &chunk)?;
            Ok(())
        })
    }

    fn grid(&self) -> Vec<u64> {
        self.meta
            .shape
            .iter()
            .zip(&self.meta.chunks)
            .map(|(&len, &chunk)| if chunk == 0 { 0 } else { len.div_ceil(chunk) })
            .collect()
    }

    fn chunk_key(&self, grid_idx: &[u64]) -> String {
        let name = if grid_idx.is_empty() {
            "0".to_string()
        } else {
            grid_idx
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(".")
        };
        format!("{}{name}", key_prefix(&self.location.path))
    }
}

impl ArrayLike for Array {
    fn shape(&self) -> &[u64] {
        &self.meta.shape
    }

    fn dtype(&self) -> DType {
        self.meta.dtype
    }

    fn chunks(&self) -> Option<&[u64]> {
        Some(&self.meta.chunks)
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.location.store.location() == other.location.store.location()
            && self.location.read_only == other.location.read_only
            && self.location.path == other.location.path
    }
}

impl std::fmt::Debug for Array {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Array")
            .field("name", &self.name())
            .field("shape", &self.meta.shape)
            .field("dtype", &self.meta.dtype)
            .finish()
    }
}

impl std::fmt::Display for Array {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Array {:?} {:?} {}>", self.name(), self.meta.shape, self.meta.dtype)
    }
}

/// Call `f` with every index of an n-dimensional grid in C order.
///
/// A grid with a zero-length dimension has no indices; a zero-dimensional
/// grid has exactly one (the empty index).
fn for_each_index<E>(
    dims: &[u64],
    mut f: impl FnMut(&[u64]) -> Result<(), E>,
) -> Result<(), E> {
    if dims.contains(&0) {
        return Ok(());
    }
    let mut idx = vec![0u64; dims.len()];
    loop {
        f(&idx)?;
        // Odometer increment, last dimension fastest.
        let mut d = dims.len();
        loop {
            if d == 0 {
                return Ok(());
            }
            d -= 1;
            idx[d] += 1;
            if idx[d] < dims[d] {
                break;
            }
            idx[d] = 0;
        }
    }
}

/// Visit each contiguous run shared by chunk `grid_idx` and the array as
/// `(array byte offset, chunk byte offset, byte length)`.
fn chunk_runs(
    shape: &[u64],
    chunks: &[u64],
    grid_idx: &[u64],
    item: usize,
    mut f: impl FnMut(usize, usize, usize),
) {
    let ndim = shape.len();
    if ndim == 0 {
        f(0, 0, item);
        return;
    }
    let origin: Vec<u64> = grid_idx.iter().zip(chunks).map(|(g, c)| g * c).collect();
    let extent: Vec<u64> = (0..ndim)
        .map(|d| chunks[d].min(shape[d] - origin[d]))
        .collect();
    let last = ndim - 1;
    let run = extent[last] as usize * item;

    let _ = for_each_index(&extent[..last], |local| -> Result<(), ()> {
        let mut array_pos: Vec<u64> = local.iter().zip(&origin).map(|(l, o)| l + o).collect();
        array_pos.push(origin[last]);
        let mut chunk_pos = local.to_vec();
        chunk_pos.push(0);
        f(
            flat_offset(&array_pos, shape) * item,
            flat_offset(&chunk_pos, chunks) * item,
            run,
        );
        Ok(())
    });
}

fn flat_offset(idx: &[u64], dims: &[u64]) -> usize {
    idx.iter()
        .zip(dims)
        .fold(0u64, |acc, (i, d)| acc * d + i) as usize
}
