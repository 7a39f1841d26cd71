//! Array constructors.
//!
//! Every constructor writes the array sentinel through
//! [`arbor_store::init_array`] (which enforces the overwrite and ancestor
//! rules) and returns an open [`Array`] handle.

use arbor_store::{init_array, ArrayMetadata, DType};
use serde_json::Value;

use crate::array::{Array, ArrayLocation};
use crate::data::{encode_fill_value, one_fill, zero_fill, ArrayData, ArrayLike};
use crate::error::{ArrayError, ArrayResult};

/// Options shared by the array constructors.
#[derive(Clone, Debug, Default)]
pub struct ArrayOptions {
    /// Chunk shape. Defaults to a single chunk covering the array.
    pub chunks: Option<Vec<u64>>,
    /// Fill value. Constructors that imply a fill ignore this.
    pub fill_value: Option<Value>,
    /// Replace any existing node at the path.
    pub overwrite: bool,
}

/// Create an array; the fill value defaults to zero.
pub fn create(
    location: &ArrayLocation,
    shape: Vec<u64>,
    dtype: DType,
    options: &ArrayOptions,
) -> ArrayResult<Array> {
    let fill = options.fill_value.clone().unwrap_or_else(|| zero_fill(dtype));
    init(location, shape, dtype, fill, options.chunks.clone(), options.overwrite)
}

/// Create an array with no defined fill value (`null`).
pub fn empty(
    location: &ArrayLocation,
    shape: Vec<u64>,
    dtype: DType,
    options: &ArrayOptions,
) -> ArrayResult<Array> {
    init(location, shape, dtype, Value::Null, options.chunks.clone(), options.overwrite)
}

pub fn zeros(
    location: &ArrayLocation,
    shape: Vec<u64>,
    dtype: DType,
    options: &ArrayOptions,
) -> ArrayResult<Array> {
    init(location, shape, dtype, zero_fill(dtype), options.chunks.clone(), options.overwrite)
}

pub fn ones(
    location: &ArrayLocation,
    shape: Vec<u64>,
    dtype: DType,
    options: &ArrayOptions,
) -> ArrayResult<Array> {
    init(location, shape, dtype, one_fill(dtype), options.chunks.clone(), options.overwrite)
}

pub fn full(
    location: &ArrayLocation,
    shape: Vec<u64>,
    dtype: DType,
    fill_value: Value,
    options: &ArrayOptions,
) -> ArrayResult<Array> {
    init(location, shape, dtype, fill_value, options.chunks.clone(), options.overwrite)
}

/// Create an array shaped like `data` and write `data` into it.
pub fn array_from_data(
    location: &ArrayLocation,
    data: &ArrayData,
    options: &ArrayOptions,
) -> ArrayResult<Array> {
    let array = create(location, data.shape().to_vec(), data.dtype(), options)?;
    array.write_all(data)?;
    Ok(array)
}

pub fn empty_like(
    location: &ArrayLocation,
    template: &dyn ArrayLike,
    options: &ArrayOptions,
) -> ArrayResult<Array> {
    empty(location, template.shape().to_vec(), template.dtype(), &like_options(template, options))
}

pub fn zeros_like(
    location: &ArrayLocation,
    template: &dyn ArrayLike,
    options: &ArrayOptions,
) -> ArrayResult<Array> {
    zeros(location, template.shape().to_vec(), template.dtype(), &like_options(template, options))
}

pub fn ones_like(
    location: &ArrayLocation,
    template: &dyn ArrayLike,
    options: &ArrayOptions,
) -> ArrayResult<Array> {
    ones(location, template.shape().to_vec(), template.dtype(), &like_options(template, options))
}

pub fn full_like(
    location: &ArrayLocation,
    template: &dyn ArrayLike,
    fill_value: Value,
    options: &ArrayOptions,
) -> ArrayResult<Array> {
    full(
        location,
        template.shape().to_vec(),
        template.dtype(),
        fill_value,
        &like_options(template, options),
    )
}

/// Explicit options win; otherwise the template's chunking carries over.
fn like_options(template: &dyn ArrayLike, options: &ArrayOptions) -> ArrayOptions {
    ArrayOptions {
        chunks: options
            .chunks
            .clone()
            .or_else(|| template.chunks().map(<[u64]>::to_vec)),
        ..options.clone()
    }
}

/// Chunk shape to use for `shape`: one chunk spanning the array, with
/// zero-length dimensions given chunk length 1.
pub fn default_chunks(shape: &[u64]) -> Vec<u64> {
    shape.iter().map(|&len| len.max(1)).collect()
}

fn init(
    location: &ArrayLocation,
    shape: Vec<u64>,
    dtype: DType,
    fill_value: Value,
    chunks: Option<Vec<u64>>,
    overwrite: bool,
) -> ArrayResult<Array> {
    if location.read_only {
        return Err(ArrayError::ReadOnly(location.path.clone()));
    }
    let chunks = chunks.unwrap_or_else(|| default_chunks(&shape));
    if chunks.len() != shape.len() || chunks.contains(&0) {
        return Err(ArrayError::InvalidData(format!(
            "chunk shape {chunks:?} does not fit array shape {shape:?}"
        )));
    }
    // Reject fill values the element type cannot hold before touching the store.
    encode_fill_value(dtype, &fill_value)?;

    let meta = ArrayMetadata::new(shape, chunks, dtype, fill_value);
    init_array(
        location.store.as_ref(),
        &location.path,
        location.chunk_store.as_deref(),
        &meta,
        overwrite,
    )?;
    Array::open(location.clone())
}
