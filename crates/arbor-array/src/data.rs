//! In-memory array buffers and element conversions.

use arbor_store::DType;
use serde_json::Value;

use crate::error::{ArrayError, ArrayResult};

/// A primitive element type with a fixed little-endian encoding.
pub trait Element: Copy + Send + Sync + 'static {
    const DTYPE: DType;

    fn write_le(self, out: &mut Vec<u8>);

    /// Decode from exactly `DTYPE.item_size()` bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:expr),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = $dtype;

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_element! {
    i8 => DType::Int8,
    i16 => DType::Int16,
    i32 => DType::Int32,
    i64 => DType::Int64,
    u8 => DType::UInt8,
    u16 => DType::UInt16,
    u32 => DType::UInt32,
    u64 => DType::UInt64,
    f32 => DType::Float32,
    f64 => DType::Float64,
}

impl Element for bool {
    const DTYPE: DType = DType::Bool;

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

/// Anything with a shape and an element type, used as a template by the
/// `*_like` constructors.
pub trait ArrayLike {
    fn shape(&self) -> &[u64];

    fn dtype(&self) -> DType;

    /// Chunk shape to copy, if the template has one.
    fn chunks(&self) -> Option<&[u64]> {
        None
    }
}

/// Number of elements in an array of the given shape.
pub fn element_count(shape: &[u64]) -> u64 {
    shape.iter().product()
}

/// A dense, C-ordered, little-endian array buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayData {
    dtype: DType,
    shape: Vec<u64>,
    bytes: Vec<u8>,
}

impl ArrayData {
    /// Build a buffer from typed values in C order.
    ///
    /// ```
    /// use arbor_array::ArrayData;
    ///
    /// let data = ArrayData::from_vec(vec![2, 2], vec![1i32, 2, 3, 4]).unwrap();
    /// assert_eq!(data.to_vec::<i32>().unwrap(), vec![1, 2, 3, 4]);
    /// ```
    pub fn from_vec<T: Element>(shape: Vec<u64>, values: Vec<T>) -> ArrayResult<Self> {
        if values.len() as u64 != element_count(&shape) {
            return Err(ArrayError::InvalidData(format!(
                "{} values do not fill shape {shape:?}",
                values.len()
            )));
        }
        let mut bytes = Vec::with_capacity(values.len() * T::DTYPE.item_size());
        for value in values {
            value.write_le(&mut bytes);
        }
        Ok(Self {
            dtype: T::DTYPE,
            shape,
            bytes,
        })
    }

    /// Build a buffer from raw little-endian bytes.
    pub fn from_bytes(dtype: DType, shape: Vec<u64>, bytes: Vec<u8>) -> ArrayResult<Self> {
        let expected = element_count(&shape) as usize * dtype.item_size();
        if bytes.len() != expected {
            return Err(ArrayError::InvalidData(format!(
                "{} bytes for shape {shape:?} of {dtype}, expected {expected}",
                bytes.len()
            )));
        }
        Ok(Self {
            dtype,
            shape,
            bytes,
        })
    }

    /// A buffer with every element set to the encoded `fill` element.
    pub(crate) fn filled(dtype: DType, shape: Vec<u64>, fill: &[u8]) -> Self {
        let count = element_count(&shape) as usize;
        Self {
            dtype,
            shape,
            bytes: fill.repeat(count),
        }
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        element_count(&self.shape) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode every element as `T`.
    pub fn to_vec<T: Element>(&self) -> ArrayResult<Vec<T>> {
        if T::DTYPE != self.dtype {
            return Err(ArrayError::DTypeMismatch {
                expected: self.dtype,
                actual: T::DTYPE,
            });
        }
        Ok(self
            .bytes
            .chunks_exact(self.dtype.item_size())
            .map(T::read_le)
            .collect())
    }
}

impl ArrayLike for ArrayData {
    fn shape(&self) -> &[u64] {
        &self.shape
    }

    fn dtype(&self) -> DType {
        self.dtype
    }
}

/// Encode a JSON fill value as one element of `dtype`.
///
/// `null` encodes as all-zero bytes. Floats additionally accept the strings
/// `"NaN"`, `"Infinity"` and `"-Infinity"`.
pub fn encode_fill_value(dtype: DType, value: &Value) -> ArrayResult<Vec<u8>> {
    let invalid = || ArrayError::InvalidFillValue {
        dtype,
        value: value.to_string(),
    };
    let mut out = Vec::with_capacity(dtype.item_size());

    if value.is_null() {
        out.resize(dtype.item_size(), 0);
        return Ok(out);
    }

    macro_rules! int {
        ($ty:ty) => {{
            let v = if let Some(i) = value.as_i64() {
                <$ty>::try_from(i).map_err(|_| invalid())?
            } else if let Some(u) = value.as_u64() {
                <$ty>::try_from(u).map_err(|_| invalid())?
            } else if let Some(b) = value.as_bool() {
                <$ty>::try_from(u8::from(b)).map_err(|_| invalid())?
            } else {
                return Err(invalid());
            };
            v.write_le(&mut out);
        }};
    }

    match dtype {
        DType::Bool => match value {
            Value::Bool(b) => b.write_le(&mut out),
            Value::Number(n) if n.as_u64() == Some(0) || n.as_u64() == Some(1) => {
                (n.as_u64() == Some(1)).write_le(&mut out)
            }
            _ => return Err(invalid()),
        },
        DType::Int8 => int!(i8),
        DType::Int16 => int!(i16),
        DType::Int32 => int!(i32),
        DType::Int64 => int!(i64),
        DType::UInt8 => int!(u8),
        DType::UInt16 => int!(u16),
        DType::UInt32 => int!(u32),
        DType::UInt64 => int!(u64),
        DType::Float32 => (float_value(value).ok_or_else(invalid)? as f32).write_le(&mut out),
        DType::Float64 => float_value(value).ok_or_else(invalid)?.write_le(&mut out),
    }
    Ok(out)
}

fn float_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        _ => None,
    }
}

/// JSON fill value of zero for `dtype`.
pub fn zero_fill(dtype: DType) -> Value {
    match dtype {
        DType::Bool => Value::Bool(false),
        DType::Float32 | DType::Float64 => Value::from(0.0),
        _ => Value::from(0),
    }
}

/// JSON fill value of one for `dtype`.
pub fn one_fill(dtype: DType) -> Value {
    match dtype {
        DType::Bool => Value::Bool(true),
        DType::Float32 | DType::Float64 => Value::from(1.0),
        _ => Value::from(1),
    }
}
