//! Array element types and safe-cast rules.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Broad category of an element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DTypeKind {
    Bool,
    Signed,
    Unsigned,
    Float,
}

/// Element type of an array.
///
/// Serialized as a little-endian type string (`"<f8"`, `"|u1"`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl DType {
    /// Every supported element type.
    pub const ALL: [DType; 11] = [
        DType::Bool,
        DType::Int8,
        DType::Int16,
        DType::Int32,
        DType::Int64,
        DType::UInt8,
        DType::UInt16,
        DType::UInt32,
        DType::UInt64,
        DType::Float32,
        DType::Float64,
    ];

    /// Size of one element in bytes.
    pub fn item_size(self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    pub fn kind(self) -> DTypeKind {
        match self {
            Self::Bool => DTypeKind::Bool,
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 => DTypeKind::Signed,
            Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64 => DTypeKind::Unsigned,
            Self::Float32 | Self::Float64 => DTypeKind::Float,
        }
    }

    /// Type string as stored in array metadata.
    pub fn type_str(self) -> &'static str {
        match self {
            Self::Bool => "|b1",
            Self::Int8 => "|i1",
            Self::Int16 => "<i2",
            Self::Int32 => "<i4",
            Self::Int64 => "<i8",
            Self::UInt8 => "|u1",
            Self::UInt16 => "<u2",
            Self::UInt32 => "<u4",
            Self::UInt64 => "<u8",
            Self::Float32 => "<f4",
            Self::Float64 => "<f8",
        }
    }

    /// Human-readable name (`"float64"`, `"uint8"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    /// Whether every value of `self` is representable in `target`.
    ///
    /// Follows the usual safe-casting table: booleans cast to anything,
    /// integers widen within their kind, unsigned integers widen into
    /// strictly larger signed integers, small integers fit `float32`, all
    /// integers fit `float64`, and `float32` widens to `float64`.
    ///
    /// ```
    /// use arbor_store::DType;
    ///
    /// assert!(DType::Int16.can_cast_to(DType::Float32));
    /// assert!(!DType::Float64.can_cast_to(DType::Int64));
    /// assert!(!DType::Int8.can_cast_to(DType::UInt64));
    /// ```
    pub fn can_cast_to(self, target: DType) -> bool {
        use DTypeKind::*;

        if self == target {
            return true;
        }
        let (from_size, to_size) = (self.item_size(), target.item_size());
        match (self.kind(), target.kind()) {
            (Bool, _) => true,
            (_, Bool) => false,
            (Unsigned, Unsigned) | (Signed, Signed) | (Float, Float) => to_size >= from_size,
            (Unsigned, Signed) => to_size > from_size,
            (Signed, Unsigned) => false,
            (Unsigned | Signed, Float) => match target {
                DType::Float32 => from_size <= 2,
                _ => true,
            },
            (Float, Unsigned | Signed) => false,
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for DType {
    type Err = StoreError;

    /// Accepts type strings (`"<f8"`), short codes (`"f8"`) and names
    /// (`"float64"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim_start_matches(['<', '|', '=']);
        DType::ALL
            .into_iter()
            .find(|dtype| {
                dtype.name() == s
                    || dtype.type_str() == s
                    || dtype.type_str().trim_start_matches(['<', '|']) == code
            })
            .ok_or_else(|| StoreError::Metadata(format!("unsupported dtype: {s:?}")))
    }
}

impl TryFrom<String> for DType {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DType> for String {
    fn from(dtype: DType) -> Self {
        dtype.type_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_type_strings_and_names() {
        assert_eq!("<f8".parse::<DType>().unwrap(), DType::Float64);
        assert_eq!("f8".parse::<DType>().unwrap(), DType::Float64);
        assert_eq!("float64".parse::<DType>().unwrap(), DType::Float64);
        assert_eq!("|u1".parse::<DType>().unwrap(), DType::UInt8);
        assert_eq!("b1".parse::<DType>().unwrap(), DType::Bool);
        assert!("complex128".parse::<DType>().is_err());
    }

    #[test]
    fn serde_uses_type_string() {
        let json = serde_json::to_string(&DType::Int32).unwrap();
        assert_eq!(json, "\"<i4\"");
        let back: DType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DType::Int32);
    }

    #[test]
    fn identical_types_cast() {
        for dtype in DType::ALL {
            assert!(dtype.can_cast_to(dtype), "{dtype} -> {dtype}");
        }
    }

    #[test]
    fn bool_casts_to_everything() {
        for dtype in DType::ALL {
            assert!(DType::Bool.can_cast_to(dtype));
        }
    }

    #[test]
    fn nothing_else_casts_to_bool() {
        for dtype in DType::ALL.into_iter().filter(|d| *d != DType::Bool) {
            assert!(!dtype.can_cast_to(DType::Bool));
        }
    }

    #[test]
    fn integer_widening() {
        assert!(DType::Int8.can_cast_to(DType::Int64));
        assert!(!DType::Int64.can_cast_to(DType::Int32));
        assert!(DType::UInt8.can_cast_to(DType::UInt16));
        assert!(DType::UInt8.can_cast_to(DType::Int16));
        assert!(!DType::UInt16.can_cast_to(DType::Int16));
        assert!(!DType::Int8.can_cast_to(DType::UInt8));
    }

    #[test]
    fn integer_to_float() {
        assert!(DType::Int16.can_cast_to(DType::Float32));
        assert!(!DType::Int32.can_cast_to(DType::Float32));
        assert!(DType::Int64.can_cast_to(DType::Float64));
        assert!(DType::UInt64.can_cast_to(DType::Float64));
    }

    #[test]
    fn float_rules() {
        assert!(DType::Float32.can_cast_to(DType::Float64));
        assert!(!DType::Float64.can_cast_to(DType::Float32));
        assert!(!DType::Float32.can_cast_to(DType::Int64));
    }

    #[test]
    fn item_sizes() {
        assert_eq!(DType::Bool.item_size(), 1);
        assert_eq!(DType::UInt16.item_size(), 2);
        assert_eq!(DType::Float32.item_size(), 4);
        assert_eq!(DType::Int64.item_size(), 8);
    }
}
