//! Metadata documents stored under the sentinel keys.
//!
//! A group is marked by a [`GROUP_META_KEY`] document under its prefix and an
//! array by an [`ARRAY_META_KEY`] document. User attributes live under
//! [`ATTRS_KEY`] for either kind of node.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dtype::DType;
use crate::error::{StoreError, StoreResult};

/// Sentinel key marking a path as a group.
pub const GROUP_META_KEY: &str = ".zgroup";

/// Sentinel key marking a path as an array.
pub const ARRAY_META_KEY: &str = ".zarray";

/// Key holding user attributes (a JSON object).
pub const ATTRS_KEY: &str = ".zattrs";

/// Metadata format version written and accepted by this crate.
pub const FORMAT_VERSION: u32 = 2;

/// Contents of a group sentinel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMetadata {
    pub zarr_format: u32,
}

impl Default for GroupMetadata {
    fn default() -> Self {
        Self {
            zarr_format: FORMAT_VERSION,
        }
    }
}

/// Memory layout of elements within a chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    #[default]
    C,
    F,
}

/// Contents of an array sentinel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrayMetadata {
    pub zarr_format: u32,
    pub shape: Vec<u64>,
    pub chunks: Vec<u64>,
    pub dtype: DType,
    /// Always `null`: chunks are stored uncompressed.
    pub compressor: Option<Value>,
    pub fill_value: Value,
    pub order: Order,
    pub filters: Option<Vec<Value>>,
}

impl ArrayMetadata {
    /// Metadata for an uncompressed, C-ordered array.
    pub fn new(shape: Vec<u64>, chunks: Vec<u64>, dtype: DType, fill_value: Value) -> Self {
        Self {
            zarr_format: FORMAT_VERSION,
            shape,
            chunks,
            dtype,
            compressor: None,
            fill_value,
            order: Order::C,
            filters: None,
        }
    }
}

/// Decode a group sentinel document.
pub fn decode_group_metadata(bytes: &[u8]) -> StoreResult<GroupMetadata> {
    let meta: GroupMetadata = serde_json::from_slice(bytes)?;
    check_format(meta.zarr_format)?;
    Ok(meta)
}

/// Encode a group sentinel document.
pub fn encode_group_metadata(meta: &GroupMetadata) -> StoreResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(meta)?)
}

/// Decode an array sentinel document.
pub fn decode_array_metadata(bytes: &[u8]) -> StoreResult<ArrayMetadata> {
    let meta: ArrayMetadata = serde_json::from_slice(bytes)?;
    check_format(meta.zarr_format)?;
    if meta.shape.len() != meta.chunks.len() {
        return Err(StoreError::Metadata(format!(
            "shape has {} dimensions but chunks has {}",
            meta.shape.len(),
            meta.chunks.len()
        )));
    }
    Ok(meta)
}

/// Encode an array sentinel document.
pub fn encode_array_metadata(meta: &ArrayMetadata) -> StoreResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(meta)?)
}

fn check_format(version: u32) -> StoreResult<()> {
    if version != FORMAT_VERSION {
        return Err(StoreError::Metadata(format!(
            "unsupported format version {version}, expected {FORMAT_VERSION}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn group_metadata_document() {
        let bytes = encode_group_metadata(&GroupMetadata::default()).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({ "zarr_format": 2 }));
        assert_eq!(decode_group_metadata(&bytes).unwrap(), GroupMetadata::default());
    }

    #[test]
    fn reject_unknown_format_version() {
        let err = decode_group_metadata(br#"{"zarr_format": 3}"#).unwrap_err();
        assert!(matches!(err, StoreError::Metadata(_)));
    }

    #[test]
    fn reject_malformed_json() {
        assert!(decode_group_metadata(b"not json").is_err());
    }

    #[test]
    fn array_metadata_document() {
        let meta = ArrayMetadata::new(vec![100, 50], vec![10, 50], DType::Float64, json!(0.0));
        let bytes = encode_array_metadata(&meta).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["dtype"], "<f8");
        assert_eq!(value["order"], "C");
        assert!(value["compressor"].is_null());
        assert_eq!(decode_array_metadata(&bytes).unwrap(), meta);
    }

    #[test]
    fn reject_rank_mismatch() {
        let doc = json!({
            "zarr_format": 2,
            "shape": [10, 10],
            "chunks": [10],
            "dtype": "<i4",
            "compressor": null,
            "fill_value": 0,
            "order": "C",
            "filters": null
        });
        let bytes = serde_json::to_vec(&doc).unwrap();
        assert!(decode_array_metadata(&bytes).is_err());
    }
}
