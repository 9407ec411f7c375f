pub mod dtype;

use serde::{Deserialize, Serialize};

use crate::error::{RemoteError, RemoteResult};
use crate::types::DataType;

pub use dtype::{ElementType, parse_dtype};

// ---------------------------------------------------------------------------
// ArrayInfo
// ---------------------------------------------------------------------------

/// Metadata of a remote array, as returned by the `api/info` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayInfo {
    pub shape: Vec<usize>,
    pub chunks: Vec<usize>,
    pub blocks: Vec<usize>,
    pub dtype: String,
    pub ext_shape: Vec<usize>,

    /// Every other field the server reported.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Wire form with every field optional, so that absent fields can be
/// reported by name instead of as a generic serde error.
#[derive(Debug, Deserialize)]
struct RawArrayInfo {
    #[serde(default)]
    shape: Option<Vec<usize>>,
    #[serde(default)]
    chunks: Option<Vec<usize>>,
    #[serde(default)]
    blocks: Option<Vec<usize>>,
    #[serde(default)]
    dtype: Option<String>,
    #[serde(default)]
    ext_shape: Option<Vec<usize>>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

fn required<T>(field: Option<T>, name: &str) -> RemoteResult<T> {
    field.ok_or_else(|| RemoteError::MalformedMetadata(format!("Missing '{name}' field")))
}

impl ArrayInfo {
    /// Parse from raw JSON bytes, checking that every required field is
    /// present and that all the shapes agree in length.
    pub fn parse(json_bytes: &[u8]) -> RemoteResult<Self> {
        let raw: serde_json::Value = serde_json::from_slice(json_bytes)
            .map_err(|e| RemoteError::MalformedMetadata(format!("Invalid JSON: {e}")))?;
        if !raw.is_object() {
            return Err(RemoteError::MalformedMetadata(
                "Expected JSON object".into(),
            ));
        }

        let raw: RawArrayInfo = serde_json::from_value(raw)
            .map_err(|e| RemoteError::MalformedMetadata(format!("Metadata parse error: {e}")))?;

        let shape = required(raw.shape, "shape")?;
        let chunks = required(raw.chunks, "chunks")?;
        let blocks = required(raw.blocks, "blocks")?;
        let dtype = required(raw.dtype, "dtype")?;
        let ext_shape = raw.ext_shape.unwrap_or_else(|| shape.clone());

        let info = ArrayInfo {
            shape,
            chunks,
            blocks,
            dtype,
            ext_shape,
            extra: raw.extra,
        };
        info.check()?;
        Ok(info)
    }

    fn check(&self) -> RemoteResult<()> {
        let ndim = self.shape.len();
        for (name, dims) in [
            ("chunks", &self.chunks),
            ("blocks", &self.blocks),
            ("ext_shape", &self.ext_shape),
        ] {
            if dims.len() != ndim {
                return Err(RemoteError::MalformedMetadata(format!(
                    "'{name}' has {} dimensions, 'shape' has {ndim}",
                    dims.len()
                )));
            }
        }
        if self.chunks.contains(&0) || self.blocks.contains(&0) {
            return Err(RemoteError::MalformedMetadata(
                "Chunk and block sizes must be positive".into(),
            ));
        }
        if let Some(axis) = self
            .ext_shape
            .iter()
            .zip(&self.shape)
            .position(|(ext, dim)| ext < dim)
        {
            return Err(RemoteError::MalformedMetadata(format!(
                "'ext_shape' is smaller than 'shape' on axis {axis}"
            )));
        }
        Ok(())
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// The element type the server advertises. The bytes returned by a fetch
    /// describe themselves, so this is informational only.
    pub fn element_type(&self) -> RemoteResult<ElementType> {
        parse_dtype(&self.dtype).map_err(RemoteError::MalformedMetadata)
    }

    pub fn data_type(&self) -> RemoteResult<DataType> {
        self.element_type().map(|et| et.data_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn parses_info_and_keeps_extra_fields() {
        let info = ArrayInfo::parse(&body(json!({
            "shape": [100],
            "chunks": [25],
            "blocks": [5],
            "dtype": "int64",
            "ext_shape": [100],
            "cratio": 3.5,
        })))
        .unwrap();
        assert_eq!(info.shape, vec![100]);
        assert_eq!(info.chunks, vec![25]);
        assert_eq!(info.blocks, vec![5]);
        assert_eq!(info.ext_shape, vec![100]);
        assert_eq!(info.data_type().unwrap(), DataType::Int64);
        assert_eq!(info.extra.get("cratio"), Some(&json!(3.5)));
    }

    #[test]
    fn ext_shape_defaults_to_shape() {
        let info = ArrayInfo::parse(&body(json!({
            "shape": [10, 20],
            "chunks": [5, 5],
            "blocks": [1, 1],
            "dtype": "<f8",
        })))
        .unwrap();
        assert_eq!(info.ext_shape, vec![10, 20]);
    }

    #[test]
    fn missing_fields_are_malformed() {
        for missing in ["shape", "chunks", "blocks", "dtype"] {
            let mut value = json!({
                "shape": [10],
                "chunks": [5],
                "blocks": [1],
                "dtype": "<i4",
            });
            value.as_object_mut().unwrap().remove(missing);
            let err = ArrayInfo::parse(&body(value)).unwrap_err();
            match err {
                RemoteError::MalformedMetadata(msg) => assert!(msg.contains(missing)),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn inconsistent_shapes_are_malformed() {
        let err = ArrayInfo::parse(&body(json!({
            "shape": [10, 10],
            "chunks": [5],
            "blocks": [1, 1],
            "dtype": "<i4",
        })))
        .unwrap_err();
        assert!(matches!(err, RemoteError::MalformedMetadata(_)));

        let err = ArrayInfo::parse(&body(json!({
            "shape": [10],
            "chunks": [5],
            "blocks": [1],
            "dtype": "<i4",
            "ext_shape": [8],
        })))
        .unwrap_err();
        assert!(matches!(err, RemoteError::MalformedMetadata(_)));
    }

    #[test]
    fn non_object_body_is_malformed() {
        assert!(matches!(
            ArrayInfo::parse(b"[1, 2, 3]").unwrap_err(),
            RemoteError::MalformedMetadata(_)
        ));
        assert!(matches!(
            ArrayInfo::parse(b"not json").unwrap_err(),
            RemoteError::MalformedMetadata(_)
        ));
    }

    #[test]
    fn serializes_back_to_wire_form() {
        let info = ArrayInfo::parse(&body(json!({
            "shape": [4],
            "chunks": [2],
            "blocks": [1],
            "dtype": "<i8",
            "ext_shape": [4],
        })))
        .unwrap();
        let round = ArrayInfo::parse(&serde_json::to_vec(&info).unwrap()).unwrap();
        assert_eq!(round, info);
    }
}
