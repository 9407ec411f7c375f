use ndarray::{ArrayView, IxDyn, SliceInfoElem};

use crate::engine::{DecodedArray, FlatBuffer, checked_byte_len, checked_num_elements};
use crate::error::{RemoteError, RemoteResult};
use crate::index::{AxisTerm, IndexExpression, check_steps};
use crate::types::{DataType, Endian, VectorValue, bytes_to_vector};

// ---------------------------------------------------------------------------
// ArrayRegion
// ---------------------------------------------------------------------------

/// A materialised piece of a remote array: C-ordered element bytes plus the
/// shape and element description that came with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayRegion {
    shape: Vec<usize>,
    item_size: usize,
    data_type: Option<DataType>,
    endian: Endian,
    bytes: Vec<u8>,
}

impl ArrayRegion {
    /// A flat region from a slice frame. The frame only records the item
    /// size, so the element type is left unknown and the bytes are taken as
    /// little-endian; use [`with_endian`](Self::with_endian) when the array
    /// metadata says otherwise.
    pub fn from_frame(buf: FlatBuffer) -> Self {
        let len = buf.len();
        Self {
            shape: vec![len],
            item_size: buf.item_size,
            data_type: None,
            endian: Endian::Little,
            bytes: buf.bytes,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn item_size(&self) -> usize {
        self.item_size
    }

    pub fn data_type(&self) -> Option<DataType> {
        self.data_type
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Reinterpret the region with a new shape holding the same number of
    /// elements. Useful for flat slice-frame regions whose shape the caller
    /// knows.
    pub fn with_shape(self, shape: Vec<usize>) -> RemoteResult<Self> {
        if checked_num_elements(&shape) != Some(self.len()) {
            return Err(RemoteError::Other(format!(
                "Cannot view {} elements as shape {shape:?}",
                self.len()
            )));
        }
        Ok(Self { shape, ..self })
    }

    /// Reinterpret the bytes with another byte order.
    pub fn with_endian(self, endian: Endian) -> Self {
        Self { endian, ..self }
    }

    /// Typed values using the element type carried by the payload.
    pub fn values(&self) -> RemoteResult<VectorValue> {
        let dtype = self.data_type.ok_or_else(|| {
            RemoteError::TypeConversion(
                "Region carries no element type; use values_as with an explicit type".into(),
            )
        })?;
        bytes_to_vector(self.endian, dtype, &self.bytes)
    }

    /// Typed values using a caller-supplied element type, which must match
    /// the payload's item size.
    pub fn values_as(&self, dtype: DataType) -> RemoteResult<VectorValue> {
        if dtype.byte_size() != Some(self.item_size) {
            return Err(RemoteError::TypeConversion(format!(
                "{dtype:?} does not match the payload item size of {} bytes",
                self.item_size
            )));
        }
        if let Some(own) = self.data_type {
            if own != dtype {
                return Err(RemoteError::TypeConversion(format!(
                    "Region holds {own:?}, not {dtype:?}"
                )));
            }
        }
        bytes_to_vector(self.endian, dtype, &self.bytes)
    }

    pub fn to_f64_vec(&self) -> RemoteResult<Vec<f64>> {
        self.values().map(|v| v.to_f64_vec())
    }

    /// Apply `expr` to a decoded container. One-dimensional containers are
    /// cut as a contiguous byte range; anything else goes through a general
    /// N-dimensional slice.
    pub fn extract(array: &DecodedArray, expr: &IndexExpression) -> RemoteResult<Self> {
        let item_size = array.element.data_type.byte_size().ok_or_else(|| {
            RemoteError::TypeConversion(format!(
                "{:?} elements have no fixed size",
                array.element.data_type
            ))
        })?;
        let expected = checked_byte_len(&array.shape, item_size).ok_or_else(|| {
            RemoteError::Decode(format!("Container of shape {:?} is too large", array.shape))
        })?;
        if array.bytes.len() != expected {
            return Err(RemoteError::Decode(format!(
                "Container of shape {:?} holds {} bytes",
                array.shape,
                array.bytes.len()
            )));
        }

        let selection = resolve_selection(&expr.terms(), &array.shape)?;
        let (shape, bytes) = if array.ndim() == 1 {
            extract_flat(array, &selection[0], item_size)
        } else {
            extract_nd(array, &selection, item_size)?
        };

        Ok(Self {
            shape,
            item_size,
            data_type: Some(array.element.data_type),
            endian: array.element.byte_order,
            bytes,
        })
    }
}

// ---------------------------------------------------------------------------
// Selection resolution
// ---------------------------------------------------------------------------

/// A term bound to a concrete axis length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisSelection {
    Index(usize),
    Range { start: usize, stop: usize },
}

impl AxisSelection {
    fn to_slice_elem(self) -> SliceInfoElem {
        match self {
            AxisSelection::Index(i) => SliceInfoElem::Index(i as isize),
            AxisSelection::Range { start, stop } => SliceInfoElem::Slice {
                start: start as isize,
                end: Some(stop as isize),
                step: 1,
            },
        }
    }
}

/// Bind `terms` to `shape`. Ranges clamp to the axis; indices must land
/// inside it. Axes past the last term are selected in full.
fn resolve_selection(terms: &[AxisTerm], shape: &[usize]) -> RemoteResult<Vec<AxisSelection>> {
    check_steps(terms)?;
    if terms.len() > shape.len() {
        return Err(RemoteError::Decode(format!(
            "{} terms given for a container with {} dimensions",
            terms.len(),
            shape.len()
        )));
    }

    let mut selection = Vec::with_capacity(shape.len());
    for (axis, &dim) in shape.iter().enumerate() {
        let sel = match terms.get(axis) {
            Some(AxisTerm::Index(i)) => {
                let index = if *i < 0 { *i + dim as i64 } else { *i };
                if index < 0 || index >= dim as i64 {
                    return Err(RemoteError::Decode(format!(
                        "Index {i} is out of bounds for axis {axis} with size {dim}"
                    )));
                }
                AxisSelection::Index(index as usize)
            }
            Some(AxisTerm::Range(r)) => {
                let start = r.start.map_or(0, |s| clamp_bound(s, dim));
                let stop = r.stop.map_or(dim, |s| clamp_bound(s, dim));
                AxisSelection::Range {
                    start,
                    stop: stop.max(start),
                }
            }
            None => AxisSelection::Range {
                start: 0,
                stop: dim,
            },
        };
        selection.push(sel);
    }
    Ok(selection)
}

fn clamp_bound(bound: i64, dim: usize) -> usize {
    let dim = dim as i64;
    let b = if bound < 0 { bound + dim } else { bound };
    b.clamp(0, dim) as usize
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

fn extract_flat(array: &DecodedArray, sel: &AxisSelection, item_size: usize) -> (Vec<usize>, Vec<u8>) {
    match *sel {
        AxisSelection::Index(i) => {
            let start = i * item_size;
            (Vec::new(), array.bytes[start..start + item_size].to_vec())
        }
        AxisSelection::Range { start, stop } => (
            vec![stop - start],
            array.bytes[start * item_size..stop * item_size].to_vec(),
        ),
    }
}

/// View the body as `shape + [item_size]` bytes so that any element type is
/// sliced the same way, then keep the trailing item axis whole.
fn extract_nd(
    array: &DecodedArray,
    selection: &[AxisSelection],
    item_size: usize,
) -> RemoteResult<(Vec<usize>, Vec<u8>)> {
    let mut byte_shape = array.shape.clone();
    byte_shape.push(item_size);
    let view = ArrayView::from_shape(IxDyn(&byte_shape), &array.bytes)
        .map_err(|e| RemoteError::Decode(format!("Container body does not fit its shape: {e}")))?;

    let mut info: Vec<SliceInfoElem> = selection.iter().map(|s| s.to_slice_elem()).collect();
    info.push(SliceInfoElem::Slice {
        start: 0,
        end: None,
        step: 1,
    });

    let sub = view.slice(info.as_slice());
    let shape = sub.shape()[..sub.ndim() - 1].to_vec();
    let bytes = sub.iter().copied().collect();
    Ok((shape, bytes))
}
