use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use half::f16;
use num_complex::Complex;
use std::io::Cursor;

use crate::error::{RemoteError, RemoteResult};

// ---------------------------------------------------------------------------
// Endian
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
    NotApplicable,
}

impl Endian {
    /// NumPy byte-order character.
    pub fn numpy_char(&self) -> char {
        match self {
            Endian::Little => '<',
            Endian::Big => '>',
            Endian::NotApplicable => '|',
        }
    }
}

// ---------------------------------------------------------------------------
// DataType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    Bytes,
}

impl DataType {
    /// Number of bytes per element for fixed-size types.
    pub fn byte_size(&self) -> Option<usize> {
        match self {
            DataType::Bool => Some(1),
            DataType::Int8 => Some(1),
            DataType::Int16 => Some(2),
            DataType::Int32 => Some(4),
            DataType::Int64 => Some(8),
            DataType::UInt8 => Some(1),
            DataType::UInt16 => Some(2),
            DataType::UInt32 => Some(4),
            DataType::UInt64 => Some(8),
            DataType::Float16 => Some(2),
            DataType::Float32 => Some(4),
            DataType::Float64 => Some(8),
            DataType::Complex64 => Some(8),
            DataType::Complex128 => Some(16),
            DataType::String | DataType::Bytes => None,
        }
    }

    /// Look up a NumPy type name such as `"int64"` or `"float32"`.
    pub fn from_numpy_name(name: &str) -> Option<DataType> {
        match name {
            "bool" => Some(DataType::Bool),
            "int8" => Some(DataType::Int8),
            "int16" => Some(DataType::Int16),
            "int32" => Some(DataType::Int32),
            "int64" => Some(DataType::Int64),
            "uint8" => Some(DataType::UInt8),
            "uint16" => Some(DataType::UInt16),
            "uint32" => Some(DataType::UInt32),
            "uint64" => Some(DataType::UInt64),
            "float16" => Some(DataType::Float16),
            "float32" => Some(DataType::Float32),
            "float64" => Some(DataType::Float64),
            "complex64" => Some(DataType::Complex64),
            "complex128" => Some(DataType::Complex128),
            _ => None,
        }
    }

    /// NumPy type code and byte size, e.g. `('i', 8)` for `Int64`.
    pub(crate) fn numpy_code(&self) -> (char, usize) {
        match self {
            DataType::Bool => ('b', 1),
            DataType::Int8 => ('i', 1),
            DataType::Int16 => ('i', 2),
            DataType::Int32 => ('i', 4),
            DataType::Int64 => ('i', 8),
            DataType::UInt8 => ('u', 1),
            DataType::UInt16 => ('u', 2),
            DataType::UInt32 => ('u', 4),
            DataType::UInt64 => ('u', 8),
            DataType::Float16 => ('f', 2),
            DataType::Float32 => ('f', 4),
            DataType::Float64 => ('f', 8),
            DataType::Complex64 => ('c', 8),
            DataType::Complex128 => ('c', 16),
            DataType::String => ('S', 1),
            DataType::Bytes => ('V', 1),
        }
    }
}

// ---------------------------------------------------------------------------
// VectorValue  (typed region data)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum VectorValue {
    VBool(Vec<bool>),
    VInt8(Vec<i8>),
    VInt16(Vec<i16>),
    VInt32(Vec<i32>),
    VInt64(Vec<i64>),
    VUInt8(Vec<u8>),
    VUInt16(Vec<u16>),
    VUInt32(Vec<u32>),
    VUInt64(Vec<u64>),
    VFloat16(Vec<f16>),
    VFloat32(Vec<f32>),
    VFloat64(Vec<f64>),
    VComplex64(Vec<Complex<f32>>),
    VComplex128(Vec<Complex<f64>>),
}

impl VectorValue {
    /// Number of elements in the vector.
    pub fn len(&self) -> usize {
        match self {
            VectorValue::VBool(v) => v.len(),
            VectorValue::VInt8(v) => v.len(),
            VectorValue::VInt16(v) => v.len(),
            VectorValue::VInt32(v) => v.len(),
            VectorValue::VInt64(v) => v.len(),
            VectorValue::VUInt8(v) => v.len(),
            VectorValue::VUInt16(v) => v.len(),
            VectorValue::VUInt32(v) => v.len(),
            VectorValue::VUInt64(v) => v.len(),
            VectorValue::VFloat16(v) => v.len(),
            VectorValue::VFloat32(v) => v.len(),
            VectorValue::VFloat64(v) => v.len(),
            VectorValue::VComplex64(v) => v.len(),
            VectorValue::VComplex128(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            VectorValue::VBool(_) => DataType::Bool,
            VectorValue::VInt8(_) => DataType::Int8,
            VectorValue::VInt16(_) => DataType::Int16,
            VectorValue::VInt32(_) => DataType::Int32,
            VectorValue::VInt64(_) => DataType::Int64,
            VectorValue::VUInt8(_) => DataType::UInt8,
            VectorValue::VUInt16(_) => DataType::UInt16,
            VectorValue::VUInt32(_) => DataType::UInt32,
            VectorValue::VUInt64(_) => DataType::UInt64,
            VectorValue::VFloat16(_) => DataType::Float16,
            VectorValue::VFloat32(_) => DataType::Float32,
            VectorValue::VFloat64(_) => DataType::Float64,
            VectorValue::VComplex64(_) => DataType::Complex64,
            VectorValue::VComplex128(_) => DataType::Complex128,
        }
    }

    /// Lossily convert the entire vector to `Vec<f64>`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            VectorValue::VBool(v) => v.iter().map(|b| if *b { 1.0 } else { 0.0 }).collect(),
            VectorValue::VInt8(v) => v.iter().map(|x| *x as f64).collect(),
            VectorValue::VInt16(v) => v.iter().map(|x| *x as f64).collect(),
            VectorValue::VInt32(v) => v.iter().map(|x| *x as f64).collect(),
            VectorValue::VInt64(v) => v.iter().map(|x| *x as f64).collect(),
            VectorValue::VUInt8(v) => v.iter().map(|x| *x as f64).collect(),
            VectorValue::VUInt16(v) => v.iter().map(|x| *x as f64).collect(),
            VectorValue::VUInt32(v) => v.iter().map(|x| *x as f64).collect(),
            VectorValue::VUInt64(v) => v.iter().map(|x| *x as f64).collect(),
            VectorValue::VFloat16(v) => v.iter().map(|x| x.to_f64()).collect(),
            VectorValue::VFloat32(v) => v.iter().map(|x| *x as f64).collect(),
            VectorValue::VFloat64(v) => v.clone(),
            VectorValue::VComplex64(v) => v.iter().map(|c| c.re as f64).collect(),
            VectorValue::VComplex128(v) => v.iter().map(|c| c.re).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw bytes -> typed vector
// ---------------------------------------------------------------------------

/// Interpret raw bytes as a typed vector according to `endian` and `dtype`.
pub fn bytes_to_vector(endian: Endian, dtype: DataType, data: &[u8]) -> RemoteResult<VectorValue> {
    let elem_size = dtype.byte_size().ok_or_else(|| {
        RemoteError::TypeConversion(format!("{dtype:?} has no fixed element size"))
    })?;
    if data.len() % elem_size != 0 {
        return Err(RemoteError::Decode(format!(
            "{} bytes is not a whole number of {dtype:?} elements",
            data.len()
        )));
    }

    match dtype {
        DataType::Bool => Ok(VectorValue::VBool(data.iter().map(|b| *b != 0).collect())),
        DataType::Int8 => Ok(VectorValue::VInt8(data.iter().map(|b| *b as i8).collect())),
        DataType::UInt8 => Ok(VectorValue::VUInt8(data.to_vec())),

        DataType::Int16 => read_vec_typed(
            endian,
            data,
            |c| c.read_i16::<LittleEndian>(),
            |c| c.read_i16::<BigEndian>(),
            VectorValue::VInt16,
        ),
        DataType::Int32 => read_vec_typed(
            endian,
            data,
            |c| c.read_i32::<LittleEndian>(),
            |c| c.read_i32::<BigEndian>(),
            VectorValue::VInt32,
        ),
        DataType::Int64 => read_vec_typed(
            endian,
            data,
            |c| c.read_i64::<LittleEndian>(),
            |c| c.read_i64::<BigEndian>(),
            VectorValue::VInt64,
        ),
        DataType::UInt16 => read_vec_typed(
            endian,
            data,
            |c| c.read_u16::<LittleEndian>(),
            |c| c.read_u16::<BigEndian>(),
            VectorValue::VUInt16,
        ),
        DataType::UInt32 => read_vec_typed(
            endian,
            data,
            |c| c.read_u32::<LittleEndian>(),
            |c| c.read_u32::<BigEndian>(),
            VectorValue::VUInt32,
        ),
        DataType::UInt64 => read_vec_typed(
            endian,
            data,
            |c| c.read_u64::<LittleEndian>(),
            |c| c.read_u64::<BigEndian>(),
            VectorValue::VUInt64,
        ),

        DataType::Float16 => {
            let bits = read_vec_raw(
                endian,
                data,
                |c| c.read_u16::<LittleEndian>(),
                |c| c.read_u16::<BigEndian>(),
            )?;
            Ok(VectorValue::VFloat16(
                bits.into_iter().map(f16::from_bits).collect(),
            ))
        }
        DataType::Float32 => read_vec_typed(
            endian,
            data,
            |c| c.read_f32::<LittleEndian>(),
            |c| c.read_f32::<BigEndian>(),
            VectorValue::VFloat32,
        ),
        DataType::Float64 => read_vec_typed(
            endian,
            data,
            |c| c.read_f64::<LittleEndian>(),
            |c| c.read_f64::<BigEndian>(),
            VectorValue::VFloat64,
        ),

        // Complex values are stored as interleaved (re, im) pairs.
        DataType::Complex64 => {
            let parts = read_vec_raw(
                endian,
                data,
                |c| c.read_f32::<LittleEndian>(),
                |c| c.read_f32::<BigEndian>(),
            )?;
            Ok(VectorValue::VComplex64(
                parts.chunks_exact(2).map(|p| Complex::new(p[0], p[1])).collect(),
            ))
        }
        DataType::Complex128 => {
            let parts = read_vec_raw(
                endian,
                data,
                |c| c.read_f64::<LittleEndian>(),
                |c| c.read_f64::<BigEndian>(),
            )?;
            Ok(VectorValue::VComplex128(
                parts.chunks_exact(2).map(|p| Complex::new(p[0], p[1])).collect(),
            ))
        }
        DataType::String | DataType::Bytes => unreachable!("rejected by byte_size above"),
    }
}

/// Helper: read a vector of a fixed-size numeric type.
fn read_vec_typed<T, F1, F2>(
    endian: Endian,
    data: &[u8],
    read_le: F1,
    read_be: F2,
    wrap: fn(Vec<T>) -> VectorValue,
) -> RemoteResult<VectorValue>
where
    F1: Fn(&mut Cursor<&[u8]>) -> std::io::Result<T>,
    F2: Fn(&mut Cursor<&[u8]>) -> std::io::Result<T>,
{
    read_vec_raw(endian, data, read_le, read_be).map(wrap)
}

fn read_vec_raw<T, F1, F2>(
    endian: Endian,
    data: &[u8],
    read_le: F1,
    read_be: F2,
) -> RemoteResult<Vec<T>>
where
    F1: Fn(&mut Cursor<&[u8]>) -> std::io::Result<T>,
    F2: Fn(&mut Cursor<&[u8]>) -> std::io::Result<T>,
{
    let elem_size = std::mem::size_of::<T>();
    let count = data.len() / elem_size;
    let mut out = Vec::with_capacity(count);
    let mut cursor = Cursor::new(data);
    for _ in 0..count {
        let val = match endian {
            Endian::Little | Endian::NotApplicable => (read_le)(&mut cursor),
            Endian::Big => (read_be)(&mut cursor),
        }
        .map_err(|e| RemoteError::Decode(format!("Failed to read value: {e}")))?;
        out.push(val);
    }
    Ok(out)
}
