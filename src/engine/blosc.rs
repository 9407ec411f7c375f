use blosc2::CParams;
use blosc2::nd::{Dtype, Ndarray, NdarrayParams};
use byteorder::{ByteOrder, LittleEndian};

use super::{ArrayEngine, DecodedArray, FlatBuffer, PayloadKind, checked_byte_len};
use crate::error::{RemoteError, RemoteResult};
use crate::metadata::{ElementType, parse_dtype};

// ---------------------------------------------------------------------------
// Chunk header
// ---------------------------------------------------------------------------

/// Size of the header every Blosc chunk starts with.
pub const CHUNK_HEADER_LEN: usize = 16;

/// Size of the extended header written by Blosc2.
pub const EXTENDED_HEADER_LEN: usize = 32;

/// Newest chunk format version understood by the Blosc2 library.
const MAX_FORMAT_VERSION: u8 = 5;

/// Both shuffle bits set at once marks an extended header.
const EXTENDED_HEADER_FLAGS: u8 = 0x05;

/// The leading fields of a Blosc chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub version: u8,
    pub flags: u8,
    pub typesize: usize,
    pub nbytes: usize,
    pub cbytes: usize,
}

impl ChunkHeader {
    /// Read the header fields; `None` if `raw` is shorter than a header.
    pub fn read(raw: &[u8]) -> Option<Self> {
        if raw.len() < CHUNK_HEADER_LEN {
            return None;
        }
        Some(Self {
            version: raw[0],
            flags: raw[2],
            typesize: raw[3] as usize,
            nbytes: LittleEndian::read_u32(&raw[4..8]) as usize,
            cbytes: LittleEndian::read_u32(&raw[12..16]) as usize,
        })
    }

    pub fn is_extended(&self) -> bool {
        self.flags & EXTENDED_HEADER_FLAGS == EXTENDED_HEADER_FLAGS
    }

    pub fn header_len(&self) -> usize {
        if self.is_extended() {
            EXTENDED_HEADER_LEN
        } else {
            CHUNK_HEADER_LEN
        }
    }

    /// Whether `raw` is exactly one chunk: a known version, a non-zero item
    /// size, room for the whole header and a compressed size equal to the
    /// payload length.
    pub fn matches(raw: &[u8]) -> bool {
        match Self::read(raw) {
            Some(h) => {
                (1..=MAX_FORMAT_VERSION).contains(&h.version)
                    && h.typesize > 0
                    && raw.len() >= h.header_len()
                    && h.cbytes == raw.len()
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Contiguous frame
// ---------------------------------------------------------------------------

/// A contiguous Blosc2 frame opens with a msgpack string holding this magic.
pub const FRAME_MAGIC: &[u8; 8] = b"b2frame\0";

const FRAME_MAGIC_OFFSET: usize = 2;

pub fn has_frame_magic(raw: &[u8]) -> bool {
    raw.get(FRAME_MAGIC_OFFSET..FRAME_MAGIC_OFFSET + FRAME_MAGIC.len()) == Some(FRAME_MAGIC.as_slice())
}

// ---------------------------------------------------------------------------
// BloscEngine
// ---------------------------------------------------------------------------

/// The default [`ArrayEngine`], backed by the Blosc2 library: slices arrive
/// as a single compressed chunk, whole arrays as a b2nd contiguous frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct BloscEngine;

impl BloscEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compress `data` into a standalone slice chunk.
    pub fn encode_frame(&self, data: &[u8], typesize: usize) -> RemoteResult<Vec<u8>> {
        let mut cparams = CParams::default();
        cparams
            .typesize(typesize)
            .map_err(|e| RemoteError::Encode(format!("Invalid typesize {typesize}: {e}")))?;
        blosc2::compress(data, &cparams)
            .map_err(|e| RemoteError::Encode(format!("Blosc2 compress failed: {e}")))
    }

    /// Store a C-ordered array as a b2nd frame, one chunk for the whole array.
    pub fn encode_container(
        &self,
        shape: &[usize],
        element: ElementType,
        data: &[u8],
    ) -> RemoteResult<Vec<u8>> {
        let item_size = element_size(element)?;
        let expected = checked_byte_len(shape, item_size)
            .ok_or_else(|| RemoteError::Encode(format!("Array of shape {shape:?} is too large")))?;
        if data.len() != expected {
            return Err(RemoteError::Encode(format!(
                "Array of shape {shape:?} needs {expected} bytes, got {}",
                data.len()
            )));
        }

        let dtype = Dtype::from_numpy_str(&element.to_numpy_str())
            .map_err(|e| RemoteError::Encode(format!("Unsupported dtype: {e}")))?;
        let chunks: Vec<_> = shape.iter().map(|&d| d.max(1) as _).collect();
        let mut params = NdarrayParams::default();
        params
            .chunkshape(Some(chunks.as_slice()))
            .blockshape(Some(chunks.as_slice()));

        let array = Ndarray::from_items_bytes(data, dtype, shape, &params)
            .map_err(|e| RemoteError::Encode(format!("Failed to build b2nd array: {e}")))?;
        let frame = array
            .to_bytes()
            .map_err(|e| RemoteError::Encode(format!("Failed to serialize b2nd frame: {e}")))?;
        Ok(frame.to_vec())
    }
}

impl ArrayEngine for BloscEngine {
    fn probe(&self, raw: &[u8]) -> PayloadKind {
        if has_frame_magic(raw) {
            PayloadKind::Container
        } else if ChunkHeader::matches(raw) {
            PayloadKind::SliceFrame
        } else {
            PayloadKind::Unknown
        }
    }

    fn decompress_frame(&self, raw: &[u8]) -> RemoteResult<FlatBuffer> {
        let header = ChunkHeader::read(raw)
            .ok_or_else(|| RemoteError::Decode("Blosc chunk is shorter than its header".into()))?;
        let bytes = blosc2::decompress(raw)
            .map_err(|e| RemoteError::Decode(format!("Blosc2 decompress failed: {e}")))?;
        if bytes.len() != header.nbytes {
            return Err(RemoteError::Decode(format!(
                "Blosc chunk declares {} bytes but decompressed to {}",
                header.nbytes,
                bytes.len()
            )));
        }
        Ok(FlatBuffer {
            item_size: header.typesize,
            bytes,
        })
    }

    fn open_container(&self, raw: &[u8]) -> RemoteResult<DecodedArray> {
        let array = Ndarray::from_bytes(raw)
            .map_err(|e| RemoteError::Decode(format!("Invalid b2nd frame: {e}")))?;

        let shape = array
            .shape()
            .iter()
            .map(|&d| {
                usize::try_from(d)
                    .map_err(|_| RemoteError::Decode(format!("Negative dimension {d} in b2nd frame")))
            })
            .collect::<RemoteResult<Vec<_>>>()?;
        let dtype = array.dtype().to_numpy_str();
        let element = parse_dtype(&dtype).map_err(RemoteError::TypeConversion)?;
        let item_size = element_size(element)?;
        if item_size != array.typesize() {
            return Err(RemoteError::Decode(format!(
                "dtype {dtype} has {item_size}-byte items but the frame stores {}",
                array.typesize()
            )));
        }
        let expected = checked_byte_len(&shape, item_size)
            .ok_or_else(|| RemoteError::Decode(format!("Container of shape {shape:?} is too large")))?;

        let bytes = array
            .to_items_bytes()
            .map_err(|e| RemoteError::Decode(format!("Failed to decompress b2nd frame: {e}")))?;
        if bytes.len() != expected {
            return Err(RemoteError::Decode(format!(
                "Container of shape {shape:?} should hold {expected} bytes, got {}",
                bytes.len()
            )));
        }

        Ok(DecodedArray {
            shape,
            element,
            bytes,
        })
    }
}

fn element_size(element: ElementType) -> RemoteResult<usize> {
    element.data_type.byte_size().ok_or_else(|| {
        RemoteError::TypeConversion(format!(
            "{:?} elements have no fixed size",
            element.data_type
        ))
    })
}
