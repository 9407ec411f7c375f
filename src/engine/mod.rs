//! The compression engine the codec depends on.
//!
//! The service answers a fetch with one of two payloads: a standalone
//! compressed frame holding exactly the requested region, or a
//! self-describing container holding a whole array. An [`ArrayEngine`] knows
//! how to tell them apart cheaply and how to open each one; nothing else of
//! the engine is visible to the rest of the crate.

pub mod blosc;

use crate::error::RemoteResult;
use crate::metadata::ElementType;

pub use blosc::BloscEngine;

// ---------------------------------------------------------------------------
// PayloadKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// A compressed frame for exactly the requested region.
    SliceFrame,
    /// A self-describing container; the region still has to be extracted.
    Container,
    /// Neither signature matched.
    Unknown,
}

impl std::fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadKind::SliceFrame => write!(f, "slice frame"),
            PayloadKind::Container => write!(f, "container"),
            PayloadKind::Unknown => write!(f, "unknown"),
        }
    }
}

// ---------------------------------------------------------------------------
// Decoded payloads
// ---------------------------------------------------------------------------

/// The decompressed contents of a slice frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatBuffer {
    pub item_size: usize,
    pub bytes: Vec<u8>,
}

impl FlatBuffer {
    pub fn len(&self) -> usize {
        if self.item_size == 0 {
            0
        } else {
            self.bytes.len() / self.item_size
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fully decompressed container: a C-ordered N-dimensional array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedArray {
    pub shape: Vec<usize>,
    pub element: ElementType,
    pub bytes: Vec<u8>,
}

impl DecodedArray {
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// `None` if the element count does not fit a `usize`.
    pub fn num_elements(&self) -> Option<usize> {
        checked_num_elements(&self.shape)
    }
}

pub(crate) fn checked_num_elements(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Byte length of a C-ordered array, or `None` on overflow.
pub(crate) fn checked_byte_len(shape: &[usize], item_size: usize) -> Option<usize> {
    checked_num_elements(shape)?.checked_mul(item_size)
}

// ---------------------------------------------------------------------------
// ArrayEngine trait
// ---------------------------------------------------------------------------

/// Detection and decompression of the two payload shapes a fetch can return.
pub trait ArrayEngine: Send + Sync {
    /// Classify `raw` by its signature without decompressing it.
    fn probe(&self, raw: &[u8]) -> PayloadKind;

    /// Decompress a standalone frame.
    fn decompress_frame(&self, raw: &[u8]) -> RemoteResult<FlatBuffer>;

    /// Decompress a container into an addressable array.
    fn open_container(&self, raw: &[u8]) -> RemoteResult<DecodedArray>;
}
