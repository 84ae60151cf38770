//! Binary layout of atoms.
//!
//! Every stride and offset computation in the crate goes through this module.
//! An atom is an 8-byte header (`type`, `size`) followed by `size` bytes of
//! body. Bodies are padded so that the next atom starts on a 4-byte boundary;
//! the padding is never counted in `size`.

use crate::urid::Urid;

/// Size of an atom header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Alignment of every atom and property record.
pub const ALIGN: usize = 4;

/// Size of the `{ key, context }` prefix of an object property.
pub const PROPERTY_HEAD_SIZE: usize = 8;

/// Size of the `{ id, otype }` prefix of an object body.
pub const OBJECT_HEAD_SIZE: usize = 8;

/// Size of the `{ element_type, element_size }` prefix of a vector body.
pub const VECTOR_HEAD_SIZE: usize = 8;

/// Size of the `{ unit, pad }` prefix of a sequence body.
pub const SEQUENCE_HEAD_SIZE: usize = 8;

/// Size of the `{ datatype, lang }` prefix of a literal body.
pub const LITERAL_HEAD_SIZE: usize = 8;

/// Size of an event timestamp (`frames`, `subframes`).
pub const EVENT_TIME_SIZE: usize = 8;

/// Round `size` up to the next multiple of 4.
#[inline]
pub const fn pad_size(size: usize) -> usize {
    (size + (ALIGN - 1)) & !(ALIGN - 1)
}

/// Header + unpadded body.
#[inline]
pub const fn total_size(body_size: usize) -> usize {
    HEADER_SIZE + body_size
}

/// Distance from the start of an atom to the start of its next sibling.
#[inline]
pub const fn stride(body_size: usize) -> usize {
    HEADER_SIZE + pad_size(body_size)
}

/// Distance from one object property to the next.
#[inline]
pub const fn property_stride(value_size: usize) -> usize {
    PROPERTY_HEAD_SIZE + stride(value_size)
}

/// Distance from one sequence event to the next.
#[inline]
pub const fn event_stride(body_size: usize) -> usize {
    EVENT_TIME_SIZE + stride(body_size)
}

/// Read a native-endian `u32` at `offset`.
#[inline]
pub fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Write a native-endian `u32` at `offset`. The caller guarantees the range.
#[inline]
pub fn write_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
}

/// The fixed-size header that precedes every atom body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AtomHeader {
    pub type_: Urid,
    pub size: u32,
}

impl AtomHeader {
    #[inline]
    pub const fn new(type_: Urid, size: u32) -> Self {
        Self { type_, size }
    }

    /// Read a header from the start of `bytes`.
    #[inline]
    pub fn read(bytes: &[u8]) -> Option<Self> {
        Some(Self {
            type_: Urid::new(read_u32(bytes, 0)?),
            size: read_u32(bytes, 4)?,
        })
    }

    /// Write this header to the first 8 bytes of `bytes`.
    #[inline]
    pub fn write(&self, bytes: &mut [u8]) {
        write_u32(bytes, 0, self.type_.get());
        write_u32(bytes, 4, self.size);
    }

    #[inline]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        self.write(&mut out);
        out
    }

    /// Header plus unpadded body.
    #[inline]
    pub fn total_size(&self) -> usize {
        total_size(self.size as usize)
    }

    /// Header plus padded body.
    #[inline]
    pub fn stride(&self) -> usize {
        stride(self.size as usize)
    }

    /// A null atom has type 0 and size 0.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.type_.is_none() && self.size == 0
    }
}

/// Offset of the body within an atom.
#[inline]
pub const fn body_offset() -> usize {
    HEADER_SIZE
}

/// Size of the sub-header that precedes the contents of a body, per kind.
///
/// Scalars, strings, and tuples have none.
#[inline]
pub const fn contents_offset(kind: ContentsKind) -> usize {
    match kind {
        ContentsKind::Plain => 0,
        ContentsKind::Literal => LITERAL_HEAD_SIZE,
        ContentsKind::Object => OBJECT_HEAD_SIZE,
        ContentsKind::Vector => VECTOR_HEAD_SIZE,
        ContentsKind::Sequence => SEQUENCE_HEAD_SIZE,
    }
}

/// Which sub-header, if any, a body carries before its contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentsKind {
    Plain,
    Literal,
    Object,
    Vector,
    Sequence,
}

/// Slice of an atom body after the kind-specific sub-header.
#[inline]
pub fn contents(kind: ContentsKind, body: &[u8]) -> &[u8] {
    body.get(contents_offset(kind)..).unwrap_or(&[])
}
