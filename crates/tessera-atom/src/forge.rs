//! Incremental atom writer over a caller-supplied buffer.
//!
//! The forge appends atoms at a cursor. Containers are opened with a size of
//! zero and patched when their [`Frame`] is popped, so a reader never sees a
//! container whose size covers unfinished children.
//!
//! Writes are all-or-nothing: an atom is written only if all of it, padding
//! included, fits. The first failed write marks the forge overflowed, and
//! every later write and pop fails until [`Forge::set_buffer`]. A message cut
//! short is therefore abandoned as a whole.
//!
//! ```
//! use tessera_atom::{AtomTypes, Forge, UriMap};
//!
//! let map = UriMap::new();
//! let types = AtomTypes::new(&map);
//! let mut buf = [0u8; 256];
//! let mut forge = Forge::new(types, &mut buf);
//!
//! let tuple = forge.tuple().unwrap();
//! forge.int(1).unwrap();
//! forge.string("two").unwrap();
//! forge.pop(tuple).unwrap();
//! ```

use crate::error::{ForgeError, Result};
use crate::layout::{pad_size, write_u32, AtomHeader, HEADER_SIZE, VECTOR_HEAD_SIZE};
use crate::types::AtomTypes;
use crate::urid::Urid;
use crate::view::{AtomRef, ScalarValue};
use smallvec::SmallVec;

/// Location of an atom written by a [`Forge`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Written {
    offset: usize,
}

impl Written {
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// An open container. Hand it back to [`Forge::pop`] to close it.
#[must_use = "an open frame must be popped to finalize the container size"]
#[derive(Debug, PartialEq, Eq)]
pub struct Frame {
    offset: usize,
}

impl Frame {
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Atom serializer over a fixed buffer.
pub struct Forge<'buf> {
    buf: &'buf mut [u8],
    offset: usize,
    frames: SmallVec<[usize; 8]>,
    overflowed: bool,
    types: AtomTypes,
}

impl<'buf> Forge<'buf> {
    pub fn new(types: AtomTypes, buf: &'buf mut [u8]) -> Self {
        Self {
            buf,
            offset: 0,
            frames: SmallVec::new(),
            overflowed: false,
            types,
        }
    }

    /// Start over on a new buffer. Clears frames and the overflow flag.
    pub fn set_buffer(&mut self, buf: &'buf mut [u8]) {
        self.buf = buf;
        self.offset = 0;
        self.frames.clear();
        self.overflowed = false;
    }

    #[inline]
    pub fn types(&self) -> &AtomTypes {
        &self.types
    }

    /// Bytes written so far.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    #[inline]
    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Number of open containers.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.offset]
    }

    /// View an atom this forge wrote. Open containers read as their
    /// placeholder size of zero.
    pub fn atom(&self, at: Written) -> Option<AtomRef<'_>> {
        AtomRef::from_bytes(self.buf.get(at.offset..self.offset)?)
    }

    /// Claim `len` bytes (padded) at the cursor, or mark the forge overflowed.
    fn reserve(&mut self, len: usize) -> Result<usize> {
        let padded = pad_size(len);
        if self.overflowed || padded > self.remaining() {
            self.overflowed = true;
            return Err(ForgeError::Overflow {
                needed: padded,
                remaining: self.remaining(),
            });
        }
        let start = self.offset;
        self.buf[start + len..start + padded].fill(0);
        self.offset += padded;
        Ok(start)
    }

    /// Append raw, already-laid-out bytes, padded to 4.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<usize> {
        let start = self.reserve(bytes.len())?;
        self.buf[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(start)
    }

    /// Append one atom whose body is the concatenation of `parts`.
    fn write_parts(&mut self, type_: Urid, parts: &[&[u8]]) -> Result<Written> {
        let size: usize = parts.iter().map(|part| part.len()).sum();
        let start = self.reserve(HEADER_SIZE + size)?;
        AtomHeader::new(type_, size as u32).write(&mut self.buf[start..]);
        let mut cursor = start + HEADER_SIZE;
        for part in parts {
            self.buf[cursor..cursor + part.len()].copy_from_slice(part);
            cursor += part.len();
        }
        Ok(Written { offset: start })
    }

    /// Append an atom of any type with the given body.
    pub fn atom_with(&mut self, type_: Urid, body: &[u8]) -> Result<Written> {
        self.write_parts(type_, &[body])
    }

    /// Append a fixed-size scalar of type `T`.
    pub fn scalar<T: ScalarValue>(&mut self, value: T) -> Result<Written> {
        let mut raw = [0u8; 8];
        value.write_ne(&mut raw);
        self.write_parts(T::atom_type(&self.types), &[&raw[..T::SIZE]])
    }

    pub fn int(&mut self, value: i32) -> Result<Written> {
        self.scalar(value)
    }

    pub fn long(&mut self, value: i64) -> Result<Written> {
        self.scalar(value)
    }

    pub fn float(&mut self, value: f32) -> Result<Written> {
        self.scalar(value)
    }

    pub fn double(&mut self, value: f64) -> Result<Written> {
        self.scalar(value)
    }

    /// Stored as an Int-sized 0 or 1.
    pub fn bool(&mut self, value: bool) -> Result<Written> {
        let raw = i32::from(value).to_ne_bytes();
        self.write_parts(self.types.bool, &[&raw])
    }

    pub fn urid(&mut self, id: Urid) -> Result<Written> {
        let raw = id.get().to_ne_bytes();
        self.write_parts(self.types.urid, &[&raw])
    }

    /// Append `bytes` plus a zero terminator as an atom of `type_`.
    pub fn string_like(&mut self, type_: Urid, bytes: &[u8]) -> Result<Written> {
        self.write_parts(type_, &[bytes, &[0]])
    }

    pub fn string(&mut self, text: &str) -> Result<Written> {
        self.string_like(self.types.string, text.as_bytes())
    }

    pub fn uri(&mut self, uri: &str) -> Result<Written> {
        self.string_like(self.types.uri, uri.as_bytes())
    }

    pub fn path(&mut self, path: &str) -> Result<Written> {
        self.string_like(self.types.path, path.as_bytes())
    }

    /// Text tagged with a datatype and a language (either may be `Urid::NONE`).
    pub fn literal(&mut self, text: &str, datatype: Urid, lang: Urid) -> Result<Written> {
        let datatype = datatype.get().to_ne_bytes();
        let lang = lang.get().to_ne_bytes();
        self.write_parts(
            self.types.literal,
            &[&datatype, &lang, text.as_bytes(), &[0]],
        )
    }

    /// Append a vector of raw elements. The element count is
    /// `data.len() / element_size`.
    pub fn vector(&mut self, element_type: Urid, element_size: u32, data: &[u8]) -> Result<Written> {
        debug_assert!(
            element_size == 0 || data.len() % element_size as usize == 0,
            "vector data is not a whole number of elements"
        );
        let element_type = element_type.get().to_ne_bytes();
        let element_size = element_size.to_ne_bytes();
        self.write_parts(self.types.vector, &[&element_type, &element_size, data])
    }

    /// Append a vector of scalars.
    pub fn vector_of<T: ScalarValue>(&mut self, elements: &[T]) -> Result<Written> {
        let head_type = T::atom_type(&self.types).get().to_ne_bytes();
        let head_size = (T::SIZE as u32).to_ne_bytes();
        let size = VECTOR_HEAD_SIZE + elements.len() * T::SIZE;
        let start = self.reserve(HEADER_SIZE + size)?;
        AtomHeader::new(self.types.vector, size as u32).write(&mut self.buf[start..]);
        let body = start + HEADER_SIZE;
        self.buf[body..body + 4].copy_from_slice(&head_type);
        self.buf[body + 4..body + 8].copy_from_slice(&head_size);
        for (i, element) in elements.iter().enumerate() {
            let at = body + VECTOR_HEAD_SIZE + i * T::SIZE;
            element.write_ne(&mut self.buf[at..at + T::SIZE]);
        }
        Ok(Written { offset: start })
    }

    /// Open a container of `type_` whose body starts with `head`.
    pub fn push(&mut self, type_: Urid, head: &[u8]) -> Result<Frame> {
        let Written { offset } = self.write_parts(type_, &[head])?;
        write_u32(&mut self.buf[..], offset + 4, 0);
        self.frames.push(offset);
        Ok(Frame { offset })
    }

    pub fn tuple(&mut self) -> Result<Frame> {
        self.push(self.types.tuple, &[])
    }

    /// Open an object. `id` is `Urid::NONE` for a blank object.
    pub fn object(&mut self, id: Urid, otype: Urid) -> Result<Frame> {
        self.push_object(self.types.object, id, otype)
    }

    pub fn resource(&mut self, id: Urid, otype: Urid) -> Result<Frame> {
        self.push_object(self.types.resource, id, otype)
    }

    pub fn blank(&mut self, id: Urid, otype: Urid) -> Result<Frame> {
        self.push_object(self.types.blank, id, otype)
    }

    fn push_object(&mut self, type_: Urid, id: Urid, otype: Urid) -> Result<Frame> {
        let mut head = [0u8; 8];
        write_u32(&mut head, 0, id.get());
        write_u32(&mut head, 4, otype.get());
        self.push(type_, &head)
    }

    /// Open a sequence whose event stamps are in `unit` (`Urid::NONE` for frames).
    pub fn sequence_head(&mut self, unit: Urid) -> Result<Frame> {
        let mut head = [0u8; 8];
        write_u32(&mut head, 0, unit.get());
        self.push(self.types.sequence, &head)
    }

    /// Close the innermost container and patch its size.
    ///
    /// Frames must be popped in the reverse order they were pushed.
    pub fn pop(&mut self, frame: Frame) -> Result<Written> {
        debug_assert_eq!(
            self.frames.last(),
            Some(&frame.offset),
            "forge frames must be popped in LIFO order"
        );
        self.frames.pop();

        if self.overflowed {
            return Err(ForgeError::Overflow {
                needed: 0,
                remaining: self.remaining(),
            });
        }

        let size = self.offset - (frame.offset + HEADER_SIZE);
        write_u32(&mut self.buf[..], frame.offset + 4, size as u32);
        Ok(Written {
            offset: frame.offset,
        })
    }

    /// Key and context of an object property. Exactly one value atom must follow.
    pub fn property_head(&mut self, key: Urid, context: Urid) -> Result<()> {
        let mut head = [0u8; 8];
        write_u32(&mut head, 0, key.get());
        write_u32(&mut head, 4, context.get());
        self.write_raw(&head).map(|_| ())
    }

    /// Time stamp of the next event in an open sequence. Exactly one body
    /// atom must follow.
    pub fn frame_time(&mut self, frames: u32, subframes: u32) -> Result<()> {
        let mut head = [0u8; 8];
        write_u32(&mut head, 0, frames);
        write_u32(&mut head, 4, subframes);
        self.write_raw(&head).map(|_| ())
    }
}
