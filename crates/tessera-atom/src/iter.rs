//! Forward-only traversals over composite atom bodies.
//!
//! Each iterator holds the container's contents slice and a cursor into it.
//! A step never revisits or mutates; a record that would run past the end of
//! the contents ends the traversal. Cloning forks the cursor; calling
//! `properties()`, `iter()`, or `events()` again restarts from the first record.

use crate::layout::{
    event_stride, property_stride, read_u32, EVENT_TIME_SIZE, PROPERTY_HEAD_SIZE,
};
use crate::urid::Urid;
use crate::view::{AtomRef, Event, Property, TimeStamp};
use std::iter::FusedIterator;

/// Properties of an object, in insertion order.
#[derive(Clone, Debug)]
pub struct Properties<'a> {
    contents: &'a [u8],
    cursor: usize,
}

impl<'a> Properties<'a> {
    pub(crate) fn new(contents: &'a [u8]) -> Self {
        Self {
            contents,
            cursor: 0,
        }
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.cursor >= self.contents.len()
    }

    fn read(&self) -> Option<Property<'a>> {
        let record = self.contents.get(self.cursor..)?;
        Some(Property {
            key: Urid::new(read_u32(record, 0)?),
            context: Urid::new(read_u32(record, 4)?),
            value: AtomRef::from_bytes(record.get(PROPERTY_HEAD_SIZE..)?)?,
        })
    }
}

impl<'a> Iterator for Properties<'a> {
    type Item = Property<'a>;

    fn next(&mut self) -> Option<Property<'a>> {
        if self.is_end() {
            return None;
        }
        match self.read() {
            Some(property) => {
                self.cursor += property_stride(property.value.size());
                Some(property)
            }
            None => {
                self.cursor = self.contents.len();
                None
            }
        }
    }
}

impl FusedIterator for Properties<'_> {}

/// Elements of a tuple, in order.
#[derive(Clone, Debug)]
pub struct Items<'a> {
    contents: &'a [u8],
    cursor: usize,
}

impl<'a> Items<'a> {
    pub(crate) fn new(contents: &'a [u8]) -> Self {
        Self {
            contents,
            cursor: 0,
        }
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.cursor >= self.contents.len()
    }
}

impl<'a> Iterator for Items<'a> {
    type Item = AtomRef<'a>;

    fn next(&mut self) -> Option<AtomRef<'a>> {
        if self.is_end() {
            return None;
        }
        match self.contents.get(self.cursor..).and_then(AtomRef::from_bytes) {
            Some(atom) => {
                self.cursor += atom.stride();
                Some(atom)
            }
            None => {
                self.cursor = self.contents.len();
                None
            }
        }
    }
}

impl FusedIterator for Items<'_> {}

/// Events of a sequence, in stored order.
#[derive(Clone, Debug)]
pub struct Events<'a> {
    contents: &'a [u8],
    cursor: usize,
}

impl<'a> Events<'a> {
    pub(crate) fn new(contents: &'a [u8]) -> Self {
        Self {
            contents,
            cursor: 0,
        }
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.cursor >= self.contents.len()
    }

    fn read(&self) -> Option<Event<'a>> {
        let record = self.contents.get(self.cursor..)?;
        Some(Event {
            time: TimeStamp::new(read_u32(record, 0)?, read_u32(record, 4)?),
            body: AtomRef::from_bytes(record.get(EVENT_TIME_SIZE..)?)?,
        })
    }
}

impl<'a> Iterator for Events<'a> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Event<'a>> {
        if self.is_end() {
            return None;
        }
        match self.read() {
            Some(event) => {
                self.cursor += event_stride(event.body.size());
                Some(event)
            }
            None => {
                self.cursor = self.contents.len();
                None
            }
        }
    }
}

impl FusedIterator for Events<'_> {}
