//! Records that move sample ownership through the rings.
//!
//! An apply or free record is an atom header followed by one 64-bit word: the
//! address of a boxed [`Sample`]. Writing the record gives the box up; reading
//! it takes the box back. Each record is read exactly once, so exactly one side
//! owns the sample at any time.

use super::ring::{RingReader, RingWriter};
use crate::sample::Sample;
use tessera_atom::{AtomHeader, Urid, HEADER_SIZE};

const WORD_SIZE: usize = std::mem::size_of::<u64>();

/// Padded size of an apply or free record.
pub(crate) const SAMPLE_RECORD_SIZE: usize = HEADER_SIZE + WORD_SIZE;

/// Hand `sample` to the other side of `ring` in a record of type `type_`.
///
/// If the ring has no room the sample is given back untouched.
pub(crate) fn send_sample(
    ring: &mut RingWriter,
    type_: Urid,
    sample: Box<Sample>,
) -> Result<(), Box<Sample>> {
    if ring.vacant_len() < SAMPLE_RECORD_SIZE {
        return Err(sample);
    }

    let raw = Box::into_raw(sample);
    let word = (raw as usize as u64).to_ne_bytes();
    let header = AtomHeader::new(type_, WORD_SIZE as u32);
    match ring.write_atom(header, &word) {
        Ok(_) => Ok(()),
        // SAFETY: the record was not written, so `raw` is still the only
        // handle to the box created above.
        Err(_) => Err(unsafe { Box::from_raw(raw) }),
    }
}

/// Take ownership of the sample carried by a record read from a ring.
///
/// # Safety
///
/// `record` must be a record written by [`send_sample`], and it must not have
/// been passed here before.
pub(crate) unsafe fn take_sample(record: &[u8]) -> Option<Box<Sample>> {
    let header = AtomHeader::read(record)?;
    if header.size as usize != WORD_SIZE {
        return None;
    }
    let word = record.get(HEADER_SIZE..SAMPLE_RECORD_SIZE)?;
    let address = u64::from_ne_bytes(word.try_into().ok()?) as usize;
    // SAFETY: per the caller contract the word is the address produced by
    // `Box::into_raw` in `send_sample`, and ownership has not been reclaimed.
    Some(unsafe { Box::from_raw(address as *mut Sample) })
}

/// Release every sample still in flight on `ring`. Other records are skipped.
///
/// Runs at teardown, after both threads are done with the ring.
pub(crate) fn drain_samples(ring: &mut RingReader, types: &[Urid]) -> usize {
    let mut released = 0;
    let mut record = [0u8; SAMPLE_RECORD_SIZE];
    while let Some(header) = ring.peek_header() {
        if !types.contains(&header.type_) {
            if ring.skip_record().is_none() {
                break;
            }
            continue;
        }
        match ring.read_record_into(&mut record) {
            Some(SAMPLE_RECORD_SIZE) => {
                // SAFETY: only `send_sample` writes records of these types,
                // and this record was just consumed from the ring.
                if let Some(sample) = unsafe { take_sample(&record) } {
                    tracing::debug!(path = sample.path(), "Releasing undelivered sample");
                    released += 1;
                }
            }
            Some(_) => {}
            None => break,
        }
    }
    released
}
