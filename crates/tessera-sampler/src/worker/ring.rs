//! Byte rings carrying atom-framed records between the realtime thread and
//! the worker, plus the signal that wakes the worker.
//!
//! Every record starts with an atom header and occupies its padded stride in
//! the ring. A record is written whole or not at all, and the reader only
//! consumes a record once all of its bytes are present.

use crate::error::{Error, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use tessera_atom::{pad_size, AtomHeader, HEADER_SIZE};

const PADDING: [u8; 3] = [0; 3];

/// Writing end of a record ring.
pub struct RingWriter {
    producer: HeapProd<u8>,
}

/// Reading end of a record ring.
pub struct RingReader {
    consumer: HeapCons<u8>,
}

/// Create a ring of `capacity` bytes.
pub fn record_ring(capacity: usize) -> (RingWriter, RingReader) {
    let (producer, consumer) = HeapRb::<u8>::new(capacity).split();
    (RingWriter { producer }, RingReader { consumer })
}

impl RingWriter {
    /// Append one record made of `parts`, padded to 4 bytes.
    ///
    /// Fails without writing anything if the whole padded record does not fit.
    pub fn write(&mut self, parts: &[&[u8]]) -> Result<usize> {
        let len: usize = parts.iter().map(|part| part.len()).sum();
        let padded = pad_size(len);
        let vacant = self.producer.vacant_len();
        if padded > vacant {
            return Err(Error::QueueFull {
                needed: padded,
                vacant,
            });
        }

        for part in parts {
            self.producer.push_slice(part);
        }
        self.producer.push_slice(&PADDING[..padded - len]);
        Ok(padded)
    }

    /// Append an atom given its header and body.
    pub fn write_atom(&mut self, header: AtomHeader, body: &[u8]) -> Result<usize> {
        self.write(&[&header.to_bytes(), body])
    }

    #[inline]
    pub fn vacant_len(&self) -> usize {
        self.producer.vacant_len()
    }
}

impl RingReader {
    /// Header of the next record, without consuming anything.
    pub fn peek_header(&self) -> Option<AtomHeader> {
        let (head, tail) = self.consumer.as_slices();
        if head.len() + tail.len() < HEADER_SIZE {
            return None;
        }
        let mut raw = [0u8; HEADER_SIZE];
        for (dst, src) in raw.iter_mut().zip(head.iter().chain(tail)) {
            *dst = *src;
        }
        AtomHeader::read(&raw)
    }

    /// Padded length of the next record, if it is completely available.
    pub fn next_record_len(&self) -> Option<usize> {
        let stride = self.peek_header()?.stride();
        (self.consumer.occupied_len() >= stride).then_some(stride)
    }

    /// Move the next complete record into `buf`, replacing its contents.
    ///
    /// May allocate, so only the worker uses it.
    pub fn read_record(&mut self, buf: &mut Vec<u8>) -> Option<usize> {
        let stride = self.next_record_len()?;
        buf.clear();
        buf.resize(stride, 0);
        self.consumer.pop_slice(buf);
        Some(stride)
    }

    /// Move the next complete record into a fixed buffer.
    ///
    /// A record larger than `buf` is skipped and reported as `Some(0)`.
    pub fn read_record_into(&mut self, buf: &mut [u8]) -> Option<usize> {
        let stride = self.next_record_len()?;
        if stride > buf.len() {
            self.consumer.skip(stride);
            return Some(0);
        }
        self.consumer.pop_slice(&mut buf[..stride]);
        Some(stride)
    }

    /// Drop the next complete record.
    pub fn skip_record(&mut self) -> Option<usize> {
        let stride = self.next_record_len()?;
        self.consumer.skip(stride);
        Some(stride)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    #[inline]
    pub fn occupied_len(&self) -> usize {
        self.consumer.occupied_len()
    }
}

/// Counting wake-up signal. Posting never blocks; waiting does.
#[derive(Clone)]
pub struct Signal {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Signal {
    /// A signal that can hold up to `capacity` outstanding posts.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self { tx, rx }
    }

    /// Add one token. Returns false if the count is saturated, in which case
    /// the waiter is already due to wake.
    #[inline]
    pub fn post(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }

    /// Block until a token is available and take it.
    pub fn wait(&self) -> bool {
        self.rx.recv().is_ok()
    }

    /// Take a token if one is available.
    pub fn try_wait(&self) -> bool {
        self.rx.try_recv().is_ok()
    }

    /// Outstanding tokens.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}
