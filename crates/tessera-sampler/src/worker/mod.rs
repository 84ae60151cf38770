//! Off-thread sample loading.
//!
//! Two byte rings connect the realtime thread and the worker: requests flow
//! to the worker, results flow back. A [`Signal`] wakes the worker when a
//! request is queued. The realtime side never blocks on either.

mod metrics;
mod request;
mod ring;
mod thread;

pub use metrics::{WorkerMetrics, WorkerMetricsSnapshot};
pub use ring::{record_ring, RingReader, RingWriter, Signal};

pub(crate) use request::{drain_samples, send_sample, take_sample, SAMPLE_RECORD_SIZE};
pub(crate) use thread::{Worker, WorkerThread};
