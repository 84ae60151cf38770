//! Worker thread that loads samples off the audio thread.

use super::metrics::WorkerMetrics;
use super::request::{send_sample, take_sample};
use super::ring::{RingReader, RingWriter, Signal};
use crate::error::{Error, Result};
use crate::sample::{load_sample, Sample, SampleDecoder};
use crate::uris::SamplerUris;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tessera_atom::{AtomRef, ObjectRef};

/// Worker-side state: the reading end of the request ring and the writing
/// end of the result ring.
pub(crate) struct Worker {
    uris: SamplerUris,
    decoder: Arc<dyn SampleDecoder>,
    requests: RingReader,
    results: RingWriter,
    metrics: Arc<WorkerMetrics>,
    scratch: Vec<u8>,
}

impl Worker {
    pub(crate) fn new(
        uris: SamplerUris,
        decoder: Arc<dyn SampleDecoder>,
        requests: RingReader,
        results: RingWriter,
        metrics: Arc<WorkerMetrics>,
    ) -> Self {
        Self {
            uris,
            decoder,
            requests,
            results,
            metrics,
            scratch: Vec::with_capacity(256),
        }
    }

    /// Handle every complete record in the request ring, in order.
    pub(crate) fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while self.requests.read_record(&mut self.scratch).is_some() {
            self.dispatch();
            handled += 1;
        }
        handled
    }

    fn dispatch(&mut self) {
        let Self {
            uris,
            decoder,
            results,
            metrics,
            scratch,
            ..
        } = self;

        let Some(atom) = AtomRef::from_bytes(scratch) else {
            return;
        };

        if atom.is(uris.free_sample) {
            // SAFETY: the realtime thread only forwards object atoms, so a
            // free record was written by `send_sample`; it was consumed above.
            if let Some(sample) = unsafe { take_sample(scratch) } {
                tracing::debug!(path = sample.path(), "Freeing sample");
                drop(sample);
                metrics.record_freed();
            }
        } else if let Some(object) = atom.as_object(&uris.atom) {
            match load_requested(uris, &**decoder, &object) {
                Ok(sample) => match send_sample(results, uris.apply_sample, Box::new(sample)) {
                    Ok(()) => metrics.record_loaded(),
                    Err(sample) => {
                        tracing::warn!(path = sample.path(), "Result ring full, dropping sample");
                        metrics.record_result_dropped();
                    }
                },
                Err(err) => {
                    tracing::warn!(error = %err, "Failed to load sample");
                    metrics.record_load_failure();
                }
            }
        } else {
            tracing::warn!(type_ = atom.type_().get(), "Unknown worker request");
        }
    }

    fn run(mut self, signal: Signal, shutdown: Arc<AtomicBool>) -> RingReader {
        while signal.wait() && !shutdown.load(Ordering::Acquire) {
            self.process_pending();
        }
        self.requests
    }
}

fn load_requested(
    uris: &SamplerUris,
    decoder: &dyn SampleDecoder,
    object: &ObjectRef<'_>,
) -> Result<Sample> {
    let path = uris.file_path(object).ok_or(Error::MissingFilePath)?;
    load_sample(decoder, path)
}

/// Handle to the running worker. Dropping it stops and joins the thread.
pub(crate) struct WorkerThread {
    signal: Signal,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<RingReader>>,
}

impl WorkerThread {
    pub(crate) fn spawn(name: &str, worker: Worker, signal: Signal) -> Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));

        let handle = {
            let signal = signal.clone();
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name(name.into())
                .spawn(move || worker.run(signal, shutdown))
                .map_err(Error::ThreadSpawn)?
        };

        Ok(Self {
            signal,
            shutdown,
            handle: Some(handle),
        })
    }

    #[inline]
    pub(crate) fn signal(&self) -> &Signal {
        &self.signal
    }

    /// Raise the exit flag, wake the worker and join it.
    ///
    /// Returns the request ring so records still queued can be released.
    pub(crate) fn stop(&mut self) -> Option<RingReader> {
        self.shutdown.store(true, Ordering::Release);
        self.signal.post();

        let handle = self.handle.take()?;
        match handle.join() {
            Ok(requests) => Some(requests),
            Err(_) => {
                tracing::warn!("Worker thread panicked");
                None
            }
        }
    }
}

impl Drop for WorkerThread {
    fn drop(&mut self) {
        self.stop();
    }
}
