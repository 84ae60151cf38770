//! Counters for the sample handoff.
//!
//! Written from both threads with relaxed atomics; read via [`WorkerMetrics::snapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct WorkerMetrics {
    /// Set messages forwarded to the worker
    requests_sent: AtomicU64,
    /// Set messages dropped because the request ring was full
    requests_dropped: AtomicU64,
    /// Samples loaded and handed to the realtime thread
    samples_loaded: AtomicU64,
    /// Set messages that did not produce a sample
    load_failures: AtomicU64,
    /// Loaded samples dropped because the result ring was full
    results_dropped: AtomicU64,
    /// Samples installed by the realtime thread
    samples_applied: AtomicU64,
    /// Superseded samples released by the worker
    samples_freed: AtomicU64,
}

impl WorkerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_request_sent(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_request_dropped(&self) {
        self.requests_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_loaded(&self) {
        self.samples_loaded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_result_dropped(&self) {
        self.results_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_applied(&self) {
        self.samples_applied.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_freed(&self) {
        self.samples_freed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WorkerMetricsSnapshot {
        WorkerMetricsSnapshot {
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            requests_dropped: self.requests_dropped.load(Ordering::Relaxed),
            samples_loaded: self.samples_loaded.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            results_dropped: self.results_dropped.load(Ordering::Relaxed),
            samples_applied: self.samples_applied.load(Ordering::Relaxed),
            samples_freed: self.samples_freed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`WorkerMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerMetricsSnapshot {
    pub requests_sent: u64,
    pub requests_dropped: u64,
    pub samples_loaded: u64,
    pub load_failures: u64,
    pub results_dropped: u64,
    pub samples_applied: u64,
    pub samples_freed: u64,
}
