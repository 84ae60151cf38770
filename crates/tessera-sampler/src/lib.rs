//! Mono sampler with realtime-safe sample loading.
//!
//! The audio thread never touches the filesystem or the allocator for
//! samples. It forwards `msg:Set` requests to a worker thread through a
//! lock-free byte ring, and receives loaded samples back through another.
//! Ownership of each sample moves with the record that carries it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tessera_atom::UriMap;
//! use tessera_sampler::{Sampler, SamplerConfig, WavDecoder};
//!
//! let map = UriMap::new();
//! let config = SamplerConfig::default().with_default_sample("kick.wav");
//! let mut sampler = Sampler::new(&map, config, Arc::new(WavDecoder))?;
//!
//! // Per block: control sequence in, audio and notifications out.
//! # let control = [0u8; 16];
//! let mut output = [0.0f32; 256];
//! let mut notify = [0u8; 1024];
//! sampler.run(&control, &mut output, &mut notify);
//! # Ok::<(), tessera_sampler::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

mod config;
pub use config::{SamplerConfig, MIN_RING_CAPACITY};

pub mod uris;
pub use uris::SamplerUris;

mod sample;
pub use sample::{load_sample, DecodedAudio, Sample, SampleDecoder, WavDecoder};

pub mod worker;
pub use worker::{WorkerMetrics, WorkerMetricsSnapshot};

mod sampler;
pub use sampler::Sampler;

mod state;
pub use state::{MemoryStore, StateStore};
