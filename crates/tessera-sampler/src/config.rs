//! Sampler configuration.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Smallest ring that still holds a handful of sample records and a set message.
pub const MIN_RING_CAPACITY: usize = 256;

/// Configuration for the sampler and its worker thread.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Capacity in bytes of each worker ring (default: 4096)
    pub ring_capacity: usize,
    /// Sample loaded synchronously at construction (default: none)
    pub default_sample: Option<PathBuf>,
    /// Name of the worker thread (default: "tessera-worker")
    pub worker_name: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            ring_capacity: 4096,
            default_sample: None,
            worker_name: "tessera-worker".into(),
        }
    }
}

impl SamplerConfig {
    pub fn with_ring_capacity(mut self, bytes: usize) -> Self {
        self.ring_capacity = bytes;
        self
    }

    pub fn with_default_sample(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_sample = Some(path.into());
        self
    }

    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Upper bound on records that can sit in one ring at once.
    pub fn max_records(&self) -> usize {
        self.ring_capacity / tessera_atom::HEADER_SIZE
    }

    pub fn validate(&self) -> Result<()> {
        if self.ring_capacity < MIN_RING_CAPACITY {
            return Err(Error::InvalidConfig(format!(
                "ring_capacity {} below minimum of {} bytes",
                self.ring_capacity, MIN_RING_CAPACITY
            )));
        }
        if self.worker_name.is_empty() {
            return Err(Error::InvalidConfig("worker_name is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SamplerConfig::default();
        assert_eq!(config.ring_capacity, 4096);
        assert_eq!(config.default_sample, None);
        assert_eq!(config.worker_name, "tessera-worker");
        assert_eq!(config.max_records(), 512);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = SamplerConfig::default()
            .with_ring_capacity(1024)
            .with_default_sample("/tmp/kick.wav")
            .with_worker_name("loader");
        assert_eq!(config.ring_capacity, 1024);
        assert_eq!(config.default_sample, Some(PathBuf::from("/tmp/kick.wav")));
        assert_eq!(config.worker_name, "loader");
    }

    #[test]
    fn test_validate_rejects_small_ring() {
        let config = SamplerConfig::default().with_ring_capacity(16);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let config = SamplerConfig::default().with_worker_name("");
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SamplerConfig =
            serde_json::from_str(r#"{ "ring_capacity": 8192, "default_sample": "a.wav" }"#)
                .unwrap();
        assert_eq!(config.ring_capacity, 8192);
        assert_eq!(config.default_sample, Some(PathBuf::from("a.wav")));
        assert_eq!(config.worker_name, "tessera-worker");
    }
}
