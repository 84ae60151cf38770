//! Saving and restoring which sample is loaded.

use crate::error::{Error, Result};
use crate::sample::load_sample;
use crate::sampler::Sampler;
use std::collections::HashMap;
use tessera_atom::Urid;

/// Key/value persistence supplied by the host.
pub trait StateStore {
    fn store(&mut self, key: Urid, value: &[u8], type_: Urid);

    fn retrieve(&self, key: Urid) -> Option<(&[u8], Urid)>;
}

/// In-memory [`StateStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<Urid, (Vec<u8>, Urid)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateStore for MemoryStore {
    fn store(&mut self, key: Urid, value: &[u8], type_: Urid) {
        self.entries.insert(key, (value.to_vec(), type_));
    }

    fn retrieve(&self, key: Urid) -> Option<(&[u8], Urid)> {
        self.entries
            .get(&key)
            .map(|(value, type_)| (value.as_slice(), *type_))
    }
}

impl Sampler {
    /// Store the current sample path under `file` as a zero-terminated
    /// `atom:Path`. Stores nothing if no sample is loaded.
    pub fn save(&self, store: &mut dyn StateStore) {
        let Some(sample) = self.sample() else {
            tracing::debug!("No sample to save");
            return;
        };

        let mut value = Vec::with_capacity(sample.path().len() + 1);
        value.extend_from_slice(sample.path().as_bytes());
        value.push(0);
        store.store(self.uris().file, &value, self.uris().atom.path);
    }

    /// Load the sample recorded by [`Sampler::save`].
    ///
    /// Loads synchronously, so call it off the realtime thread. The current
    /// sample is replaced only if the load succeeds. A store without a `file`
    /// entry is not an error.
    pub fn restore(&mut self, store: &dyn StateStore) -> Result<()> {
        let uris = *self.uris();
        let Some((value, type_)) = store.retrieve(uris.file) else {
            return Ok(());
        };
        if type_ != uris.atom.path {
            return Err(Error::InvalidState(format!(
                "file has type {}, expected a path",
                type_.get()
            )));
        }
        let path = value
            .strip_suffix(&[0])
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .ok_or_else(|| Error::InvalidState("file is not a zero-terminated path".into()))?;

        tracing::info!(path, "Restoring sample");
        let sample = load_sample(self.decoder(), path)?;
        self.replace_sample(Box::new(sample));
        Ok(())
    }
}
