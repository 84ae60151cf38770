//! URI interning.
//!
//! Atoms never carry URI strings in their type fields or property keys; they
//! carry [`Urid`]s handed out by a [`UridMap`]. Ids are stable for the life of
//! the map and are never evicted.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

/// Process-local integer standing in for an interned URI.
///
/// `Urid::NONE` (0) means "no id" and is never returned by a map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Urid(u32);

impl Urid {
    pub const NONE: Urid = Urid(0);

    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<Urid> for u32 {
    fn from(urid: Urid) -> u32 {
        urid.0
    }
}

/// URI interning collaborator.
pub trait UridMap: Send + Sync {
    /// Intern `uri`. Idempotent: the same string always yields the same id.
    fn map(&self, uri: &str) -> Urid;

    /// Reverse lookup, if the id was handed out by this map.
    fn unmap(&self, urid: Urid) -> Option<Arc<str>>;
}

impl<T: UridMap + ?Sized> UridMap for Arc<T> {
    fn map(&self, uri: &str) -> Urid {
        (**self).map(uri)
    }

    fn unmap(&self, urid: Urid) -> Option<Arc<str>> {
        (**self).unmap(urid)
    }
}

impl<T: UridMap + ?Sized> UridMap for &T {
    fn map(&self, uri: &str) -> Urid {
        (**self).map(uri)
    }

    fn unmap(&self, urid: Urid) -> Option<Arc<str>> {
        (**self).unmap(urid)
    }
}

/// Concurrent URI table with monotonically assigned ids starting at 1.
pub struct UriMap {
    ids: DashMap<Arc<str>, Urid>,
    uris: DashMap<Urid, Arc<str>>,
    next: AtomicU32,
}

impl UriMap {
    pub fn new() -> Self {
        Self {
            ids: DashMap::new(),
            uris: DashMap::new(),
            next: AtomicU32::new(1),
        }
    }

    /// Process-wide map, created on first use and never torn down.
    pub fn global() -> &'static UriMap {
        static GLOBAL: OnceLock<UriMap> = OnceLock::new();
        GLOBAL.get_or_init(UriMap::new)
    }

    /// Number of interned URIs.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Default for UriMap {
    fn default() -> Self {
        Self::new()
    }
}

impl UridMap for UriMap {
    fn map(&self, uri: &str) -> Urid {
        if let Some(id) = self.ids.get(uri) {
            return *id;
        }

        let uri: Arc<str> = Arc::from(uri);
        let mut created = false;
        let id = *self.ids.entry(Arc::clone(&uri)).or_insert_with(|| {
            created = true;
            Urid(self.next.fetch_add(1, Ordering::Relaxed))
        });
        if created {
            self.uris.insert(id, uri);
        }
        id
    }

    fn unmap(&self, urid: Urid) -> Option<Arc<str>> {
        self.uris.get(&urid).map(|uri| Arc::clone(uri.value()))
    }
}
