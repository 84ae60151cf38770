//! # Tessera
//!
//! Self-describing binary atoms for realtime message passing, and a sampler
//! built on them.
//!
//! ## Architecture
//!
//! - **tessera-atom** - Atom layout, forge, iteration, batched query, equality, URI interning
//! - **tessera-sampler** - Mono sampler with a worker thread that loads samples off the audio thread
//!
//! ## Quick Start
//!
//! ```
//! use tessera::prelude::*;
//!
//! let map = UriMap::new();
//! let types = AtomTypes::new(&map);
//!
//! let mut buf = [0u8; 64];
//! let mut forge = Forge::new(types, &mut buf);
//! let tuple = forge.tuple().unwrap();
//! forge.int(1).unwrap();
//! forge.string("two").unwrap();
//! let tuple = forge.pop(tuple).unwrap();
//!
//! let atom = forge.atom(tuple).unwrap();
//! assert_eq!(atom.as_tuple(&types).unwrap().len(), 2);
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Atoms and sampler
//! - `sampler` - Sample playback and the worker handoff

/// Re-export of tessera-atom for direct access
pub use tessera_atom as atom;

/// Re-export of tessera-sampler for direct access
#[cfg(feature = "sampler")]
pub use tessera_sampler as sampler;

pub use tessera_atom::{
    atom_equals, AtomKind, AtomRef, AtomTypes, AtomView, Forge, ForgeError, Frame, ObjectRef,
    SequenceRef, TupleRef, UriMap, Urid, UridMap, Value, VectorRef, Written,
};

#[cfg(feature = "sampler")]
pub use tessera_sampler::{Sampler, SamplerConfig, StateStore, WavDecoder};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::atom::{
        atom_equals, AtomRef, AtomTypes, AtomView, Forge, ObjectRef, SequenceRef, TimeStamp,
        TupleRef, UriMap, Urid, UridMap, Value,
    };

    #[cfg(feature = "sampler")]
    pub use crate::sampler::{
        MemoryStore, Sampler, SamplerConfig, SamplerUris, StateStore, WavDecoder,
    };
}
