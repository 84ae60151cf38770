//! Self-describing binary atoms for real-time message passing.
//!
//! An atom is a native-endian `{ type, size }` header followed by `size` body
//! bytes, padded to a multiple of 4. Containers (objects, tuples, vectors,
//! sequences) nest atoms inside their bodies, so one contiguous byte buffer can
//! carry a whole message between threads.
//!
//! # Primary API
//!
//! - [`Forge`]: append atoms into a caller-supplied buffer, no allocation
//! - [`AtomRef`] / [`AtomView`]: zero-copy typed reads
//! - [`ObjectRef::query`]: pull several properties out of an object in one pass
//! - [`atom_equals`]: structural equality
//! - [`UridMap`] / [`UriMap`]: URI interning
//! - [`Value`]: owned atom trees for non-realtime code
//!
//! # Example
//!
//! ```
//! use tessera_atom::{AtomTypes, AtomView, Forge, UriMap, UridMap, Urid};
//!
//! let map = UriMap::new();
//! let types = AtomTypes::new(&map);
//! let gain = map.map("urn:example:gain");
//!
//! let mut buf = [0u8; 128];
//! let mut forge = Forge::new(types, &mut buf);
//! let frame = forge.object(Urid::NONE, map.map("urn:example:Set")).unwrap();
//! forge.property_head(gain, Urid::NONE).unwrap();
//! forge.float(0.5).unwrap();
//! let written = forge.pop(frame).unwrap();
//!
//! let object = forge.atom(written).unwrap().as_object(&types).unwrap();
//! let value = object.get(gain).unwrap();
//! assert!(matches!(value.view(&types), AtomView::Float(v) if v == 0.5));
//! ```

pub mod error;
pub use error::{ForgeError, Result};

pub mod layout;
pub use layout::{pad_size, stride, total_size, AtomHeader, HEADER_SIZE};

mod urid;
pub use urid::{UriMap, Urid, UridMap};

pub mod types;
pub use types::{AtomKind, AtomTypes, ScalarKind, StringKind};

mod view;
pub use view::{
    AtomRef, AtomView, Event, LiteralRef, ObjectRef, Property, ScalarValue, SequenceRef, Text,
    TimeStamp, TupleRef, VectorRef,
};

pub mod iter;
pub use iter::{Events, Items, Properties};

mod forge;
pub use forge::{Forge, Frame, Written};

mod query;

mod equality;
pub use equality::atom_equals;

mod value;
pub use value::{ObjectFlavor, ObjectValue, PropertyValue, Value};
