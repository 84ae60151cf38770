//! Atom type table.
//!
//! Atom types are identified by URIDs, so the set of types a reader or writer
//! understands is resolved once against a [`UridMap`] and carried around as an
//! [`AtomTypes`] value.

use crate::layout::ContentsKind;
use crate::urid::{Urid, UridMap};

/// URIs of the built-in atom types.
pub mod uris {
    pub const ATOM: &str = "http://lv2plug.in/ns/ext/atom#";

    pub const INT: &str = "http://lv2plug.in/ns/ext/atom#Int";
    pub const LONG: &str = "http://lv2plug.in/ns/ext/atom#Long";
    pub const FLOAT: &str = "http://lv2plug.in/ns/ext/atom#Float";
    pub const DOUBLE: &str = "http://lv2plug.in/ns/ext/atom#Double";
    pub const BOOL: &str = "http://lv2plug.in/ns/ext/atom#Bool";
    pub const URID: &str = "http://lv2plug.in/ns/ext/atom#URID";

    pub const STRING: &str = "http://lv2plug.in/ns/ext/atom#String";
    pub const URI: &str = "http://lv2plug.in/ns/ext/atom#URI";
    pub const PATH: &str = "http://lv2plug.in/ns/ext/atom#Path";
    pub const LITERAL: &str = "http://lv2plug.in/ns/ext/atom#Literal";

    pub const OBJECT: &str = "http://lv2plug.in/ns/ext/atom#Object";
    pub const RESOURCE: &str = "http://lv2plug.in/ns/ext/atom#Resource";
    pub const BLANK: &str = "http://lv2plug.in/ns/ext/atom#Blank";
    pub const TUPLE: &str = "http://lv2plug.in/ns/ext/atom#Tuple";
    pub const VECTOR: &str = "http://lv2plug.in/ns/ext/atom#Vector";
    pub const SEQUENCE: &str = "http://lv2plug.in/ns/ext/atom#Sequence";

    /// Sequence time unit: audio frames.
    pub const FRAME_TIME: &str = "http://lv2plug.in/ns/ext/atom#frameTime";
}

/// Fixed-size atom kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    Long,
    Float,
    Double,
    Bool,
    Urid,
}

impl ScalarKind {
    /// Body size implied by the type.
    pub const fn size(self) -> usize {
        match self {
            ScalarKind::Int | ScalarKind::Float | ScalarKind::Bool | ScalarKind::Urid => 4,
            ScalarKind::Long | ScalarKind::Double => 8,
        }
    }
}

/// Zero-terminated text kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StringKind {
    String,
    Uri,
    Path,
    Literal,
}

/// Closed classification of an atom type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AtomKind {
    Scalar(ScalarKind),
    String(StringKind),
    Object,
    Tuple,
    Vector,
    Sequence,
    Unknown,
}

impl AtomKind {
    /// Which sub-header precedes the contents of a body of this kind.
    pub const fn contents_kind(self) -> ContentsKind {
        match self {
            AtomKind::String(StringKind::Literal) => ContentsKind::Literal,
            AtomKind::Object => ContentsKind::Object,
            AtomKind::Vector => ContentsKind::Vector,
            AtomKind::Sequence => ContentsKind::Sequence,
            _ => ContentsKind::Plain,
        }
    }

    pub const fn is_container(self) -> bool {
        matches!(
            self,
            AtomKind::Object | AtomKind::Tuple | AtomKind::Vector | AtomKind::Sequence
        )
    }
}

/// URIDs of the built-in atom types, resolved against one map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtomTypes {
    pub int: Urid,
    pub long: Urid,
    pub float: Urid,
    pub double: Urid,
    pub bool: Urid,
    pub urid: Urid,
    pub string: Urid,
    pub uri: Urid,
    pub path: Urid,
    pub literal: Urid,
    pub object: Urid,
    pub resource: Urid,
    pub blank: Urid,
    pub tuple: Urid,
    pub vector: Urid,
    pub sequence: Urid,
    pub frame_time: Urid,
}

impl AtomTypes {
    pub fn new<M: UridMap + ?Sized>(map: &M) -> Self {
        Self {
            int: map.map(uris::INT),
            long: map.map(uris::LONG),
            float: map.map(uris::FLOAT),
            double: map.map(uris::DOUBLE),
            bool: map.map(uris::BOOL),
            urid: map.map(uris::URID),
            string: map.map(uris::STRING),
            uri: map.map(uris::URI),
            path: map.map(uris::PATH),
            literal: map.map(uris::LITERAL),
            object: map.map(uris::OBJECT),
            resource: map.map(uris::RESOURCE),
            blank: map.map(uris::BLANK),
            tuple: map.map(uris::TUPLE),
            vector: map.map(uris::VECTOR),
            sequence: map.map(uris::SEQUENCE),
            frame_time: map.map(uris::FRAME_TIME),
        }
    }

    /// Classify a type id. Ids this table does not know are `Unknown`.
    pub fn kind(&self, type_: Urid) -> AtomKind {
        if type_.is_none() {
            AtomKind::Unknown
        } else if type_ == self.int {
            AtomKind::Scalar(ScalarKind::Int)
        } else if type_ == self.long {
            AtomKind::Scalar(ScalarKind::Long)
        } else if type_ == self.float {
            AtomKind::Scalar(ScalarKind::Float)
        } else if type_ == self.double {
            AtomKind::Scalar(ScalarKind::Double)
        } else if type_ == self.bool {
            AtomKind::Scalar(ScalarKind::Bool)
        } else if type_ == self.urid {
            AtomKind::Scalar(ScalarKind::Urid)
        } else if type_ == self.string {
            AtomKind::String(StringKind::String)
        } else if type_ == self.uri {
            AtomKind::String(StringKind::Uri)
        } else if type_ == self.path {
            AtomKind::String(StringKind::Path)
        } else if type_ == self.literal {
            AtomKind::String(StringKind::Literal)
        } else if self.is_object_type(type_) {
            AtomKind::Object
        } else if type_ == self.tuple {
            AtomKind::Tuple
        } else if type_ == self.vector {
            AtomKind::Vector
        } else if type_ == self.sequence {
            AtomKind::Sequence
        } else {
            AtomKind::Unknown
        }
    }

    /// Object, Resource, and Blank all share the object body layout.
    #[inline]
    pub fn is_object_type(&self, type_: Urid) -> bool {
        type_ == self.object || type_ == self.resource || type_ == self.blank
    }

    /// Type id for a scalar kind.
    pub fn scalar(&self, kind: ScalarKind) -> Urid {
        match kind {
            ScalarKind::Int => self.int,
            ScalarKind::Long => self.long,
            ScalarKind::Float => self.float,
            ScalarKind::Double => self.double,
            ScalarKind::Bool => self.bool,
            ScalarKind::Urid => self.urid,
        }
    }

    /// Type id for a string kind.
    pub fn string_like(&self, kind: StringKind) -> Urid {
        match kind {
            StringKind::String => self.string,
            StringKind::Uri => self.uri,
            StringKind::Path => self.path,
            StringKind::Literal => self.literal,
        }
    }
}
