//! Read-side views over atoms in a byte buffer.
//!
//! [`AtomRef`] is the untyped view: a header plus a body slice. Classifying it
//! against an [`AtomTypes`] table yields an [`AtomView`], the closed set of
//! typed views. Nothing here copies; every view borrows the original buffer.

use crate::iter::{Events, Items, Properties};
use crate::layout::{
    read_u32, AtomHeader, HEADER_SIZE, LITERAL_HEAD_SIZE, OBJECT_HEAD_SIZE, SEQUENCE_HEAD_SIZE,
    VECTOR_HEAD_SIZE,
};
use crate::types::{AtomKind, AtomTypes, ScalarKind, StringKind};
use crate::urid::Urid;
use std::fmt;

/// Untyped view of one atom.
#[derive(Clone, Copy)]
pub struct AtomRef<'a> {
    header: AtomHeader,
    body: &'a [u8],
}

impl<'a> AtomRef<'a> {
    /// View the atom at the start of `bytes`.
    ///
    /// Returns `None` if the header or the declared body does not fit.
    pub fn from_bytes(bytes: &'a [u8]) -> Option<Self> {
        let header = AtomHeader::read(bytes)?;
        let end = HEADER_SIZE.checked_add(header.size as usize)?;
        let body = bytes.get(HEADER_SIZE..end)?;
        Some(Self { header, body })
    }

    #[inline]
    pub fn header(&self) -> AtomHeader {
        self.header
    }

    #[inline]
    pub fn type_(&self) -> Urid {
        self.header.type_
    }

    /// Unpadded body size.
    #[inline]
    pub fn size(&self) -> usize {
        self.body.len()
    }

    #[inline]
    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    /// Header plus padded body.
    #[inline]
    pub fn stride(&self) -> usize {
        self.header.stride()
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.header.is_null()
    }

    /// True if this atom has exactly the given type.
    #[inline]
    pub fn is(&self, type_: Urid) -> bool {
        self.header.type_ == type_
    }

    #[inline]
    pub fn kind(&self, types: &AtomTypes) -> AtomKind {
        types.kind(self.header.type_)
    }

    /// Decode into a typed view.
    ///
    /// Atoms whose type is unknown, or whose body is too short for their
    /// declared type, come back as [`AtomView::Unknown`].
    pub fn view(&self, types: &AtomTypes) -> AtomView<'a> {
        let atom = *self;
        let body = self.body;
        let decoded = match self.kind(types) {
            AtomKind::Scalar(kind) => scalar_view(kind, body),
            AtomKind::String(StringKind::Literal) => LiteralRef::parse(body).map(AtomView::Literal),
            AtomKind::String(kind) => Text::parse(body).map(|text| match kind {
                StringKind::Uri => AtomView::Uri(text),
                StringKind::Path => AtomView::Path(text),
                _ => AtomView::String(text),
            }),
            AtomKind::Object => ObjectRef::parse(atom).map(AtomView::Object),
            AtomKind::Tuple => Some(AtomView::Tuple(TupleRef { atom, items: body })),
            AtomKind::Vector => VectorRef::parse(atom).map(AtomView::Vector),
            AtomKind::Sequence => SequenceRef::parse(atom).map(AtomView::Sequence),
            AtomKind::Unknown => None,
        };
        decoded.unwrap_or(AtomView::Unknown(atom))
    }

    pub fn as_object(&self, types: &AtomTypes) -> Option<ObjectRef<'a>> {
        match self.view(types) {
            AtomView::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_tuple(&self, types: &AtomTypes) -> Option<TupleRef<'a>> {
        match self.view(types) {
            AtomView::Tuple(tuple) => Some(tuple),
            _ => None,
        }
    }

    pub fn as_vector(&self, types: &AtomTypes) -> Option<VectorRef<'a>> {
        match self.view(types) {
            AtomView::Vector(vector) => Some(vector),
            _ => None,
        }
    }

    pub fn as_sequence(&self, types: &AtomTypes) -> Option<SequenceRef<'a>> {
        match self.view(types) {
            AtomView::Sequence(sequence) => Some(sequence),
            _ => None,
        }
    }

    /// Text of a String, URI, or Path atom (not Literal).
    pub fn as_text(&self, types: &AtomTypes) -> Option<Text<'a>> {
        match self.view(types) {
            AtomView::String(text) | AtomView::Uri(text) | AtomView::Path(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Debug for AtomRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomRef")
            .field("type", &self.header.type_.get())
            .field("size", &self.header.size)
            .finish()
    }
}

fn scalar_view(kind: ScalarKind, body: &[u8]) -> Option<AtomView<'_>> {
    Some(match kind {
        ScalarKind::Int => AtomView::Int(i32::read_ne(body)?),
        ScalarKind::Long => AtomView::Long(i64::read_ne(body)?),
        ScalarKind::Float => AtomView::Float(f32::read_ne(body)?),
        ScalarKind::Double => AtomView::Double(f64::read_ne(body)?),
        ScalarKind::Bool => AtomView::Bool(i32::read_ne(body)? != 0),
        ScalarKind::Urid => AtomView::Urid(Urid::new(u32::read_ne(body)?)),
    })
}

/// Typed view of one atom.
#[derive(Clone, Copy, Debug)]
pub enum AtomView<'a> {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Urid(Urid),
    String(Text<'a>),
    Uri(Text<'a>),
    Path(Text<'a>),
    Literal(LiteralRef<'a>),
    Object(ObjectRef<'a>),
    Tuple(TupleRef<'a>),
    Vector(VectorRef<'a>),
    Sequence(SequenceRef<'a>),
    /// Unrecognised or malformed; skip it with the generic stride.
    Unknown(AtomRef<'a>),
}

/// Zero-terminated text. The terminator is not part of [`Text::as_bytes`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Text<'a>(&'a [u8]);

impl<'a> Text<'a> {
    fn parse(body: &'a [u8]) -> Option<Self> {
        match body.split_last() {
            Some((0, text)) => Some(Self(text)),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    /// The text as UTF-8, if it is.
    #[inline]
    pub fn to_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.0).ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Text<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.0))
    }
}

/// Text with a datatype and a language tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiteralRef<'a> {
    pub datatype: Urid,
    pub lang: Urid,
    pub text: Text<'a>,
}

impl<'a> LiteralRef<'a> {
    fn parse(body: &'a [u8]) -> Option<Self> {
        Some(Self {
            datatype: Urid::new(read_u32(body, 0)?),
            lang: Urid::new(read_u32(body, 4)?),
            text: Text::parse(body.get(LITERAL_HEAD_SIZE..)?)?,
        })
    }
}

/// A property-set: `{ id, otype }` followed by property records.
#[derive(Clone, Copy, Debug)]
pub struct ObjectRef<'a> {
    atom: AtomRef<'a>,
    id: Urid,
    otype: Urid,
    properties: &'a [u8],
}

impl<'a> ObjectRef<'a> {
    fn parse(atom: AtomRef<'a>) -> Option<Self> {
        let body = atom.body();
        Some(Self {
            atom,
            id: Urid::new(read_u32(body, 0)?),
            otype: Urid::new(read_u32(body, 4)?),
            properties: body.get(OBJECT_HEAD_SIZE..)?,
        })
    }

    #[inline]
    pub fn atom(&self) -> AtomRef<'a> {
        self.atom
    }

    /// Subject id, `Urid::NONE` for a blank object.
    #[inline]
    pub fn id(&self) -> Urid {
        self.id
    }

    /// What kind of thing this object is.
    #[inline]
    pub fn otype(&self) -> Urid {
        self.otype
    }

    /// Properties in insertion order.
    #[inline]
    pub fn properties(&self) -> Properties<'a> {
        Properties::new(self.properties)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Value of the first property with `key`.
    pub fn get(&self, key: Urid) -> Option<AtomRef<'a>> {
        self.properties()
            .find(|property| property.key == key)
            .map(|property| property.value)
    }

    /// True if the object's `otype` is `class`, or it has an `rdf_type`
    /// property whose URID value is `class`.
    pub fn is_a(&self, types: &AtomTypes, rdf_type: Urid, class: Urid) -> bool {
        if self.otype == class {
            return true;
        }
        self.properties()
            .filter(|property| property.key == rdf_type)
            .any(|property| matches!(property.value.view(types), AtomView::Urid(id) if id == class))
    }
}

/// One `{ key, context, value }` record of an object.
#[derive(Clone, Copy, Debug)]
pub struct Property<'a> {
    pub key: Urid,
    pub context: Urid,
    pub value: AtomRef<'a>,
}

/// An ordered list of atoms with no per-element wrapper.
#[derive(Clone, Copy, Debug)]
pub struct TupleRef<'a> {
    atom: AtomRef<'a>,
    items: &'a [u8],
}

impl<'a> TupleRef<'a> {
    #[inline]
    pub fn atom(&self) -> AtomRef<'a> {
        self.atom
    }

    #[inline]
    pub fn iter(&self) -> Items<'a> {
        Items::new(self.items)
    }

    /// Number of elements. O(n).
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for TupleRef<'a> {
    type Item = AtomRef<'a>;
    type IntoIter = Items<'a>;

    fn into_iter(self) -> Items<'a> {
        self.iter()
    }
}

/// A flat homogeneous array.
#[derive(Clone, Copy, Debug)]
pub struct VectorRef<'a> {
    atom: AtomRef<'a>,
    element_type: Urid,
    element_size: u32,
    data: &'a [u8],
}

impl<'a> VectorRef<'a> {
    fn parse(atom: AtomRef<'a>) -> Option<Self> {
        let body = atom.body();
        Some(Self {
            atom,
            element_type: Urid::new(read_u32(body, 0)?),
            element_size: read_u32(body, 4)?,
            data: body.get(VECTOR_HEAD_SIZE..)?,
        })
    }

    #[inline]
    pub fn atom(&self) -> AtomRef<'a> {
        self.atom
    }

    #[inline]
    pub fn element_type(&self) -> Urid {
        self.element_type
    }

    #[inline]
    pub fn element_size(&self) -> usize {
        self.element_size as usize
    }

    /// Raw element bytes.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        match self.element_size {
            0 => 0,
            size => self.data.len() / size as usize,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes of element `index`.
    pub fn element(&self, index: usize) -> Option<&'a [u8]> {
        let size = self.element_size();
        let start = index.checked_mul(size)?;
        self.data.get(start..start.checked_add(size)?)
    }

    /// Elements decoded as `T`, or `None` if `T` has the wrong width.
    pub fn iter_as<T: ScalarValue + 'a>(&self) -> Option<impl Iterator<Item = T> + 'a> {
        if self.element_size() != T::SIZE {
            return None;
        }
        Some(self.data.chunks_exact(T::SIZE).filter_map(T::read_ne))
    }
}

/// A time-stamped list of events.
#[derive(Clone, Copy, Debug)]
pub struct SequenceRef<'a> {
    atom: AtomRef<'a>,
    unit: Urid,
    events: &'a [u8],
}

impl<'a> SequenceRef<'a> {
    fn parse(atom: AtomRef<'a>) -> Option<Self> {
        let body = atom.body();
        Some(Self {
            atom,
            unit: Urid::new(read_u32(body, 0)?),
            events: body.get(SEQUENCE_HEAD_SIZE..)?,
        })
    }

    /// View the sequence at the start of `bytes`, if it is one.
    pub fn from_bytes(types: &AtomTypes, bytes: &'a [u8]) -> Option<Self> {
        AtomRef::from_bytes(bytes)?.as_sequence(types)
    }

    #[inline]
    pub fn atom(&self) -> AtomRef<'a> {
        self.atom
    }

    /// Time unit of the event stamps, `Urid::NONE` if unspecified.
    #[inline]
    pub fn unit(&self) -> Urid {
        self.unit
    }

    /// Events in stored order. The order is not checked.
    #[inline]
    pub fn events(&self) -> Events<'a> {
        Events::new(self.events)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Audio frame position plus a sub-frame fraction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeStamp {
    pub frames: u32,
    pub subframes: u32,
}

impl TimeStamp {
    #[inline]
    pub const fn new(frames: u32, subframes: u32) -> Self {
        Self { frames, subframes }
    }
}

/// One time-stamped atom of a sequence.
#[derive(Clone, Copy, Debug)]
pub struct Event<'a> {
    pub time: TimeStamp,
    pub body: AtomRef<'a>,
}

/// Fixed-width values that can live in a scalar atom or a vector.
pub trait ScalarValue: Copy {
    const SIZE: usize;

    fn read_ne(bytes: &[u8]) -> Option<Self>;

    fn write_ne(self, out: &mut [u8]);

    /// Atom type used for a scalar or vector element of this value.
    fn atom_type(types: &AtomTypes) -> Urid;
}

macro_rules! impl_scalar_value {
    ($ty:ty, $field:ident) => {
        impl ScalarValue for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            #[inline]
            fn read_ne(bytes: &[u8]) -> Option<Self> {
                let raw = bytes.get(..Self::SIZE)?;
                Some(<$ty>::from_ne_bytes(raw.try_into().ok()?))
            }

            #[inline]
            fn write_ne(self, out: &mut [u8]) {
                out[..Self::SIZE].copy_from_slice(&self.to_ne_bytes());
            }

            #[inline]
            fn atom_type(types: &AtomTypes) -> Urid {
                types.$field
            }
        }
    };
}

impl_scalar_value!(i32, int);
impl_scalar_value!(i64, long);
impl_scalar_value!(f32, float);
impl_scalar_value!(f64, double);
impl_scalar_value!(u32, urid);
