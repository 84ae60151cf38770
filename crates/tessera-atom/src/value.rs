//! Owned atom trees for code off the audio thread.
//!
//! [`AtomRef`] borrows a buffer and never allocates. [`Value`] is the owned
//! counterpart: build one freely, [`Value::write`] it through a forge, or
//! decode a borrowed atom with [`Value::from_atom`].

use crate::error::Result;
use crate::forge::{Forge, Frame, Written};
use crate::types::AtomTypes;
use crate::urid::Urid;
use crate::view::{AtomRef, AtomView, ObjectRef, Text, TimeStamp};

/// Which of the three property-set types an object was written as.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ObjectFlavor {
    #[default]
    Object,
    Resource,
    Blank,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyValue {
    pub key: Urid,
    pub context: Urid,
    pub value: Value,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectValue {
    pub flavor: ObjectFlavor,
    pub id: Urid,
    pub otype: Urid,
    pub properties: Vec<PropertyValue>,
}

impl ObjectValue {
    pub fn new(otype: Urid) -> Self {
        Self {
            otype,
            ..Self::default()
        }
    }

    /// Builder-style property append.
    pub fn with(mut self, key: Urid, value: Value) -> Self {
        self.properties.push(PropertyValue {
            key,
            context: Urid::NONE,
            value,
        });
        self
    }

    /// First value stored under `key`.
    pub fn get(&self, key: Urid) -> Option<&Value> {
        self.properties
            .iter()
            .find(|property| property.key == key)
            .map(|property| &property.value)
    }
}

/// An owned atom.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Urid(Urid),
    String(String),
    Uri(String),
    Path(String),
    Literal {
        text: String,
        datatype: Urid,
        lang: Urid,
    },
    Object(ObjectValue),
    Tuple(Vec<Value>),
    Vector {
        element_type: Urid,
        element_size: u32,
        data: Vec<u8>,
    },
    Sequence {
        unit: Urid,
        events: Vec<(TimeStamp, Value)>,
    },
    /// Any other atom, kept as type and body bytes.
    Raw { type_: Urid, body: Vec<u8> },
}

impl Value {
    /// Encode through `forge`.
    ///
    /// Containers are always popped, even when a child fails, so the forge's
    /// frame stack stays balanced. Overflow still fails the whole value.
    pub fn write(&self, forge: &mut Forge<'_>) -> Result<Written> {
        match self {
            Value::Int(v) => forge.int(*v),
            Value::Long(v) => forge.long(*v),
            Value::Float(v) => forge.float(*v),
            Value::Double(v) => forge.double(*v),
            Value::Bool(v) => forge.bool(*v),
            Value::Urid(v) => forge.urid(*v),
            Value::String(text) => forge.string(text),
            Value::Uri(text) => forge.uri(text),
            Value::Path(text) => forge.path(text),
            Value::Literal {
                text,
                datatype,
                lang,
            } => forge.literal(text, *datatype, *lang),
            Value::Object(object) => {
                let frame = match object.flavor {
                    ObjectFlavor::Object => forge.object(object.id, object.otype)?,
                    ObjectFlavor::Resource => forge.resource(object.id, object.otype)?,
                    ObjectFlavor::Blank => forge.blank(object.id, object.otype)?,
                };
                let body = object.properties.iter().try_for_each(|property| {
                    forge.property_head(property.key, property.context)?;
                    property.value.write(forge).map(drop)
                });
                close(forge, frame, body)
            }
            Value::Tuple(items) => {
                let frame = forge.tuple()?;
                let body = items.iter().try_for_each(|item| item.write(forge).map(drop));
                close(forge, frame, body)
            }
            Value::Vector {
                element_type,
                element_size,
                data,
            } => forge.vector(*element_type, *element_size, data),
            Value::Sequence { unit, events } => {
                let frame = forge.sequence_head(*unit)?;
                let body = events.iter().try_for_each(|(time, event)| {
                    forge.frame_time(time.frames, time.subframes)?;
                    event.write(forge).map(drop)
                });
                close(forge, frame, body)
            }
            Value::Raw { type_, body } => forge.atom_with(*type_, body),
        }
    }

    /// Decode a borrowed atom. Returns `None` if the atom or anything inside
    /// it is malformed. Text that is not UTF-8 is malformed.
    pub fn from_atom(types: &AtomTypes, atom: AtomRef<'_>) -> Option<Value> {
        Some(match atom.view(types) {
            AtomView::Int(v) => Value::Int(v),
            AtomView::Long(v) => Value::Long(v),
            AtomView::Float(v) => Value::Float(v),
            AtomView::Double(v) => Value::Double(v),
            AtomView::Bool(v) => Value::Bool(v),
            AtomView::Urid(v) => Value::Urid(v),
            AtomView::String(text) => Value::String(owned(text)?),
            AtomView::Uri(text) => Value::Uri(owned(text)?),
            AtomView::Path(text) => Value::Path(owned(text)?),
            AtomView::Literal(literal) => Value::Literal {
                text: owned(literal.text)?,
                datatype: literal.datatype,
                lang: literal.lang,
            },
            AtomView::Object(object) => Value::Object(object_value(types, object)?),
            AtomView::Tuple(tuple) => Value::Tuple(
                tuple
                    .iter()
                    .map(|item| Value::from_atom(types, item))
                    .collect::<Option<_>>()?,
            ),
            AtomView::Vector(vector) => Value::Vector {
                element_type: vector.element_type(),
                element_size: vector.element_size() as u32,
                data: vector.data().to_vec(),
            },
            AtomView::Sequence(sequence) => Value::Sequence {
                unit: sequence.unit(),
                events: sequence
                    .events()
                    .map(|event| Some((event.time, Value::from_atom(types, event.body)?)))
                    .collect::<Option<_>>()?,
            },
            AtomView::Unknown(raw) => Value::Raw {
                type_: raw.type_(),
                body: raw.body().to_vec(),
            },
        })
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Text of a string-like value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) | Value::Uri(text) | Value::Path(text) => Some(text),
            Value::Literal { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }
}

fn close(forge: &mut Forge<'_>, frame: Frame, body: Result<()>) -> Result<Written> {
    let popped = forge.pop(frame);
    body.and(popped)
}

fn owned(text: Text<'_>) -> Option<String> {
    text.to_str().map(str::to_owned)
}

fn object_value(types: &AtomTypes, object: ObjectRef<'_>) -> Option<ObjectValue> {
    let type_ = object.atom().type_();
    let flavor = if type_ == types.resource {
        ObjectFlavor::Resource
    } else if type_ == types.blank {
        ObjectFlavor::Blank
    } else {
        ObjectFlavor::Object
    };
    let properties = object
        .properties()
        .map(|property| {
            Some(PropertyValue {
                key: property.key,
                context: property.context,
                value: Value::from_atom(types, property.value)?,
            })
        })
        .collect::<Option<_>>()?;
    Some(ObjectValue {
        flavor,
        id: object.id(),
        otype: object.otype(),
        properties,
    })
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<ObjectValue> for Value {
    fn from(v: ObjectValue) -> Self {
        Value::Object(v)
    }
}
