//! Structural atom equality.
//!
//! Two atoms are equal when they have the same type, the same size, and equal
//! contents. Objects must also share `id` and `otype`; their properties
//! compare as a multiset, so property order does not matter. Tuple elements
//! and sequence events compare in order.

use crate::types::AtomTypes;
use crate::view::{AtomRef, AtomView, ObjectRef, Property, SequenceRef, TupleRef};

/// Compare two atoms structurally.
pub fn atom_equals(types: &AtomTypes, a: AtomRef<'_>, b: AtomRef<'_>) -> bool {
    if a.type_() != b.type_() || a.size() != b.size() {
        return false;
    }

    match (a.view(types), b.view(types)) {
        (AtomView::Object(x), AtomView::Object(y)) => objects_equal(types, x, y),
        (AtomView::Tuple(x), AtomView::Tuple(y)) => tuples_equal(types, x, y),
        (AtomView::Sequence(x), AtomView::Sequence(y)) => sequences_equal(types, x, y),
        // Scalars, strings, vectors, and anything unrecognised: same bytes.
        _ => a.body() == b.body(),
    }
}

fn tuples_equal(types: &AtomTypes, x: TupleRef<'_>, y: TupleRef<'_>) -> bool {
    let (mut xs, mut ys) = (x.iter(), y.iter());
    loop {
        match (xs.next(), ys.next()) {
            (None, None) => return true,
            (Some(a), Some(b)) if atom_equals(types, a, b) => continue,
            _ => return false,
        }
    }
}

fn sequences_equal(types: &AtomTypes, x: SequenceRef<'_>, y: SequenceRef<'_>) -> bool {
    if x.unit() != y.unit() {
        return false;
    }
    let (mut xs, mut ys) = (x.events(), y.events());
    loop {
        match (xs.next(), ys.next()) {
            (None, None) => return true,
            (Some(a), Some(b)) if a.time == b.time && atom_equals(types, a.body, b.body) => {
                continue
            }
            _ => return false,
        }
    }
}

fn objects_equal(types: &AtomTypes, x: ObjectRef<'_>, y: ObjectRef<'_>) -> bool {
    if x.id() != y.id() || x.otype() != y.otype() {
        return false;
    }
    if x.properties().count() != y.properties().count() {
        return false;
    }
    // Same multiset: every triple occurs equally often on both sides.
    x.properties()
        .all(|p| occurrences(types, x, &p) == occurrences(types, y, &p))
}

fn occurrences(types: &AtomTypes, object: ObjectRef<'_>, needle: &Property<'_>) -> usize {
    object
        .properties()
        .filter(|p| {
            p.key == needle.key
                && p.context == needle.context
                && atom_equals(types, p.value, needle.value)
        })
        .count()
}
