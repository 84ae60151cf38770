//! Batched lookup of several keys in one pass over an object.

use crate::urid::Urid;
use crate::view::{AtomRef, ObjectRef};
use smallvec::{smallvec, SmallVec};

impl<'a> ObjectRef<'a> {
    /// Fill each `(key, slot)` with the value of the first property whose key
    /// matches, walking the properties once.
    ///
    /// Returns how many entries were matched. Slots of unmatched entries are
    /// left as they were, so callers should start them at `None`. Later
    /// properties with an already-matched key are ignored.
    ///
    /// ```
    /// # use tessera_atom::{AtomTypes, AtomRef, Forge, UriMap, UridMap, Urid};
    /// # let map = UriMap::new();
    /// # let types = AtomTypes::new(&map);
    /// # let (gain, name) = (map.map("urn:gain"), map.map("urn:name"));
    /// # let mut buf = [0u8; 128];
    /// # let mut forge = Forge::new(types, &mut buf);
    /// # let frame = forge.blank(Urid::NONE, Urid::NONE).unwrap();
    /// # forge.property_head(gain, Urid::NONE).unwrap();
    /// # forge.float(0.5).unwrap();
    /// # let written = forge.pop(frame).unwrap();
    /// # let object = forge.atom(written).unwrap().as_object(&types).unwrap();
    /// let mut gain_value = None;
    /// let mut name_value = None;
    /// let matched = object.query(&mut [(gain, &mut gain_value), (name, &mut name_value)]);
    /// assert_eq!(matched, 1);
    /// assert!(gain_value.is_some() && name_value.is_none());
    /// ```
    pub fn query(&self, queries: &mut [(Urid, &mut Option<AtomRef<'a>>)]) -> usize {
        if queries.is_empty() {
            return 0;
        }

        let mut matched: SmallVec<[bool; 16]> = smallvec![false; queries.len()];
        let mut n_matched = 0;

        for property in self.properties() {
            let entry = queries
                .iter_mut()
                .enumerate()
                .find(|(i, (key, _))| !matched[*i] && *key == property.key);

            if let Some((i, (_, slot))) = entry {
                **slot = Some(property.value);
                matched[i] = true;
                n_matched += 1;
                if n_matched == queries.len() {
                    break;
                }
            }
        }

        n_matched
    }
}

#[cfg(test)]
mod tests {
    use crate::equality::atom_equals;
    use crate::forge::Forge;
    use crate::types::AtomTypes;
    use crate::urid::{UriMap, UridMap, Urid};
    use crate::view::AtomView;

    #[test]
    fn test_query_all_keys() {
        let map = UriMap::new();
        let types = AtomTypes::new(&map);
        let keys: Vec<Urid> = (0..5).map(|i| map.map(&format!("urn:k{}", i))).collect();

        let mut buf = [0u8; 512];
        let mut forge = Forge::new(types, &mut buf);
        let frame = forge.blank(Urid::NONE, Urid::NONE).unwrap();
        for (i, key) in keys.iter().enumerate() {
            forge.property_head(*key, Urid::NONE).unwrap();
            forge.int(i as i32 * 10).unwrap();
        }
        let written = forge.pop(frame).unwrap();
        let object = forge.atom(written).unwrap().as_object(&types).unwrap();

        let mut slots = [None; 5];
        let [s0, s1, s2, s3, s4] = &mut slots;
        // Ask in reverse order; the result must not depend on it.
        let matched = object.query(&mut [
            (keys[4], s4),
            (keys[3], s3),
            (keys[2], s2),
            (keys[1], s1),
            (keys[0], s0),
        ]);
        assert_eq!(matched, 5);

        for (i, slot) in slots.iter().enumerate() {
            let value = slot.expect("slot filled");
            assert!(matches!(value.view(&types), AtomView::Int(v) if v == i as i32 * 10));
            assert!(atom_equals(&types, value, object.get(keys[i]).unwrap()));
        }
    }

    #[test]
    fn test_first_duplicate_wins() {
        let map = UriMap::new();
        let types = AtomTypes::new(&map);
        let key = map.map("urn:dup");

        let mut buf = [0u8; 128];
        let mut forge = Forge::new(types, &mut buf);
        let frame = forge.blank(Urid::NONE, Urid::NONE).unwrap();
        forge.property_head(key, Urid::NONE).unwrap();
        forge.int(1).unwrap();
        forge.property_head(key, Urid::NONE).unwrap();
        forge.int(2).unwrap();
        let written = forge.pop(frame).unwrap();
        let object = forge.atom(written).unwrap().as_object(&types).unwrap();

        let mut value = None;
        assert_eq!(object.query(&mut [(key, &mut value)]), 1);
        assert!(matches!(value.unwrap().view(&types), AtomView::Int(1)));
        assert!(matches!(object.get(key).unwrap().view(&types), AtomView::Int(1)));
        assert_eq!(object.properties().count(), 2);
    }

    #[test]
    fn test_missing_key_leaves_slot() {
        let map = UriMap::new();
        let types = AtomTypes::new(&map);

        let mut buf = [0u8; 64];
        let mut forge = Forge::new(types, &mut buf);
        let frame = forge.blank(Urid::NONE, Urid::NONE).unwrap();
        let written = forge.pop(frame).unwrap();
        let object = forge.atom(written).unwrap().as_object(&types).unwrap();
        assert!(object.is_empty());

        let mut value = None;
        assert_eq!(object.query(&mut [(map.map("urn:absent"), &mut value)]), 0);
        assert!(value.is_none());
        assert_eq!(object.query(&mut []), 0);
    }
}
