//! URIs the sampler speaks, resolved once against a [`UridMap`].

use tessera_atom::{AtomTypes, AtomView, Forge, ObjectRef, Urid, UridMap, Written};

/// Property holding the sample path, in messages and in saved state.
pub const FILE: &str = "urn:tessera:sampler#file";
pub const APPLY_SAMPLE: &str = "urn:tessera:sampler#applySample";
pub const FREE_SAMPLE: &str = "urn:tessera:sampler#freeSample";

pub const MIDI_EVENT: &str = "http://lv2plug.in/ns/ext/midi#MidiEvent";
pub const MSG_SET: &str = "http://lv2plug.in/ns/ext/message#Set";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerUris {
    pub atom: AtomTypes,
    pub midi_event: Urid,
    pub msg_set: Urid,
    pub file: Urid,
    pub apply_sample: Urid,
    pub free_sample: Urid,
}

impl SamplerUris {
    pub fn new<M: UridMap + ?Sized>(map: &M) -> Self {
        Self {
            atom: AtomTypes::new(map),
            midi_event: map.map(MIDI_EVENT),
            msg_set: map.map(MSG_SET),
            file: map.map(FILE),
            apply_sample: map.map(APPLY_SAMPLE),
            free_sample: map.map(FREE_SAMPLE),
        }
    }

    #[inline]
    pub fn is_set_message(&self, object: &ObjectRef<'_>) -> bool {
        object.otype() == self.msg_set
    }

    /// Path carried by the `file` property of a set message.
    ///
    /// Only a Path atom with UTF-8 text counts.
    pub fn file_path<'a>(&self, object: &ObjectRef<'a>) -> Option<&'a str> {
        let mut file = None;
        object.query(&mut [(self.file, &mut file)]);
        match file?.view(&self.atom) {
            AtomView::Path(text) => text.to_str(),
            _ => None,
        }
    }

    /// Forge `[ a msg:Set ; file <path> ]`.
    pub fn write_set_file(&self, forge: &mut Forge<'_>, path: &str) -> tessera_atom::Result<Written> {
        let frame = forge.blank(Urid::NONE, self.msg_set)?;
        let body = forge
            .property_head(self.file, Urid::NONE)
            .and_then(|()| forge.path(path).map(drop));
        let popped = forge.pop(frame);
        body.and(popped)
    }
}
