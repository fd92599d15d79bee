//! The `MidiWriteable` trait is central to translating data from segno's
//! internal representations back into raw MIDI bytes. In other words, if
//! [`crate::reader::MidiReadable`] is about getting MIDI bytes *into* the
//! model, `MidiWriteable` does the opposite: taking parsed or constructed
//! types and converting them into the canonical MIDI byte format, for writing
//! back to a file or stream.

use crate::Chunk;

/// A trait for types that can be encoded as MIDI-format bytes.
///
/// `MidiWriteable` is implemented by several primitive numeric types for
/// convenience, as well as by [`Chunk`] and the event model types. Encoding
/// is infallible; operations that can fail structurally (like writing a track
/// with no terminal marker) validate before encoding.
pub trait MidiWriteable {
    /// Converts the data to a MIDI format byte sequence
    fn to_midi_bytes(self) -> Vec<u8>;
}

impl MidiWriteable for u8 {
    fn to_midi_bytes(self) -> Vec<u8> {
        vec![self]
    }
}

impl MidiWriteable for i8 {
    fn to_midi_bytes(self) -> Vec<u8> {
        vec![self.to_be_bytes()[0]]
    }
}

impl MidiWriteable for u16 {
    fn to_midi_bytes(self) -> Vec<u8> {
        let bytes = self.to_be_bytes();
        vec![bytes[0], bytes[1]]
    }
}

impl MidiWriteable for u32 {
    fn to_midi_bytes(self) -> Vec<u8> {
        let bytes = self.to_be_bytes();
        vec![bytes[0], bytes[1], bytes[2], bytes[3]]
    }
}

impl MidiWriteable for [char; 4] {
    fn to_midi_bytes(self) -> Vec<u8> {
        vec![self[0] as u8, self[1] as u8, self[2] as u8, self[3] as u8]
    }
}

impl MidiWriteable for Chunk {
    fn to_midi_bytes(self) -> Vec<u8> {
        let mut bytes = self.chunk_type.to_midi_bytes();
        bytes.extend((self.len() as u32).to_midi_bytes().iter());

        bytes
    }
}

impl MidiWriteable for String {
    fn to_midi_bytes(self) -> Vec<u8> {
        self.into_bytes()
    }
}
