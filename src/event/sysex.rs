//! System Exclusive Messages

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{vlq, writer::MidiWriteable};

/// A system exclusive event: an opaque vendor-defined payload.
///
/// The payload excludes both the leading `0xF0` and the trailing `0xF7`
/// framing bytes. Source streams may split one message across several
/// continuation records; the model always holds (and re-emits) the combined
/// payload as a single segment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SysExEvent {
    /// The unframed payload bytes
    data: Vec<u8>,
}

impl SysExEvent {
    /// Wraps an unframed payload
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// The unframed payload bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl MidiWriteable for SysExEvent {
    fn to_midi_bytes(self) -> Vec<u8> {
        let mut bytes = vec![0xF0];
        // The declared length covers the payload plus the trailing marker
        bytes.extend(vlq::encode(self.data.len() as u32 + 1).iter());
        bytes.extend(self.data.iter());
        bytes.push(0xF7);

        bytes
    }
}

impl fmt::Display for SysExEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SysEx {} byte(s)", self.data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::SysExEvent;
    use crate::writer::MidiWriteable;

    #[test]
    fn encoding_frames_and_counts_the_marker() {
        let event = SysExEvent::new(vec![0x43, 0x12, 0x00]);
        assert_eq!(
            event.to_midi_bytes(),
            vec![0xF0, 0x04, 0x43, 0x12, 0x00, 0xF7]
        );
    }

    #[test]
    fn empty_payload_still_carries_the_marker() {
        let event = SysExEvent::new(vec![]);
        assert_eq!(event.to_midi_bytes(), vec![0xF0, 0x01, 0xF7]);
    }
}
