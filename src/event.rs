//! The typed track event model: a delta-time paired with one of the closed
//! set of event kinds, each with a binary encoding rule and a human-readable
//! rendering

use std::{fmt, string::FromUtf8Error};

use thiserror::Error;

use self::channel::ChannelEvent;
use self::meta::MetaEvent;
use self::sysex::SysExEvent;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{vlq, writer::MidiWriteable};

pub mod channel;
pub mod meta;
pub mod parser;
pub mod sysex;

/// A field value outside its legal range, rejected at construction or
/// mutation time
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    /// A channel outside 0..=15
    #[error("channel {0} out of range (0-15)")]
    Channel(u8),
    /// A 7-bit data value outside 0..=127
    #[error("data value {0} out of range (0-127)")]
    DataByte(u8),
    /// A pitch wheel position outside the 14-bit range
    #[error("pitch wheel value {0} out of range (0-16383)")]
    PitchWheel(u16),
    /// A key signature outside -7..=7 sharps/flats
    #[error("key signature {0} out of range (-7 to 7)")]
    KeySignature(i8),
    /// A file format code outside {0, 1, 2}
    #[error("format {0} is not 0, 1 or 2")]
    Format(u16),
    /// A header declaring zero tracks
    #[error("track count must be at least 1")]
    TrackCount,
    /// A header declaring a zero division
    #[error("division must be at least 1")]
    Division,
    /// A variable-length quantity running past the 28-bit range
    #[error("variable-length quantity out of range")]
    Vlq,
    /// A fixed-size meta event declaring the wrong payload length
    #[error("meta event {tag:#04x} declared length {length}")]
    MetaLength {
        /// The meta-type byte
        tag: u8,
        /// The declared payload length
        length: u32,
    },
    /// Text metadata that is not valid UTF-8
    #[error("meta text is not valid UTF-8")]
    Text(#[from] FromUtf8Error),
}

/// A track event: a delta-time in ticks since the previous event of the same
/// track, plus the event itself
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackEvent {
    /// Ticks to wait after the previous event before this one fires
    delta_time: u32,
    /// The event that occurs once the delta time has elapsed
    kind: EventKind,
}

impl TrackEvent {
    /// Pairs a delta-time with an event
    pub fn new(delta_time: u32, kind: EventKind) -> Self {
        Self { delta_time, kind }
    }

    /// Ticks since the previous event in the same track
    pub fn delta_time(&self) -> u32 {
        self.delta_time
    }

    /// Replaces the delta-time
    pub fn set_delta_time(&mut self, delta_time: u32) {
        self.delta_time = delta_time;
    }

    /// The event payload
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Mutable access to the event payload
    pub fn kind_mut(&mut self) -> &mut EventKind {
        &mut self.kind
    }
}

impl MidiWriteable for TrackEvent {
    fn to_midi_bytes(self) -> Vec<u8> {
        let mut bytes = vlq::encode(self.delta_time);
        bytes.extend(self.kind.to_midi_bytes().iter());

        bytes
    }
}

impl fmt::Display for TrackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} {}", self.delta_time, self.kind)
    }
}

/// Any event that may occur in a track
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EventKind {
    /// A channel voice event
    Channel(ChannelEvent),
    /// Specifies non-MIDI information useful to this format or to sequencers
    Meta(MetaEvent),
    /// A system exclusive event
    SysEx(SysExEvent),
}

impl EventKind {
    /// True for the end-of-track meta marker
    pub fn is_end_of_track(&self) -> bool {
        matches!(self, EventKind::Meta(MetaEvent::EndOfTrack))
    }
}

impl MidiWriteable for EventKind {
    fn to_midi_bytes(self) -> Vec<u8> {
        match self {
            Self::Channel(event) => event.to_midi_bytes(),
            Self::Meta(event) => event.to_midi_bytes(),
            Self::SysEx(event) => event.to_midi_bytes(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(event) => event.fmt(f),
            Self::Meta(event) => event.fmt(f),
            Self::SysEx(event) => event.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EventKind, TrackEvent};
    use crate::{
        event::{channel::ChannelEvent, channel::ChannelMessage, meta::MetaEvent},
        writer::MidiWriteable,
    };

    #[test]
    fn track_event_prefixes_delta_as_vlq() {
        let kind = EventKind::Channel(
            ChannelEvent::new(0, ChannelMessage::NoteOn { key: 0x40, velocity: 0x64 }).unwrap(),
        );
        let event = TrackEvent::new(192, kind);

        assert_eq!(event.to_midi_bytes(), vec![0x81, 0x40, 0x90, 0x40, 0x64]);
    }

    #[test]
    fn end_of_track_detection() {
        let eot = EventKind::Meta(MetaEvent::EndOfTrack);
        assert!(eot.is_end_of_track());

        let tempo = EventKind::Meta(MetaEvent::Tempo(500_000));
        assert!(!tempo.is_end_of_track());
    }

    #[test]
    fn display_includes_delta() {
        let event = TrackEvent::new(10, EventKind::Meta(MetaEvent::EndOfTrack));
        assert_eq!(event.to_string(), "+10 EndOfTrack");
    }
}
