//! Meta Event Structs and Parsing. Meta events are framed as `0xFF`, a
//! one-byte meta-type tag, a VLQ-declared length, then the payload.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    event::FieldError,
    reader::{MidiStream, ParseError},
    vlq,
    writer::MidiWriteable,
};

/// A meta level event
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MetaEvent {
    /// Sequence Number, tag 0x00
    SequenceNumber(u16),
    /// Text metadata, tag 0x01
    Text(String),
    /// Copyright, tag 0x02
    Copyright(String),
    /// Sequence or track name, tag 0x03
    SequenceTrackName(String),
    /// Instrument name, tag 0x04
    Instrument(String),
    /// Lyric, tag 0x05
    Lyric(String),
    /// Marker, tag 0x06
    Marker(String),
    /// Cue Point, tag 0x07
    CuePoint(String),
    /// Program name, tag 0x08
    ProgramName(String),
    /// Device name, tag 0x09
    DeviceName(String),
    /// Midi Channel Prefix, tag 0x20
    ChannelPrefix(u8),
    /// Midi output port, tag 0x21
    MidiPort(u8),
    /// End of Track Identifier, tag 0x2F
    EndOfTrack,
    /// Tempo in microseconds per quarter note (24 bits), tag 0x51
    Tempo(u32),
    /// Smpte Offset, tag 0x54
    SmpteOffset(SmpteOffset),
    /// Time signature, tag 0x58
    TimeSignature(TimeSignature),
    /// Key Signature, tag 0x59
    KeySignature(KeySignature),
    /// Sequencer-proprietary payload, tag 0x7F
    Proprietary(Vec<u8>),
    /// An unrecognized meta event, preserved verbatim
    Unknown {
        /// The original meta-type byte
        tag: u8,
        /// The raw payload
        data: Vec<u8>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
/// A key signature
pub struct KeySignature {
    /// Count of sharps (positive) or flats (negative), -7..=7
    sharps_flats: i8,
    /// True for a minor tonality
    minor: bool,
}

impl KeySignature {
    /// Creates a key signature, rejecting more than 7 sharps or flats
    pub fn new(sharps_flats: i8, minor: bool) -> Result<Self, FieldError> {
        if !(-7..=7).contains(&sharps_flats) {
            return Err(FieldError::KeySignature(sharps_flats));
        }

        Ok(Self {
            sharps_flats,
            minor,
        })
    }

    /// Count of sharps (positive) or flats (negative)
    pub fn sharps_flats(&self) -> i8 {
        self.sharps_flats
    }

    /// True for a minor tonality
    pub fn minor(&self) -> bool {
        self.minor
    }
}

impl MidiWriteable for KeySignature {
    fn to_midi_bytes(self) -> Vec<u8> {
        let mut bytes = self.sharps_flats.to_midi_bytes();
        bytes.push(u8::from(self.minor));

        bytes
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
/// An SMPTE Offset
pub struct SmpteOffset {
    /// Hours of offset
    pub hours: u8,
    /// Minutes of offset
    pub minutes: u8,
    /// Seconds of offset
    pub seconds: u8,
    /// Frames of offset
    pub frames: u8,
    /// Subframes of offset
    pub subframes: u8,
}

impl MidiWriteable for SmpteOffset {
    fn to_midi_bytes(self) -> Vec<u8> {
        let SmpteOffset {
            hours,
            minutes,
            seconds,
            frames,
            subframes,
        } = self;
        vec![hours, minutes, seconds, frames, subframes]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
/// A Time Signature
pub struct TimeSignature {
    /// The time signature's numerator
    pub numerator: u8,
    /// The denominator, stored as its power-of-two exponent exactly as on the
    /// wire (2 means a denominator of 4)
    pub denominator: u8,
    /// MIDI clocks per metronome click
    pub clocks_per_click: u8,
    /// Thirty second notes per quarter note
    pub thirty_seconds_per_quarter: u8,
}

impl TimeSignature {
    /// The denominator as an actual note value
    pub fn denominator_value(&self) -> u32 {
        1u32 << self.denominator
    }
}

impl MidiWriteable for TimeSignature {
    fn to_midi_bytes(self) -> Vec<u8> {
        let TimeSignature {
            numerator,
            denominator,
            clocks_per_click,
            thirty_seconds_per_quarter,
        } = self;
        vec![
            numerator,
            denominator,
            clocks_per_click,
            thirty_seconds_per_quarter,
        ]
    }
}

impl MetaEvent {
    /// Returns the specific event's tag
    pub fn tag(&self) -> u8 {
        match self {
            Self::SequenceNumber(_) => 0x00,
            Self::Text(_) => 0x01,
            Self::Copyright(_) => 0x02,
            Self::SequenceTrackName(_) => 0x03,
            Self::Instrument(_) => 0x04,
            Self::Lyric(_) => 0x05,
            Self::Marker(_) => 0x06,
            Self::CuePoint(_) => 0x07,
            Self::ProgramName(_) => 0x08,
            Self::DeviceName(_) => 0x09,
            Self::ChannelPrefix(_) => 0x20,
            Self::MidiPort(_) => 0x21,
            Self::EndOfTrack => 0x2F,
            Self::Tempo(_) => 0x51,
            Self::SmpteOffset(_) => 0x54,
            Self::TimeSignature(_) => 0x58,
            Self::KeySignature(_) => 0x59,
            Self::Proprietary(_) => 0x7F,
            Self::Unknown { tag, .. } => *tag,
        }
    }

    /// Reads the meta-type tag, declared length and payload. The framing
    /// `0xFF` byte must already have been consumed.
    pub(crate) fn read(stream: &mut MidiStream<'_>) -> Result<Self, ParseError> {
        let tag_offset = stream.position();
        let tag = stream.read_byte()?;
        let length = vlq::decode(stream)?;
        let data_offset = stream.position();
        let data = stream.read_bytes(length as usize)?;

        /// Checks the declared length of a fixed-size meta event
        macro_rules! fixed_len {
            ($len:expr) => {
                if data.len() != $len {
                    return Err(ParseError::new(
                        tag_offset,
                        FieldError::MetaLength { tag, length }.into(),
                    ));
                }
            };
        }

        /// Decodes a VLQ-length text payload into an owned string
        macro_rules! text {
            ($name:expr) => {
                String::from_utf8(data.to_vec())
                    .map($name)
                    .map_err(|e| ParseError::new(data_offset, FieldError::from(e).into()))
            };
        }

        match tag {
            0x00 => {
                fixed_len!(2);
                Ok(Self::SequenceNumber(u16::from_be_bytes([data[0], data[1]])))
            }
            0x01 => text!(Self::Text),
            0x02 => text!(Self::Copyright),
            0x03 => text!(Self::SequenceTrackName),
            0x04 => text!(Self::Instrument),
            0x05 => text!(Self::Lyric),
            0x06 => text!(Self::Marker),
            0x07 => text!(Self::CuePoint),
            0x08 => text!(Self::ProgramName),
            0x09 => text!(Self::DeviceName),

            0x20 => {
                fixed_len!(1);
                Ok(Self::ChannelPrefix(data[0]))
            }
            0x21 => {
                fixed_len!(1);
                Ok(Self::MidiPort(data[0]))
            }
            0x2F => {
                fixed_len!(0);
                Ok(Self::EndOfTrack)
            }

            0x51 => {
                fixed_len!(3);
                Ok(Self::Tempo(
                    (u32::from(data[0]) << 16) | (u32::from(data[1]) << 8) | u32::from(data[2]),
                ))
            }
            0x54 => {
                fixed_len!(5);
                Ok(Self::SmpteOffset(SmpteOffset {
                    hours: data[0],
                    minutes: data[1],
                    seconds: data[2],
                    frames: data[3],
                    subframes: data[4],
                }))
            }
            0x58 => {
                fixed_len!(4);
                Ok(Self::TimeSignature(TimeSignature {
                    numerator: data[0],
                    denominator: data[1],
                    clocks_per_click: data[2],
                    thirty_seconds_per_quarter: data[3],
                }))
            }
            0x59 => {
                fixed_len!(2);
                KeySignature::new(data[0] as i8, data[1] != 0)
                    .map(Self::KeySignature)
                    .map_err(|e| ParseError::new(data_offset, e.into()))
            }

            0x7F => Ok(Self::Proprietary(data.to_vec())),

            _ => Ok(Self::Unknown {
                tag,
                data: data.to_vec(),
            }),
        }
    }
}

impl MidiWriteable for MetaEvent {
    fn to_midi_bytes(self) -> Vec<u8> {
        let tag_byte = self.tag();
        let mut bytes = vec![0xFF, tag_byte];

        let payload_bytes = match self {
            Self::SequenceNumber(val) => val.to_midi_bytes(),
            Self::Text(val)
            | Self::Copyright(val)
            | Self::SequenceTrackName(val)
            | Self::Instrument(val)
            | Self::Lyric(val)
            | Self::Marker(val)
            | Self::CuePoint(val)
            | Self::ProgramName(val)
            | Self::DeviceName(val) => val.to_midi_bytes(),
            Self::ChannelPrefix(val) | Self::MidiPort(val) => val.to_midi_bytes(),
            Self::EndOfTrack => vec![],
            // Only the low 24 bits are representable
            Self::Tempo(val) => vec![(val >> 16) as u8, (val >> 8) as u8, val as u8],
            Self::SmpteOffset(val) => val.to_midi_bytes(),
            Self::TimeSignature(val) => val.to_midi_bytes(),
            Self::KeySignature(val) => val.to_midi_bytes(),
            Self::Proprietary(val) => val,
            Self::Unknown { data, .. } => data,
        };

        bytes.extend(vlq::encode(payload_bytes.len() as u32).iter());
        bytes.extend(payload_bytes.iter());

        bytes
    }
}

impl fmt::Display for MetaEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SequenceNumber(n) => write!(f, "SequenceNumber {n}"),
            Self::Text(text) => write!(f, "Text {text:?}"),
            Self::Copyright(text) => write!(f, "Copyright {text:?}"),
            Self::SequenceTrackName(text) => write!(f, "SequenceTrackName {text:?}"),
            Self::Instrument(text) => write!(f, "Instrument {text:?}"),
            Self::Lyric(text) => write!(f, "Lyric {text:?}"),
            Self::Marker(text) => write!(f, "Marker {text:?}"),
            Self::CuePoint(text) => write!(f, "CuePoint {text:?}"),
            Self::ProgramName(text) => write!(f, "ProgramName {text:?}"),
            Self::DeviceName(text) => write!(f, "DeviceName {text:?}"),
            Self::ChannelPrefix(ch) => write!(f, "ChannelPrefix {ch}"),
            Self::MidiPort(port) => write!(f, "MidiPort {port}"),
            Self::EndOfTrack => write!(f, "EndOfTrack"),
            Self::Tempo(us) => write!(f, "Tempo {us} us per quarter note"),
            Self::SmpteOffset(offset) => write!(
                f,
                "SmpteOffset {:02}:{:02}:{:02} frame {}.{}",
                offset.hours, offset.minutes, offset.seconds, offset.frames, offset.subframes
            ),
            Self::TimeSignature(sig) => write!(
                f,
                "TimeSignature {}/{} clocks={} 32nds={}",
                sig.numerator,
                sig.denominator_value(),
                sig.clocks_per_click,
                sig.thirty_seconds_per_quarter
            ),
            Self::KeySignature(key) => {
                let accidentals = match key.sharps_flats {
                    n if n > 0 => format!("{n} sharps"),
                    0 => "no accidentals".to_string(),
                    n => format!("{} flats", -n),
                };
                let tonality = if key.minor { "minor" } else { "major" };
                write!(f, "KeySignature {accidentals} {tonality}")
            }
            Self::Proprietary(data) => write!(f, "Proprietary {} byte(s)", data.len()),
            Self::Unknown { tag, data } => {
                write!(f, "UnknownMeta {tag:#04x} {} byte(s)", data.len())
            }
        }
    }
}
