//! Channel voice events: the 0x8-0xE status family carrying a channel and
//! one or two 7-bit data parameters

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    event::FieldError,
    reader::{MidiStream, ParseError},
    writer::MidiWriteable,
};

/// The channel reserved for percussion by General MIDI
pub const PERCUSSION_CHANNEL: u8 = 9;

/// Highest legal channel index
const CHANNEL_MAX: u8 = 0x0F;
/// Highest legal 7-bit data value
const DATA_MAX: u8 = 0x7F;
/// Highest legal 14-bit pitch wheel position
const PITCH_WHEEL_MAX: u16 = 0x3FFF;

/// A channel voice event: a channel in 0..=15 plus the message payload.
///
/// Construction and mutation validate every field range; out-of-range values
/// are rejected, never clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelEvent {
    /// The channel this event addresses
    channel: u8,
    /// The voice message and its data parameters
    message: ChannelMessage,
}

/// The data payload of a channel voice event
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChannelMessage {
    /// A note released, status nibble 0x8
    NoteOff {
        /// The note number
        key: u8,
        /// Release velocity
        velocity: u8,
    },
    /// A note depressed, status nibble 0x9
    NoteOn {
        /// The note number
        key: u8,
        /// Attack velocity
        velocity: u8,
    },
    /// Polyphonic key pressure, status nibble 0xA
    Aftertouch {
        /// The note number
        key: u8,
        /// Pressure amount
        pressure: u8,
    },
    /// A controller value change, status nibble 0xB
    Controller {
        /// The controller number
        controller: u8,
        /// The new controller value
        value: u8,
    },
    /// A patch number change, status nibble 0xC
    ProgramChange {
        /// The new program number
        program: u8,
    },
    /// Channel-wide key pressure, status nibble 0xD
    ChannelPressure {
        /// Pressure amount
        pressure: u8,
    },
    /// A pitch wheel move, status nibble 0xE, measured as a 14-bit value
    PitchWheel {
        /// The wheel position, 0x2000 centered
        value: u16,
    },
}

impl ChannelMessage {
    /// The high nibble of the status byte this message encodes to
    pub fn status_nibble(&self) -> u8 {
        match self {
            Self::NoteOff { .. } => 0x8,
            Self::NoteOn { .. } => 0x9,
            Self::Aftertouch { .. } => 0xA,
            Self::Controller { .. } => 0xB,
            Self::ProgramChange { .. } => 0xC,
            Self::ChannelPressure { .. } => 0xD,
            Self::PitchWheel { .. } => 0xE,
        }
    }

    /// The one or two data bytes this message encodes to, in wire order
    fn data(&self) -> (u8, Option<u8>) {
        match *self {
            Self::NoteOff { key, velocity } | Self::NoteOn { key, velocity } => {
                (key, Some(velocity))
            }
            Self::Aftertouch { key, pressure } => (key, Some(pressure)),
            Self::Controller { controller, value } => (controller, Some(value)),
            Self::ProgramChange { program } => (program, None),
            Self::ChannelPressure { pressure } => (pressure, None),
            // The 14-bit position splits into least-significant-first halves
            Self::PitchWheel { value } => ((value & 0x7F) as u8, Some((value >> 7) as u8)),
        }
    }

    /// Checks every data parameter against its 7-bit (or 14-bit) range
    fn validate(&self) -> Result<(), FieldError> {
        /// Rejects a single out-of-range 7-bit value
        fn seven_bit(value: u8) -> Result<(), FieldError> {
            if value > DATA_MAX {
                Err(FieldError::DataByte(value))
            } else {
                Ok(())
            }
        }

        match *self {
            Self::NoteOff { key, velocity } | Self::NoteOn { key, velocity } => {
                seven_bit(key)?;
                seven_bit(velocity)
            }
            Self::Aftertouch { key, pressure } => {
                seven_bit(key)?;
                seven_bit(pressure)
            }
            Self::Controller { controller, value } => {
                seven_bit(controller)?;
                seven_bit(value)
            }
            Self::ProgramChange { program } => seven_bit(program),
            Self::ChannelPressure { pressure } => seven_bit(pressure),
            Self::PitchWheel { value } => {
                if value > PITCH_WHEEL_MAX {
                    Err(FieldError::PitchWheel(value))
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl ChannelEvent {
    /// Creates a channel event, rejecting any out-of-range field
    pub fn new(channel: u8, message: ChannelMessage) -> Result<Self, FieldError> {
        if channel > CHANNEL_MAX {
            return Err(FieldError::Channel(channel));
        }
        message.validate()?;

        Ok(Self { channel, message })
    }

    /// The channel this event addresses
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Moves the event to another channel, rejecting channels above 15
    pub fn set_channel(&mut self, channel: u8) -> Result<(), FieldError> {
        if channel > CHANNEL_MAX {
            return Err(FieldError::Channel(channel));
        }
        self.channel = channel;
        Ok(())
    }

    /// Overwrites the channel with a value the caller has already checked
    /// against the 0..=15 range
    pub(crate) fn force_channel(&mut self, channel: u8) {
        debug_assert!(channel <= CHANNEL_MAX);
        self.channel = channel;
    }

    /// The voice message payload
    pub fn message(&self) -> &ChannelMessage {
        &self.message
    }

    /// The note number, for the note-carrying variants
    pub fn key(&self) -> Option<u8> {
        match self.message {
            ChannelMessage::NoteOff { key, .. }
            | ChannelMessage::NoteOn { key, .. }
            | ChannelMessage::Aftertouch { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Shifts the note number by `steps`, wrapping modulo 128. Variants that
    /// carry no note are left untouched.
    pub(crate) fn transpose_key(&mut self, steps: i32) {
        if let ChannelMessage::NoteOff { key, .. }
        | ChannelMessage::NoteOn { key, .. }
        | ChannelMessage::Aftertouch { key, .. } = &mut self.message
        {
            *key = (i64::from(*key) + i64::from(steps)).rem_euclid(128) as u8;
        }
    }

    /// The status byte this event encodes to
    pub fn status(&self) -> u8 {
        (self.message.status_nibble() << 4) | self.channel
    }

    /// The packed 24-bit form a playback sink consumes:
    /// `status | data1 << 8 | data2 << 16`
    pub fn packed(&self) -> u32 {
        let (data1, data2) = self.message.data();
        u32::from(self.status())
            | u32::from(data1) << 8
            | u32::from(data2.unwrap_or(0)) << 16
    }

    /// Reads the data bytes following an already-consumed status byte
    pub(crate) fn read(status: u8, stream: &mut MidiStream<'_>) -> Result<Self, ParseError> {
        let channel = status & CHANNEL_MAX;
        let data_offset = stream.position();

        let message = match status >> 4 {
            0x8 => {
                let key = stream.read_byte()?;
                let velocity = stream.read_byte()?;
                ChannelMessage::NoteOff { key, velocity }
            }
            0x9 => {
                let key = stream.read_byte()?;
                let velocity = stream.read_byte()?;
                ChannelMessage::NoteOn { key, velocity }
            }
            0xA => {
                let key = stream.read_byte()?;
                let pressure = stream.read_byte()?;
                ChannelMessage::Aftertouch { key, pressure }
            }
            0xB => {
                let controller = stream.read_byte()?;
                let value = stream.read_byte()?;
                ChannelMessage::Controller { controller, value }
            }
            0xC => {
                let program = stream.read_byte()?;
                ChannelMessage::ProgramChange { program }
            }
            0xD => {
                let pressure = stream.read_byte()?;
                ChannelMessage::ChannelPressure { pressure }
            }
            // 0xE: the two bytes are the low and high halves of a 14-bit
            // value, least significant first
            _ => {
                let lower = stream.read_byte()?;
                let upper = stream.read_byte()?;
                ChannelMessage::PitchWheel {
                    value: (u16::from(upper) << 7) | u16::from(lower),
                }
            }
        };

        ChannelEvent::new(channel, message)
            .map_err(|e| ParseError::new(data_offset, e.into()))
    }
}

impl MidiWriteable for ChannelEvent {
    fn to_midi_bytes(self) -> Vec<u8> {
        let mut bytes = vec![self.status()];
        let (data1, data2) = self.message.data();
        bytes.push(data1);
        if let Some(data2) = data2 {
            bytes.push(data2);
        }

        bytes
    }
}

impl fmt::Display for ChannelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ch = self.channel;
        match self.message {
            ChannelMessage::NoteOff { key, velocity } => {
                write!(f, "NoteOff ch{ch} key={key} vel={velocity}")
            }
            ChannelMessage::NoteOn { key, velocity } => {
                write!(f, "NoteOn ch{ch} key={key} vel={velocity}")
            }
            ChannelMessage::Aftertouch { key, pressure } => {
                write!(f, "Aftertouch ch{ch} key={key} pressure={pressure}")
            }
            ChannelMessage::Controller { controller, value } => {
                write!(f, "Controller ch{ch} number={controller} value={value}")
            }
            ChannelMessage::ProgramChange { program } => {
                write!(f, "ProgramChange ch{ch} program={program}")
            }
            ChannelMessage::ChannelPressure { pressure } => {
                write!(f, "ChannelPressure ch{ch} pressure={pressure}")
            }
            ChannelMessage::PitchWheel { value } => {
                write!(f, "PitchWheel ch{ch} value={value}")
            }
        }
    }
}
