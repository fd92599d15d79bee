//! # segno
//!
//! A standard MIDI file codec built around an explicit in-memory model:
//! chunks, typed track events, and whole sequences, with the transformations
//! that need whole-structure reasoning (format conversion, trimming,
//! transposition) layered on top.
//!
//! ## Overview
//!
//! MIDI files are structured as a series of chunks. Each chunk carries a
//! 4-character ASCII type identifier and a 32-bit length specifying how many
//! bytes of data follow. The file header chunk (`MThd`) describes the file
//! format, track count and time division; each track chunk (`MTrk`) holds a
//! stream of delta-timed events encoded with running status and
//! variable-length quantities. This crate parses that whole container into a
//! [`sequence::Sequence`] of [`sequence::Track`]s of typed
//! [`event::TrackEvent`]s, and writes the same model back out byte-for-byte.
//!
//! - **Typed events**: the closed [`event::EventKind`] sum type covers every
//!   channel voice message, the standard meta events, and system-exclusive
//!   payloads, with field ranges enforced at construction time.
//! - **Located errors**: every parse failure carries the byte offset at which
//!   it occurred, and importing is all-or-nothing.
//! - **Structural transforms**: [`sequence::Sequence`] supports merging
//!   multi-track files down to format 0, trimming to a time limit, and
//!   transposition, all operating purely on the in-memory model.
//!
//! ## Example Usage
//!
//! ```rust
//! use segno::{
//!     chunk::header::Format,
//!     event::{meta::MetaEvent, EventKind, TrackEvent},
//!     sequence::{Sequence, Track},
//! };
//!
//! // Build a one-track sequence by hand and serialize it.
//! let mut sequence = Sequence::new(Format::Zero, 96).unwrap();
//! let mut track = Track::new();
//! track.push(TrackEvent::new(0, EventKind::Meta(MetaEvent::EndOfTrack)));
//! sequence.push_track(track).unwrap();
//!
//! let bytes = sequence.export().unwrap();
//!
//! // And read it straight back.
//! let reread = Sequence::import(&bytes).unwrap();
//! assert_eq!(sequence, reread);
//! ```
//!
//! ## Library Structure
//!
//! - **[`chunk`]**: the specialized header (`MThd`) and track (`MTrk`) chunks
//!   along with the recognized chunk type tags.
//! - **[`event`]**: the typed event model, its binary encoding rules, and the
//!   track payload parser with its running-status state machine.
//! - **[`sequence`]**: the top-level [`sequence::Sequence`]/[`sequence::Track`]
//!   model, import/export, and the structural transforms.
//! - **[`reader`] / [`writer`]**: the byte-stream seams, a position-tracking
//!   cursor with located errors and the [`writer::MidiWriteable`] encoding
//!   trait.
//! - **[`vlq`]**: the 7-bit variable-length quantity codec used for
//!   delta-times and declared lengths.

pub mod chunk;
pub mod event;
pub mod reader;
pub mod sequence;
pub mod vlq;
pub mod writer;

use crate::reader::{MidiStream, ParseError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Represents a raw MIDI Chunk header.
/// A MIDI Chunk consists of a 4-character ASCII type identifier and a 32-bit
/// unsigned integer specifying the length of its data.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Chunk {
    /// 4 character ASCII chunk type
    pub chunk_type: [char; 4],
    /// Length of the data that follows
    length: u32,
}

impl Chunk {
    /// Creates a chunk header from a tag and data length
    pub fn new(chunk_type: [char; 4], length: u32) -> Self {
        Self { chunk_type, length }
    }

    /// Consumes 4 tag bytes and a 4-byte big-endian length from the stream
    pub fn read(stream: &mut MidiStream<'_>) -> Result<Self, ParseError> {
        let tag = stream.read_bytes(4)?;
        let chunk_type = [
            tag[0] as char,
            tag[1] as char,
            tag[2] as char,
            tag[3] as char,
        ];
        let length = stream.read_u32()?;

        Ok(Self { chunk_type, length })
    }

    /// Gets the length of the chunk as a usize
    pub fn len(&self) -> usize {
        self.length as usize
    }

    /// Returns if the chunk has no attributed data
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

#[cfg(test)]
mod tests {
    use crate::{reader::MidiStream, writer::MidiWriteable, Chunk};

    #[test]
    fn chunk_round_trips_through_bytes() {
        let chunk = Chunk::new(['t', 'e', 's', 't'], 10);
        let bytes = chunk.to_midi_bytes();
        assert_eq!(bytes, vec![b't', b'e', b's', b't', 0, 0, 0, 10]);

        let mut stream = MidiStream::new(&bytes);
        let reread = Chunk::read(&mut stream).expect("Read chunk header back");
        assert_eq!(reread, chunk);
    }

    #[test]
    fn truncated_chunk_header_is_rejected() {
        let bytes = [b'M', b'T', b'h', b'd', 0, 0];
        let mut stream = MidiStream::new(&bytes);

        assert!(Chunk::read(&mut stream).is_err());
    }
}
