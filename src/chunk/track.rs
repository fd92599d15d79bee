//! Track chunk reading and writing. A track chunk is the `MTrk` tag, a
//! 32-bit payload length, then that many raw bytes of encoded events; event
//! decoding itself lives in [`crate::event::parser`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    chunk::chunk_types::TRACK_DATA_CHUNK,
    reader::{MidiStream, ParseError, ParseErrorKind},
    writer::MidiWriteable,
    Chunk,
};

/// A raw track chunk: the undecoded event stream of one track
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackChunk {
    /// The encoded event stream
    data: Vec<u8>,
}

impl TrackChunk {
    /// Wraps an already-encoded event stream
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// The raw encoded event bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Reads an `MTrk` chunk: tag, a positive length, then exactly that many
    /// payload bytes
    pub fn read(stream: &mut MidiStream<'_>) -> Result<Self, ParseError> {
        let chunk = Chunk::read(stream)?;
        if chunk.chunk_type != TRACK_DATA_CHUNK {
            return Err(stream.error(ParseErrorKind::MalformedHeader(
                "expected an MTrk tag",
            )));
        }
        if chunk.is_empty() {
            return Err(stream.error(ParseErrorKind::MalformedHeader(
                "MTrk length must be positive",
            )));
        }

        let data = stream.read_bytes(chunk.len())?.to_vec();

        Ok(Self { data })
    }
}

impl MidiWriteable for TrackChunk {
    fn to_midi_bytes(self) -> Vec<u8> {
        let mut bytes = Chunk::new(TRACK_DATA_CHUNK, self.data.len() as u32).to_midi_bytes();
        bytes.extend(self.data.iter());

        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::TrackChunk;
    use crate::{
        reader::{MidiStream, ParseErrorKind},
        writer::MidiWriteable,
    };

    #[test]
    fn track_chunk_round_trips() {
        let payload = vec![0x00, 0xFF, 0x2F, 0x00];
        let chunk = TrackChunk::new(payload.clone());
        let bytes = chunk.clone().to_midi_bytes();
        assert_eq!(&bytes[..8], &[b'M', b'T', b'r', b'k', 0, 0, 0, 4]);
        assert_eq!(&bytes[8..], payload.as_slice());

        let mut stream = MidiStream::new(&bytes);
        assert_eq!(TrackChunk::read(&mut stream).unwrap(), chunk);
    }

    #[test]
    fn zero_length_track_is_rejected() {
        let bytes = [b'M', b'T', b'r', b'k', 0, 0, 0, 0];
        let mut stream = MidiStream::new(&bytes);

        let err = TrackChunk::read(&mut stream).unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::MalformedHeader(_)));
    }

    #[test]
    fn short_payload_is_truncation() {
        let bytes = [b'M', b'T', b'r', b'k', 0, 0, 0, 4, 0x00, 0xFF];
        let mut stream = MidiStream::new(&bytes);

        let err = TrackChunk::read(&mut stream).unwrap_err();
        assert_eq!(
            err.kind(),
            &ParseErrorKind::StreamTruncated { wanted: 4 }
        );
    }
}
