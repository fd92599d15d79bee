//! Header Chunk Enum and Struct Definitions

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    chunk::chunk_types::HEADER_CHUNK,
    event::FieldError,
    reader::{MidiStream, ParseError, ParseErrorKind},
    writer::MidiWriteable,
    Chunk,
};

/// The fixed payload length of an `MThd` chunk
const HEADER_PAYLOAD_LEN: u32 = 6;

/// Header chunk data, including format, ntrks and division as 3 16 bit
/// unsigned integers
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeaderChunk {
    /// The MIDI format
    format: Format,
    /// Number of tracks
    ntrks: u16,
    /// Time division, stored verbatim. Bit 15 selects between
    /// ticks-per-quarter-note and SMPTE-style timing; the codec never
    /// interprets it, only round-trips it.
    division: u16,
}

impl HeaderChunk {
    /// Creates a header chunk, validating that the track count and division
    /// are at least 1
    pub fn new(format: Format, ntrks: u16, division: u16) -> Result<Self, FieldError> {
        if ntrks == 0 {
            return Err(FieldError::TrackCount);
        }
        if division == 0 {
            return Err(FieldError::Division);
        }

        Ok(Self {
            format,
            ntrks,
            division,
        })
    }

    /// Builds a header from fields already validated by the caller
    pub(crate) fn from_parts(format: Format, ntrks: u16, division: u16) -> Self {
        Self {
            format,
            ntrks,
            division,
        }
    }

    /// The MIDI format code
    pub fn format(&self) -> Format {
        self.format
    }

    /// The declared number of track chunks
    pub fn ntrks(&self) -> u16 {
        self.ntrks
    }

    /// The raw division field
    pub fn division(&self) -> u16 {
        self.division
    }

    /// Reads an `MThd` chunk: tag, fixed length 6, then format, track count
    /// and division as big-endian 16-bit fields
    pub fn read(stream: &mut MidiStream<'_>) -> Result<Self, ParseError> {
        let chunk = Chunk::read(stream)?;
        if chunk.chunk_type != HEADER_CHUNK {
            return Err(stream.error(ParseErrorKind::MalformedHeader(
                "expected an MThd tag",
            )));
        }
        if chunk.len() != HEADER_PAYLOAD_LEN as usize {
            return Err(stream.error(ParseErrorKind::MalformedHeader(
                "MThd length must be 6",
            )));
        }

        let format_offset = stream.position();
        let format = Format::try_from(stream.read_u16()?)
            .map_err(|e| ParseError::new(format_offset, e.into()))?;

        let ntrks_offset = stream.position();
        let ntrks = stream.read_u16()?;
        if ntrks == 0 {
            return Err(ParseError::new(
                ntrks_offset,
                FieldError::TrackCount.into(),
            ));
        }

        let division_offset = stream.position();
        let division = stream.read_u16()?;
        if division == 0 {
            return Err(ParseError::new(
                division_offset,
                FieldError::Division.into(),
            ));
        }

        Ok(Self {
            format,
            ntrks,
            division,
        })
    }
}

impl MidiWriteable for HeaderChunk {
    fn to_midi_bytes(self) -> Vec<u8> {
        let mut bytes = Chunk::new(HEADER_CHUNK, HEADER_PAYLOAD_LEN).to_midi_bytes();
        bytes.extend(self.format.to_midi_bytes().iter());
        bytes.extend(self.ntrks.to_midi_bytes().iter());
        bytes.extend(self.division.to_midi_bytes().iter());

        bytes
    }
}

/// The overall organization of the MIDI file. Only three values are valid,
/// making most of the 16 bits irrelevant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Format {
    /// The file contains a single multi-channel track
    Zero,
    /// The file contains one or more simultaneous tracks (or MIDI outputs) of
    /// a sequence
    One,
    /// The file contains one or more sequentially independent single-track
    /// patterns
    Two,
}

impl MidiWriteable for Format {
    fn to_midi_bytes(self) -> Vec<u8> {
        vec![
            0,
            match self {
                Format::Zero => 0,
                Format::One => 1,
                Format::Two => 2,
            },
        ]
    }
}

impl TryFrom<u16> for Format {
    type Error = FieldError;
    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Format::Zero),
            1 => Ok(Format::One),
            2 => Ok(Format::Two),
            _ => Err(FieldError::Format(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Format, HeaderChunk};
    use crate::{
        event::FieldError,
        reader::{MidiStream, ParseErrorKind},
        writer::MidiWriteable,
    };

    #[test]
    fn header_chunk_round_trips() {
        let header = HeaderChunk::new(Format::One, 10, 384).unwrap();
        let bytes = header.to_midi_bytes();
        assert_eq!(
            bytes,
            vec![b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 1, 0, 10, 1, 128]
        );

        let mut stream = MidiStream::new(&bytes);
        let reread = HeaderChunk::read(&mut stream).expect("Read header chunk back");
        assert_eq!(reread, header);
    }

    #[test]
    fn wrong_tag_is_a_malformed_header() {
        let bytes = [b'M', b'T', b'r', b'k', 0, 0, 0, 6, 0, 1, 0, 1, 0, 96];
        let mut stream = MidiStream::new(&bytes);

        let err = HeaderChunk::read(&mut stream).unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::MalformedHeader(_)));
    }

    #[test]
    fn truncated_payload_is_detected() {
        // Declared length 6 but only 5 payload bytes present
        let bytes = [b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 1, 0, 1, 0];
        let mut stream = MidiStream::new(&bytes);

        let err = HeaderChunk::read(&mut stream).unwrap_err();
        assert!(matches!(
            err.kind(),
            ParseErrorKind::StreamTruncated { .. }
        ));
    }

    #[test]
    fn out_of_range_format_is_rejected() {
        let bytes = [b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 3, 0, 1, 0, 96];
        let mut stream = MidiStream::new(&bytes);

        let err = HeaderChunk::read(&mut stream).unwrap_err();
        assert_eq!(err.offset(), 8);
        assert_eq!(
            err.kind(),
            &ParseErrorKind::InvalidField(FieldError::Format(3))
        );
    }

    #[test]
    fn zero_division_is_rejected() {
        assert_eq!(
            HeaderChunk::new(Format::Zero, 1, 0),
            Err(FieldError::Division)
        );
    }

    #[test]
    fn division_is_round_tripped_verbatim() {
        // SMPTE-style division (bit 15 set) passes through untouched
        let smpte = 0xE8E8u16;
        let header = HeaderChunk::new(Format::Two, 3, smpte).unwrap();
        let bytes = header.to_midi_bytes();

        let mut stream = MidiStream::new(&bytes);
        let reread = HeaderChunk::read(&mut stream).unwrap();
        assert_eq!(reread.division(), smpte);
    }
}
