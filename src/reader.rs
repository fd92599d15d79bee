//! MIDI byte source seam: a position-tracking cursor over raw bytes, the
//! located [`ParseError`] type every decoding step reports, and the
//! [`MidiReadable`] trait for pulling parseable bytes out of files or
//! in-memory buffers

use std::{convert::Infallible, fs, path::Path};

use thiserror::Error;

use crate::event::FieldError;

/// A parse failure annotated with the byte offset that was active when it
/// occurred
#[derive(Debug, Clone, PartialEq, Error)]
#[error("parse error at byte {offset}: {kind}")]
pub struct ParseError {
    /// Byte offset into the stream being decoded at failure time
    offset: usize,
    /// What went wrong at that offset
    kind: ParseErrorKind,
}

/// The kinds of failure the chunk and event decoding layers can produce
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    /// Wrong magic tag or an impossible declared length on a chunk header
    #[error("malformed chunk header: {0}")]
    MalformedHeader(&'static str),
    /// Fewer bytes were available than a field or declared length requires
    #[error("stream ended before {wanted} byte(s) could be read")]
    StreamTruncated {
        /// Number of bytes the failing read asked for
        wanted: usize,
    },
    /// A data-only byte appeared before any status byte had been seen
    #[error("data byte with no prior status byte to reuse")]
    RunningStatusWithoutContext,
    /// System-exclusive data was pending but the next record was not a 0xF7
    /// continuation
    #[error("expected a 0xF7 continuation record while system-exclusive data was pending")]
    ExpectedContinuationMarker,
    /// A status byte outside the recognized voice/meta/sysex ranges
    #[error("unrecognized status byte {0:#04x}")]
    UnrecognizedStatusByte(u8),
    /// A decoded field landed outside its legal range
    #[error("invalid field value: {0}")]
    InvalidField(#[from] FieldError),
}

impl ParseError {
    /// Creates a parse error from an offset and kind
    pub fn new(offset: usize, kind: ParseErrorKind) -> Self {
        Self { offset, kind }
    }

    /// Returns the byte offset at which the failure occurred
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the kind of failure
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// Shifts the recorded offset by `base` so errors from a nested payload
    /// parse report positions relative to the whole file
    pub(crate) fn rebase(mut self, base: usize) -> Self {
        self.offset += base;
        self
    }
}

/// A position-tracking cursor over a borrowed byte slice.
///
/// Every read either yields the requested bytes or fails with
/// [`ParseErrorKind::StreamTruncated`] at the current offset; a failed read
/// does not advance the cursor.
#[derive(Debug)]
pub struct MidiStream<'a> {
    /// The bytes being decoded
    bytes: &'a [u8],
    /// Offset of the next unread byte
    pos: usize,
}

impl<'a> MidiStream<'a> {
    /// Creates a stream over a byte slice, positioned at its start
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Returns the offset of the next unread byte
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns how many bytes remain unread
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Returns true when every byte has been consumed
    pub fn is_empty(&self) -> bool {
        self.pos == self.bytes.len()
    }

    /// Returns the next byte without consuming it
    pub fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Consumes and returns the next byte
    pub fn read_byte(&mut self) -> Result<u8, ParseError> {
        let byte = self
            .peek_byte()
            .ok_or_else(|| self.truncated(1))?;
        self.pos += 1;
        Ok(byte)
    }

    /// Consumes and returns exactly `n` bytes
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ParseError> {
        if self.remaining() < n {
            return Err(self.truncated(n));
        }
        let span = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(span)
    }

    /// Consumes a big-endian 16-bit field
    pub fn read_u16(&mut self) -> Result<u16, ParseError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Consumes a big-endian 32-bit field
    pub fn read_u32(&mut self) -> Result<u32, ParseError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Builds a located error of the given kind at the current offset
    pub fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.pos, kind)
    }

    /// Builds a truncation error for a read of `wanted` bytes
    fn truncated(&self, wanted: usize) -> ParseError {
        self.error(ParseErrorKind::StreamTruncated { wanted })
    }
}

/// Trait that allows for different types to be translated to a MIDI parseable
/// byte buffer
pub trait MidiReadable {
    /// Error type that may be returned while producing the bytes
    type Error;
    /// Produces the raw MIDI bytes held by the type
    fn get_midi_bytes(self) -> Result<Vec<u8>, Self::Error>;
}

/// Wrapper struct to allow passing `Vec<u8>` to the [`MidiReadable`] trait
pub struct MidiData(Vec<u8>);

impl From<Vec<u8>> for MidiData {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl MidiReadable for MidiData {
    type Error = Infallible;
    fn get_midi_bytes(self) -> Result<Vec<u8>, Self::Error> {
        Ok(self.0)
    }
}

impl<PATH> MidiReadable for PATH
where
    PATH: AsRef<Path>,
{
    type Error = std::io::Error;
    fn get_midi_bytes(self) -> Result<Vec<u8>, Self::Error> {
        fs::read(self.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::{MidiStream, ParseErrorKind};

    #[test]
    fn stream_reads_track_position() {
        let bytes = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05];
        let mut stream = MidiStream::new(&bytes);

        assert_eq!(stream.read_u16().unwrap(), 0x0001);
        assert_eq!(stream.position(), 2);
        assert_eq!(stream.read_u32().unwrap(), 0x0203_0405);
        assert!(stream.is_empty());
    }

    #[test]
    fn short_read_reports_offset_and_does_not_advance() {
        let bytes = [0xAA, 0xBB];
        let mut stream = MidiStream::new(&bytes);
        stream.read_byte().unwrap();

        let err = stream.read_bytes(4).unwrap_err();
        assert_eq!(err.offset(), 1);
        assert_eq!(
            err.kind(),
            &ParseErrorKind::StreamTruncated { wanted: 4 }
        );
        // The failed read must not have consumed the remaining byte
        assert_eq!(stream.read_byte().unwrap(), 0xBB);
    }

    #[test]
    fn peek_does_not_consume() {
        let bytes = [0x90];
        let mut stream = MidiStream::new(&bytes);

        assert_eq!(stream.peek_byte(), Some(0x90));
        assert_eq!(stream.read_byte().unwrap(), 0x90);
        assert_eq!(stream.peek_byte(), None);
    }
}
