//! The top-level sequence model: a format code, a division value and an
//! ordered list of tracks, together with whole-file import/export and the
//! structural transformations

use std::path::Path;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    chunk::{
        header::{Format, HeaderChunk},
        track::TrackChunk,
    },
    event::{parser, FieldError},
    reader::{MidiReadable, MidiStream, ParseError, ParseErrorKind},
    writer::MidiWriteable,
};

pub mod track;
pub mod transform;

pub use self::track::Track;
pub use self::transform::ConvertOptions;

/// Absolute offset of the track count field within a MIDI file
const NTRKS_OFFSET: usize = 10;

/// A structural rule of the sequence model was violated
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum StructureError {
    /// A second track was added to a format 0 sequence
    #[error("format 0 sequences hold exactly one track")]
    FormatZeroTrackLimit,
    /// A track requiring a terminal marker was written without one
    #[error("track does not end with an end-of-track marker")]
    MissingEndOfTrack,
    /// An event carried a delta-time past the encodable range
    #[error("delta-time exceeds the 28-bit encodable range")]
    DeltaOutOfRange,
    /// A sequence with zero tracks was exported
    #[error("sequence has no tracks to export")]
    NoTracks,
}

/// Failure while loading a sequence from a file
#[derive(Debug, Error)]
pub enum ImportError {
    /// The file could not be read
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The bytes could not be decoded
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Failure while saving a sequence to a file
#[derive(Debug, Error)]
pub enum ExportError {
    /// The file could not be written
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The sequence could not be encoded
    #[error(transparent)]
    Structure(#[from] StructureError),
}

/// A whole MIDI sequence: format, division and tracks in file order.
///
/// A sequence exclusively owns its tracks and each track exclusively owns
/// its events; all operations are synchronous and single-threaded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sequence {
    /// The file format code
    format: Format,
    /// The raw division field, stored verbatim
    division: u16,
    /// The tracks in file order
    tracks: Vec<Track>,
}

impl Sequence {
    /// Creates an empty sequence, validating that the division is at least 1
    pub fn new(format: Format, division: u16) -> Result<Self, FieldError> {
        if division == 0 {
            return Err(FieldError::Division);
        }

        Ok(Self {
            format,
            division,
            tracks: Vec::new(),
        })
    }

    /// The file format code
    pub fn format(&self) -> Format {
        self.format
    }

    /// The raw division field
    pub fn division(&self) -> u16 {
        self.division
    }

    /// The tracks in file order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Mutable access to the tracks
    pub fn tracks_mut(&mut self) -> &mut [Track] {
        &mut self.tracks
    }

    /// Number of tracks
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Appends a track, rejecting a second track on a format 0 sequence
    pub fn push_track(&mut self, track: Track) -> Result<(), StructureError> {
        if self.format == Format::Zero && !self.tracks.is_empty() {
            return Err(StructureError::FormatZeroTrackLimit);
        }
        self.tracks.push(track);

        Ok(())
    }

    /// Removes and returns the track at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds
    pub fn remove_track(&mut self, index: usize) -> Track {
        self.tracks.remove(index)
    }

    /// Decodes a whole MIDI file: the header chunk, then exactly the declared
    /// number of track chunks, each payload run through the event parser.
    ///
    /// All-or-nothing: no partial sequence is returned on failure, and every
    /// error reports its file-absolute byte offset.
    pub fn import(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut stream = MidiStream::new(bytes);
        let header = HeaderChunk::read(&mut stream)?;

        if header.format() == Format::Zero && header.ntrks() != 1 {
            return Err(ParseError::new(
                NTRKS_OFFSET,
                ParseErrorKind::MalformedHeader("format 0 declares more than one track"),
            ));
        }

        let mut tracks = Vec::with_capacity(usize::from(header.ntrks()));
        for _ in 0..header.ntrks() {
            let chunk = TrackChunk::read(&mut stream)?;
            let payload_start = stream.position() - chunk.data().len();
            let events =
                parser::parse_track(chunk.data()).map_err(|e| e.rebase(payload_start))?;
            tracks.push(Track::from_events(events));
        }

        Ok(Self {
            format: header.format(),
            division: header.division(),
            tracks,
        })
    }

    /// Encodes the whole sequence: the header chunk followed by each track in
    /// append order. Fails if the sequence holds no tracks or any track lacks
    /// a required terminal marker.
    pub fn export(&self) -> Result<Vec<u8>, StructureError> {
        if self.tracks.is_empty() {
            return Err(StructureError::NoTracks);
        }

        let header =
            HeaderChunk::from_parts(self.format, self.tracks.len() as u16, self.division);
        let mut bytes = header.to_midi_bytes();
        for track in &self.tracks {
            bytes.extend(track.write()?);
        }

        Ok(bytes)
    }

    /// Reads and decodes a MIDI file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ImportError> {
        let bytes = path.as_ref().get_midi_bytes()?;
        Ok(Self::import(&bytes)?)
    }

    /// Encodes and writes the sequence to disk
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ExportError> {
        let bytes = self.export()?;
        std::fs::write(path, bytes)?;

        Ok(())
    }
}
