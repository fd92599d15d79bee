//! A single track: an ordered, mutable list of delta-timed events that
//! serializes to an `MTrk` chunk

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    chunk::track::TrackChunk, event::TrackEvent, sequence::StructureError, vlq,
    writer::MidiWriteable,
};

/// An ordered sequence of events. Storage order is just storage order;
/// temporal order is carried by the cumulative delta-times.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Track {
    /// The events in storage order
    events: Vec<TrackEvent>,
    /// Whether writing this track insists on a trailing end-of-track marker
    require_end_marker: bool,
}

impl Default for Track {
    fn default() -> Self {
        Self::new()
    }
}

impl Track {
    /// Creates an empty track that requires a terminal marker to write
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            require_end_marker: true,
        }
    }

    /// Creates a track holding the given events
    pub fn from_events(events: Vec<TrackEvent>) -> Self {
        Self {
            events,
            require_end_marker: true,
        }
    }

    /// The events in storage order
    pub fn events(&self) -> &[TrackEvent] {
        &self.events
    }

    /// Mutable access to the stored events
    pub fn events_mut(&mut self) -> &mut [TrackEvent] {
        &mut self.events
    }

    /// Consumes the track, yielding its events
    pub fn into_events(self) -> Vec<TrackEvent> {
        self.events
    }

    /// Appends an event
    pub fn push(&mut self, event: TrackEvent) {
        self.events.push(event);
    }

    /// Inserts an event at `index`, shifting later events back
    ///
    /// # Panics
    ///
    /// Panics if `index` is greater than the number of stored events
    pub fn insert(&mut self, index: usize, event: TrackEvent) {
        self.events.insert(index, event);
    }

    /// Removes and returns the event at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds
    pub fn remove(&mut self, index: usize) -> TrackEvent {
        self.events.remove(index)
    }

    /// Number of stored events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when the track holds no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// True iff the last stored event is the end-of-track marker. Computed,
    /// never stored.
    pub fn has_end_marker(&self) -> bool {
        self.events
            .last()
            .is_some_and(|event| event.kind().is_end_of_track())
    }

    /// Whether writing insists on a trailing end-of-track marker
    pub fn require_end_marker(&self) -> bool {
        self.require_end_marker
    }

    /// Overrides the terminal marker requirement
    pub fn set_require_end_marker(&mut self, require: bool) {
        self.require_end_marker = require;
    }

    /// Encodes every event in storage order and wraps the result in an
    /// `MTrk` chunk. Fails when a required terminal marker is missing or any
    /// delta-time exceeds what a variable-length quantity can carry.
    pub fn write(&self) -> Result<Vec<u8>, StructureError> {
        if self.require_end_marker && !self.has_end_marker() {
            return Err(StructureError::MissingEndOfTrack);
        }

        let mut data = Vec::new();
        for event in &self.events {
            if event.delta_time() > vlq::MAX {
                return Err(StructureError::DeltaOutOfRange);
            }
            data.extend(event.clone().to_midi_bytes());
        }

        Ok(TrackChunk::new(data).to_midi_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::Track;
    use crate::{
        event::{meta::MetaEvent, EventKind, TrackEvent},
        sequence::StructureError,
    };

    /// An end-of-track marker with zero delta
    fn end_of_track() -> TrackEvent {
        TrackEvent::new(0, EventKind::Meta(MetaEvent::EndOfTrack))
    }

    #[test]
    fn end_marker_is_computed_from_the_last_event() {
        let mut track = Track::new();
        assert!(!track.has_end_marker());

        track.push(end_of_track());
        assert!(track.has_end_marker());

        track.push(TrackEvent::new(0, EventKind::Meta(MetaEvent::Tempo(500_000))));
        assert!(!track.has_end_marker());
    }

    #[test]
    fn writing_without_a_required_marker_fails() {
        let mut track = Track::new();
        track.push(TrackEvent::new(0, EventKind::Meta(MetaEvent::Tempo(500_000))));

        assert_eq!(track.write(), Err(StructureError::MissingEndOfTrack));
    }

    #[test]
    fn marker_requirement_can_be_waived() {
        let mut track = Track::new();
        track.push(TrackEvent::new(0, EventKind::Meta(MetaEvent::Tempo(500_000))));
        track.set_require_end_marker(false);

        assert!(track.write().is_ok());
    }

    #[test]
    fn oversized_delta_cannot_be_written() {
        let mut track = Track::new();
        track.push(TrackEvent::new(
            0x1000_0000,
            EventKind::Meta(MetaEvent::EndOfTrack),
        ));

        assert_eq!(track.write(), Err(StructureError::DeltaOutOfRange));
    }

    #[test]
    fn write_wraps_events_in_a_track_chunk() {
        let mut track = Track::new();
        track.push(end_of_track());

        let bytes = track.write().unwrap();
        assert_eq!(
            bytes,
            vec![b'M', b'T', b'r', b'k', 0, 0, 0, 4, 0x00, 0xFF, 0x2F, 0x00]
        );
    }
}
