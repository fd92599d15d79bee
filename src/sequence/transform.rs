//! Whole-structure transformations: transposition, time trimming and format
//! conversion. All three operate purely on the in-memory model; the trick
//! they share is moving between delta-times and cumulative absolute times.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    chunk::header::Format,
    event::{
        channel::PERCUSSION_CHANNEL,
        meta::MetaEvent,
        EventKind, TrackEvent,
    },
    sequence::{Sequence, Track},
};

/// Options for [`Sequence::convert_format`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConvertOptions {
    /// When merging tracks down to format 0, overwrite each channel voice
    /// event's channel with its source track index (for track indexes that
    /// fit a channel)
    pub copy_track_to_channel: bool,
}

impl Sequence {
    /// Shifts every note-carrying voice event (NoteOn, NoteOff, Aftertouch)
    /// by `steps` semitones, wrapping modulo 128.
    ///
    /// Events on the percussion channel (9) are skipped unless
    /// `include_percussion` is set. Extreme `steps` values wrap rather than
    /// fail; that is the documented behavior, not an error.
    pub fn transpose(&mut self, steps: i32, include_percussion: bool) {
        for track in &mut self.tracks {
            for event in track.events_mut() {
                if let EventKind::Channel(channel_event) = event.kind_mut() {
                    if channel_event.channel() == PERCUSSION_CHANNEL && !include_percussion {
                        continue;
                    }
                    channel_event.transpose_key(steps);
                }
            }
        }
    }

    /// Copies every event whose absolute time is strictly below `limit` into
    /// a new sequence with the same format and division.
    ///
    /// Events are copied by value; the source sequence is left untouched.
    /// Each new track that does not already end with an end-of-track marker
    /// gets one appended with delta-time 0.
    pub fn trim(&self, limit: u64) -> Sequence {
        let mut trimmed = Sequence {
            format: self.format,
            division: self.division,
            tracks: Vec::with_capacity(self.tracks.len()),
        };

        for track in &self.tracks {
            let mut copied = Vec::new();
            let mut absolute: u64 = 0;

            for event in track.events() {
                absolute += u64::from(event.delta_time());
                if absolute >= limit {
                    break;
                }
                copied.push(event.clone());
            }

            let mut new_track = Track::from_events(copied);
            new_track.set_require_end_marker(track.require_end_marker());
            if !new_track.has_end_marker() {
                new_track.push(TrackEvent::new(0, EventKind::Meta(MetaEvent::EndOfTrack)));
            }
            trimmed.tracks.push(new_track);
        }

        trimmed
    }

    /// Converts the sequence to `target` format, consuming it.
    ///
    /// Converting to the current format returns the sequence unchanged.
    /// Any conversion that does not require moving events (target is not
    /// format 0, or there is at most one track) only relabels the format
    /// field. Converting multiple tracks to format 0 merges every track's
    /// events into one, ordered by absolute time with ties preserving the
    /// original track-then-event order, and ends the merged track with
    /// exactly one end-of-track marker.
    pub fn convert_format(self, target: Format, options: ConvertOptions) -> Sequence {
        if target == self.format {
            return self;
        }

        if target != Format::Zero || self.tracks.len() <= 1 {
            let mut relabeled = self;
            relabeled.format = target;
            return relabeled;
        }

        let division = self.division;
        let mut combined: Vec<(u64, TrackEvent)> = Vec::new();

        for (index, track) in self.tracks.into_iter().enumerate() {
            let mut absolute: u64 = 0;

            for mut event in track.into_events() {
                absolute += u64::from(event.delta_time());
                if event.kind().is_end_of_track() {
                    continue;
                }

                if options.copy_track_to_channel && index <= 0x0F {
                    if let EventKind::Channel(channel_event) = event.kind_mut() {
                        channel_event.force_channel(index as u8);
                    }
                }

                combined.push((absolute, event));
            }
        }

        // Stable sort: simultaneous events keep their original relative
        // order, so a ProgramChange stays ahead of the NoteOn it precedes
        combined.sort_by_key(|(absolute, _)| *absolute);

        let mut events = Vec::with_capacity(combined.len() + 1);
        let mut previous: u64 = 0;
        for (absolute, mut event) in combined {
            event.set_delta_time((absolute - previous) as u32);
            previous = absolute;
            events.push(event);
        }
        events.push(TrackEvent::new(0, EventKind::Meta(MetaEvent::EndOfTrack)));

        Sequence {
            format: Format::Zero,
            division,
            tracks: vec![Track::from_events(events)],
        }
    }
}
