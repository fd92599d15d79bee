//! The track payload parser: turns one track chunk's raw bytes into an
//! ordered list of typed events, maintaining running-status and
//! system-exclusive continuation state across iterations

use crate::{
    event::{
        channel::ChannelEvent, meta::MetaEvent, sysex::SysExEvent, EventKind, TrackEvent,
    },
    reader::{MidiStream, ParseError, ParseErrorKind},
    vlq,
};

/// The sysex end-of-message marker
const SYSEX_END: u8 = 0xF7;

/// Parses a whole track payload into its typed events.
///
/// Every failure carries the byte offset (relative to the payload start) that
/// was active at the time. Multi-segment system-exclusive data is combined
/// into a single event carrying the delta-time of its first segment.
pub fn parse_track(payload: &[u8]) -> Result<Vec<TrackEvent>, ParseError> {
    let mut stream = MidiStream::new(payload);
    let mut events = Vec::new();
    // Last seen voice status byte; cleared by meta and sysex records
    let mut running_status: Option<u8> = None;
    // Delta-time of the first segment plus the accumulated partial payload
    // of a system-exclusive message still awaiting its end marker
    let mut pending_sysex: Option<(u32, Vec<u8>)> = None;

    while !stream.is_empty() {
        let delta_time = vlq::decode(&mut stream)?;
        let status_offset = stream.position();

        let status = match stream.peek_byte() {
            // High bit set: a new status byte, consumed here
            Some(byte) if byte & 0x80 != 0 => {
                stream.read_byte()?;
                byte
            }
            // High bit clear: running status reuses the previous status byte
            // and leaves this byte to be read as data
            Some(_) => running_status.ok_or_else(|| {
                ParseError::new(status_offset, ParseErrorKind::RunningStatusWithoutContext)
            })?,
            None => {
                return Err(stream.error(ParseErrorKind::StreamTruncated { wanted: 1 }));
            }
        };

        if pending_sysex.is_some() && status != SYSEX_END {
            return Err(ParseError::new(
                status_offset,
                ParseErrorKind::ExpectedContinuationMarker,
            ));
        }

        match status >> 4 {
            0x8..=0xE => {
                running_status = Some(status);
                let event = ChannelEvent::read(status, &mut stream)?;
                events.push(TrackEvent::new(delta_time, EventKind::Channel(event)));
            }
            _ => match status {
                0xFF => {
                    running_status = None;
                    let meta = MetaEvent::read(&mut stream)?;
                    events.push(TrackEvent::new(delta_time, EventKind::Meta(meta)));
                }
                0xF0 => {
                    running_status = None;
                    let length = vlq::decode(&mut stream)?;
                    let data = stream.read_bytes(length as usize)?;

                    if data.last() == Some(&SYSEX_END) {
                        let event = SysExEvent::new(data[..data.len() - 1].to_vec());
                        events.push(TrackEvent::new(delta_time, EventKind::SysEx(event)));
                    } else {
                        pending_sysex = Some((delta_time, data.to_vec()));
                    }
                }
                0xF7 => {
                    running_status = None;
                    let length = vlq::decode(&mut stream)?;
                    let data = stream.read_bytes(length as usize)?;

                    let (first_delta, mut buffer) =
                        pending_sysex.take().unwrap_or((delta_time, Vec::new()));
                    buffer.extend_from_slice(data);

                    if buffer.last() == Some(&SYSEX_END) {
                        buffer.pop();
                        let event = SysExEvent::new(buffer);
                        events.push(TrackEvent::new(first_delta, EventKind::SysEx(event)));
                    } else {
                        pending_sysex = Some((first_delta, buffer));
                    }
                }
                other => {
                    return Err(ParseError::new(
                        status_offset,
                        ParseErrorKind::UnrecognizedStatusByte(other),
                    ));
                }
            },
        }
    }

    // The payload ended while sysex continuation data was still pending
    if pending_sysex.is_some() {
        return Err(stream.error(ParseErrorKind::StreamTruncated { wanted: 1 }));
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::parse_track;
    use crate::{
        event::{
            channel::{ChannelEvent, ChannelMessage},
            meta::MetaEvent,
            sysex::SysExEvent,
            EventKind, TrackEvent,
        },
        reader::ParseErrorKind,
    };

    /// Shorthand for a delta-timed NoteOn event
    fn note_on(delta: u32, channel: u8, key: u8, velocity: u8) -> TrackEvent {
        TrackEvent::new(
            delta,
            EventKind::Channel(
                ChannelEvent::new(channel, ChannelMessage::NoteOn { key, velocity }).unwrap(),
            ),
        )
    }

    #[test]
    fn running_status_reuses_the_previous_status() {
        // Second event omits its status byte entirely
        let payload = [0x00, 0x90, 0x40, 0x64, 0x10, 0x41, 0x70];
        let events = parse_track(&payload).unwrap();

        assert_eq!(
            events,
            vec![note_on(0, 0, 0x40, 0x64), note_on(0x10, 0, 0x41, 0x70)]
        );
    }

    #[test]
    fn data_byte_without_any_status_fails() {
        let payload = [0x00, 0x40, 0x64];
        let err = parse_track(&payload).unwrap_err();

        assert_eq!(err.offset(), 1);
        assert_eq!(err.kind(), &ParseErrorKind::RunningStatusWithoutContext);
    }

    #[test]
    fn meta_clears_running_status() {
        // NoteOn, then a marker meta event, then a bare data byte
        let payload = [
            0x00, 0x90, 0x40, 0x64, 0x00, 0xFF, 0x06, 0x01, b'x', 0x00, 0x41, 0x70,
        ];
        let err = parse_track(&payload).unwrap_err();

        assert_eq!(err.kind(), &ParseErrorKind::RunningStatusWithoutContext);
    }

    #[test]
    fn mixed_track_parses_in_order() {
        let payload = [
            0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // tempo
            0x00, 0xC0, 0x05, // program change
            0x60, 0x90, 0x40, 0x64, // note on
            0x60, 0x80, 0x40, 0x00, // note off
            0x00, 0xFF, 0x2F, 0x00, // end of track
        ];
        let events = parse_track(&payload).unwrap();

        assert_eq!(events.len(), 5);
        assert_eq!(
            events[0].kind(),
            &EventKind::Meta(MetaEvent::Tempo(500_000))
        );
        assert_eq!(events[1].delta_time(), 0);
        assert_eq!(events[2].delta_time(), 0x60);
        assert!(events[4].kind().is_end_of_track());
    }

    #[test]
    fn single_segment_sysex_drops_the_end_marker() {
        let payload = [0x00, 0xF0, 0x03, 0x43, 0x12, 0xF7];
        let events = parse_track(&payload).unwrap();

        assert_eq!(
            events,
            vec![TrackEvent::new(
                0,
                EventKind::SysEx(SysExEvent::new(vec![0x43, 0x12]))
            )]
        );
    }

    #[test]
    fn split_sysex_combines_into_one_event() {
        // An 0xF0 record without the end marker, continued by an 0xF7 record
        let payload = [
            0x05, 0xF0, 0x02, 0x43, 0x12, // first segment, no end marker
            0x20, 0xF7, 0x03, 0x00, 0x7F, 0xF7, // continuation completing it
        ];
        let events = parse_track(&payload).unwrap();

        // One combined event, carrying the first segment's delta-time
        assert_eq!(
            events,
            vec![TrackEvent::new(
                5,
                EventKind::SysEx(SysExEvent::new(vec![0x43, 0x12, 0x00, 0x7F]))
            )]
        );
    }

    #[test]
    fn pending_sysex_rejects_other_records() {
        let payload = [
            0x00, 0xF0, 0x02, 0x43, 0x12, // pending sysex
            0x00, 0xFF, 0x2F, 0x00, // meta instead of a continuation
        ];
        let err = parse_track(&payload).unwrap_err();

        assert_eq!(err.offset(), 6);
        assert_eq!(err.kind(), &ParseErrorKind::ExpectedContinuationMarker);
    }

    #[test]
    fn bare_continuation_record_parses_alone() {
        let payload = [0x00, 0xF7, 0x03, 0x01, 0x02, 0xF7];
        let events = parse_track(&payload).unwrap();

        assert_eq!(
            events,
            vec![TrackEvent::new(
                0,
                EventKind::SysEx(SysExEvent::new(vec![0x01, 0x02]))
            )]
        );
    }

    #[test]
    fn payload_ending_mid_continuation_is_truncation() {
        let payload = [0x00, 0xF0, 0x02, 0x43, 0x12];
        let err = parse_track(&payload).unwrap_err();

        assert!(matches!(
            err.kind(),
            ParseErrorKind::StreamTruncated { .. }
        ));
    }

    #[test]
    fn unrecognized_status_byte_reports_its_offset() {
        let payload = [0x00, 0xF8, 0x00];
        let err = parse_track(&payload).unwrap_err();

        assert_eq!(err.offset(), 1);
        assert_eq!(err.kind(), &ParseErrorKind::UnrecognizedStatusByte(0xF8));
    }

    #[test]
    fn truncated_voice_event_reports_truncation() {
        let payload = [0x00, 0x90, 0x40];
        let err = parse_track(&payload).unwrap_err();

        assert!(matches!(
            err.kind(),
            ParseErrorKind::StreamTruncated { .. }
        ));
    }

    #[test]
    fn empty_payload_yields_no_events() {
        assert_eq!(parse_track(&[]).unwrap(), vec![]);
    }
}
