//! Variable-length quantity codec. Delta-times and several declared lengths
//! are stored as 7 bits per byte, most significant group first, with the high
//! bit of every byte except the last set as a continuation marker.

use crate::{
    event::FieldError,
    reader::{MidiStream, ParseError},
};

/// Mask selecting the payload bits of a VLQ byte
const MASK: u8 = 0x7F;
/// The continuation bit
const CONTINUE: u8 = 0x80;

/// The largest value a variable-length quantity can carry: four bytes of
/// seven payload bits each
pub const MAX: u32 = 0x0FFF_FFFF;

/// Encodes a value as a variable-length quantity.
///
/// Zero encodes as the single byte `0x00`; the largest 7-bit group always
/// comes first.
pub fn encode(mut value: u32) -> Vec<u8> {
    let mut bytes = Vec::new();

    loop {
        let mut byte = (value & MASK as u32) as u8;
        value >>= 7;

        if !bytes.is_empty() {
            byte |= CONTINUE;
        }

        bytes.push(byte);

        if value == 0 {
            break;
        }
    }

    bytes.reverse();
    bytes
}

/// Decodes a variable-length quantity from the stream, advancing past the
/// terminating byte. Fails with a truncation error if the stream runs out
/// before a byte with a clear continuation bit is found.
///
/// Encoded quantities are capped at 4 bytes (28 payload bits); a fifth
/// continuation byte is rejected as an out-of-range field.
pub fn decode(stream: &mut MidiStream<'_>) -> Result<u32, ParseError> {
    let start = stream.position();
    let mut result: u32 = 0;

    for _ in 0..4 {
        let byte = stream.read_byte()?;
        result = (result << 7) | (byte & MASK) as u32;

        if byte & CONTINUE == 0 {
            return Ok(result);
        }
    }

    Err(ParseError::new(start, FieldError::Vlq.into()))
}

#[cfg(test)]
mod tests {
    use super::{decode, encode};
    use crate::reader::MidiStream;

    fn decode_all(bytes: &[u8]) -> u32 {
        let mut stream = MidiStream::new(bytes);
        decode(&mut stream).expect("Decode VLQ bytes")
    }

    #[test]
    fn boundary_values_encode_exactly() {
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(127), vec![0x7F]);
        assert_eq!(encode(128), vec![0x81, 0x00]);
        assert_eq!(encode(192), vec![0x81, 0x40]);
        assert_eq!(encode(super::MAX), vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn decode_inverts_encode() {
        for value in [0u32, 1, 127, 128, 192, 8192, 0x1F_FFFF, 0x0FFF_FFFF] {
            assert_eq!(decode_all(&encode(value)), value);
        }
    }

    #[test]
    fn decode_stops_after_terminator() {
        let bytes = [0x81, 0x40, 0x55];
        let mut stream = MidiStream::new(&bytes);

        assert_eq!(decode(&mut stream).unwrap(), 192);
        assert_eq!(stream.position(), 2);
    }

    #[test]
    fn endless_continuation_is_truncation() {
        let bytes = [0x81, 0x82, 0x83];
        let mut stream = MidiStream::new(&bytes);

        assert!(decode(&mut stream).is_err());
    }

    #[test]
    fn five_byte_quantity_is_out_of_range() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        let mut stream = MidiStream::new(&bytes);

        let err = decode(&mut stream).unwrap_err();
        assert_eq!(err.offset(), 0);
    }
}
