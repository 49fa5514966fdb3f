use conduit_bytes::{ByteBuffer, Endianness};
use conduit_codec::{DecodeOutcome, Decoder};
use serde::{Deserialize, Serialize};

use crate::error::FramingError;

/// Plain data a caller's own configuration layer can serialize --
/// constructors here take bare parameters (no config-file loader lives in
/// this crate), but the value itself is a natural thing for a caller to
/// persist or pass over the wire alongside other connection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthFieldConfig {
    pub length_field_length: usize,
    pub endianness: Endianness,
}

/// Largest payload length representable in `width` bytes, clamped to
/// `i32::MAX` -- the safety ceiling spec.md's data model imposes regardless
/// of how wide the configured length field is.
pub fn max_representable(width: usize) -> u64 {
    let bits = (width * 8) as u32;
    let raw_max = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
    raw_max.min(i32::MAX as u64)
}

fn validate_width(width: usize) {
    assert!(
        matches!(width, 1 | 2 | 3 | 4 | 8),
        "length field width must be one of 1, 2, 3, 4, 8 bytes, got {width}"
    );
}

/// Decodes `length(endianness, width bytes) ++ payload` frames.
pub struct LengthFieldBasedFrameDecoder {
    length_field_length: usize,
    endianness: Endianness,
}

impl LengthFieldBasedFrameDecoder {
    pub fn new(length_field_length: usize, endianness: Endianness) -> Self {
        validate_width(length_field_length);
        Self { length_field_length, endianness }
    }

    pub fn from_config(config: LengthFieldConfig) -> Self {
        Self::new(config.length_field_length, config.endianness)
    }
}

impl Decoder for LengthFieldBasedFrameDecoder {
    type Item = Vec<u8>;
    type Error = FramingError;

    fn decode(&mut self, buf: &mut ByteBuffer) -> Result<DecodeOutcome<Vec<u8>>, FramingError> {
        if buf.readable_bytes() < self.length_field_length {
            return Ok(DecodeOutcome::NeedMoreData);
        }
        let length = buf.peek_uint(self.length_field_length, self.endianness).unwrap();
        if length > i32::MAX as u64 {
            return Err(FramingError::LengthFieldOverflow(length));
        }
        let payload_len = length as usize;
        if buf.readable_bytes() < self.length_field_length + payload_len {
            return Ok(DecodeOutcome::NeedMoreData);
        }
        buf.skip(self.length_field_length);
        let frame = buf.read_bytes(payload_len).unwrap().to_vec();
        Ok(DecodeOutcome::Produced(frame))
    }
}

/// Encoder side: prepends each outbound payload's byte length in the
/// configured field width.
pub struct LengthFieldPrepender {
    length_field_length: usize,
    endianness: Endianness,
}

impl LengthFieldPrepender {
    pub fn new(length_field_length: usize, endianness: Endianness) -> Self {
        validate_width(length_field_length);
        Self { length_field_length, endianness }
    }

    pub fn from_config(config: LengthFieldConfig) -> Self {
        Self::new(config.length_field_length, config.endianness)
    }

    /// Encodes `payload`, failing rather than writing a truncated length if
    /// the payload doesn't fit in the configured field.
    pub fn encode(&self, payload: &[u8]) -> Result<Vec<u8>, FramingError> {
        if payload.len() as u64 > max_representable(self.length_field_length) {
            return Err(FramingError::MessageDataTooLongForLengthField(
                payload.len(),
                self.length_field_length,
            ));
        }
        let mut out = ByteBuffer::new();
        out.write_uint(payload.len() as u64, self.length_field_length, self.endianness);
        out.write_bytes(payload);
        Ok(out.readable_slice().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_codec::ByteToMessageDecoder;

    #[test]
    fn round_trips_through_a_deserialized_config() {
        let json = r#"{"length_field_length":4,"endianness":"Big"}"#;
        let config: LengthFieldConfig = serde_json::from_str(json).unwrap();
        let prepender = LengthFieldPrepender::from_config(config);
        let wire = prepender.encode(b"payload").unwrap();

        let mut decoder = ByteToMessageDecoder::new(LengthFieldBasedFrameDecoder::from_config(config));
        assert_eq!(decoder.channel_read(&wire).unwrap(), vec![b"payload".to_vec()]);
    }

    #[test]
    fn round_trips_every_supported_width() {
        for &width in &[1usize, 2, 3, 4, 8] {
            for &endianness in &[Endianness::Big, Endianness::Little] {
                let prepender = LengthFieldPrepender::new(width, endianness);
                let payload = b"hello frame";
                let wire = prepender.encode(payload).unwrap();

                let mut decoder =
                    ByteToMessageDecoder::new(LengthFieldBasedFrameDecoder::new(width, endianness));
                let frames = decoder.channel_read(&wire).unwrap();
                assert_eq!(frames, vec![payload.to_vec()]);
            }
        }
    }

    #[test]
    fn split_header_then_drip_fed_payload() {
        let mut decoder =
            ByteToMessageDecoder::new(LengthFieldBasedFrameDecoder::new(2, Endianness::Little));
        assert!(decoder.channel_read(&[0x05]).unwrap().is_empty());
        assert!(decoder.channel_read(&[0x00]).unwrap().is_empty());
        let mut frames = Vec::new();
        for byte in b"abcde" {
            frames.extend(decoder.channel_read(&[*byte]).unwrap());
        }
        assert_eq!(frames, vec![b"abcde".to_vec()]);
    }

    #[test]
    fn zero_length_field_yields_an_empty_frame() {
        let mut decoder =
            ByteToMessageDecoder::new(LengthFieldBasedFrameDecoder::new(1, Endianness::Big));
        let frames = decoder.channel_read(&[0x00]).unwrap();
        assert_eq!(frames, vec![Vec::<u8>::new()]);
    }

    #[test]
    fn prepender_rejects_payload_too_long_for_a_one_byte_field() {
        let prepender = LengthFieldPrepender::new(1, Endianness::Big);
        let payload = vec![0u8; 300];
        let err = prepender.encode(&payload).unwrap_err();
        assert!(matches!(err, FramingError::MessageDataTooLongForLengthField(300, 1)));
    }

    #[test]
    fn decoder_rejects_length_values_above_i32_max() {
        let mut decoder =
            ByteToMessageDecoder::new(LengthFieldBasedFrameDecoder::new(4, Endianness::Big));
        let mut header = ByteBuffer::new();
        header.write_u32(u32::MAX, Endianness::Big);
        let err = decoder.channel_read(header.readable_slice()).unwrap_err();
        assert!(matches!(err, FramingError::LengthFieldOverflow(_)));
    }

    #[test]
    fn removal_mid_frame_surfaces_left_over_bytes() {
        let mut decoder =
            ByteToMessageDecoder::new(LengthFieldBasedFrameDecoder::new(2, Endianness::Big));
        decoder.channel_read(&[0x00, 0x05, b'a', b'b']).unwrap();
        let (frames, left_over) = decoder.handler_removed().unwrap();
        assert!(frames.is_empty());
        assert_eq!(left_over.unwrap().residue, b"ab".to_vec());
    }
}
