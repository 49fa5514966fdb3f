use conduit_bytes::ByteBuffer;
use conduit_codec::{DecodeOutcome, Decoder};

use crate::error::FramingError;

/// Splits the stream into frames of exactly `frame_length` bytes each.
pub struct FixedLengthFrameDecoder {
    frame_length: usize,
}

impl FixedLengthFrameDecoder {
    /// # Panics
    /// Panics if `frame_length` is 0 -- a zero-length fixed frame decoder
    /// can never make progress.
    pub fn new(frame_length: usize) -> Self {
        assert!(frame_length >= 1, "frame_length must be at least 1");
        Self { frame_length }
    }
}

impl Decoder for FixedLengthFrameDecoder {
    type Item = Vec<u8>;
    type Error = FramingError;

    fn decode(&mut self, buf: &mut ByteBuffer) -> Result<DecodeOutcome<Vec<u8>>, FramingError> {
        if buf.readable_bytes() < self.frame_length {
            return Ok(DecodeOutcome::NeedMoreData);
        }
        let frame = buf.read_bytes(self.frame_length).unwrap().to_vec();
        Ok(DecodeOutcome::Produced(frame))
    }
}
