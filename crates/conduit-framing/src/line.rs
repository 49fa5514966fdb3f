use conduit_bytes::ByteBuffer;
use conduit_codec::{DecodeOutcome, Decoder};

use crate::{error::FramingError, find_byte};

/// Splits the stream on `\n`, stripping a trailing `\r` when present.
#[derive(Default)]
pub struct LineBasedFrameDecoder;

impl LineBasedFrameDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for LineBasedFrameDecoder {
    type Item = Vec<u8>;
    type Error = FramingError;

    fn decode(&mut self, buf: &mut ByteBuffer) -> Result<DecodeOutcome<Vec<u8>>, FramingError> {
        let Some(newline_offset) = find_byte(buf.readable_slice(), b'\n') else {
            return Ok(DecodeOutcome::NeedMoreData);
        };
        let mut line = buf.read_bytes(newline_offset).unwrap().to_vec();
        buf.skip(1); // the '\n' terminator itself
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(DecodeOutcome::Produced(line))
    }
}
