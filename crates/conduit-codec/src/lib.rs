//! The byte-to-message framework (spec component B): holds a cumulation
//! buffer plus a stateful [`Decoder`], repeatedly invoking it as bytes
//! arrive and surfacing left-over bytes as an error when the decoder is
//! torn down mid-frame.

use conduit_bytes::ByteBuffer;
use thiserror::Error;

/// What a single `decode` call produced.
#[derive(Debug)]
pub enum DecodeOutcome<Item> {
    /// The cumulation buffer doesn't yet hold a full frame; preserve it and
    /// wait for more bytes.
    NeedMoreData,
    Produced(Item),
}

/// A stateful decoder over a cumulation buffer. Implementors consume bytes
/// from `buf` (via `read_bytes`/`skip`) only once they're sure a complete
/// frame is present -- `decode` must never leave the buffer in a state that
/// loses bytes on a `NeedMoreData` return.
pub trait Decoder {
    type Item;
    type Error: std::error::Error + Send + Sync + 'static;

    fn decode(&mut self, buf: &mut ByteBuffer) -> Result<DecodeOutcome<Self::Item>, Self::Error>;

    /// Called once more on teardown. `seen_eof` is `true` when the channel
    /// went inactive (the remote end closed), `false` when the handler was
    /// merely removed from a still-open pipeline. The default forwards to
    /// `decode` -- most decoders have nothing extra to do at end-of-stream.
    fn decode_last(
        &mut self,
        buf: &mut ByteBuffer,
        seen_eof: bool,
    ) -> Result<DecodeOutcome<Self::Item>, Self::Error> {
        let _ = seen_eof;
        self.decode(buf)
    }
}

/// Raised when a decoder is torn down (handler removal, or channel
/// inactive) with bytes still sitting unconsumed in the cumulation buffer.
/// Advisory, not a protocol violation by itself -- see spec.md §7.
#[derive(Debug, Error)]
#[error("{} byte(s) left over in the cumulation buffer on teardown", residue.len())]
pub struct LeftOverBytesError {
    pub residue: Vec<u8>,
}

/// Drives a [`Decoder`] over an accumulating byte stream.
pub struct ByteToMessageDecoder<D: Decoder> {
    cumulation: ByteBuffer,
    decoder: D,
}

impl<D: Decoder> ByteToMessageDecoder<D> {
    pub fn new(decoder: D) -> Self {
        Self { cumulation: ByteBuffer::new(), decoder }
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn decoder_mut(&mut self) -> &mut D {
        &mut self.decoder
    }

    /// Appends an inbound chunk and decodes every frame it completes.
    pub fn channel_read(&mut self, chunk: &[u8]) -> Result<Vec<D::Item>, D::Error> {
        self.cumulation.write_bytes(chunk);
        let mut produced = Vec::new();
        loop {
            match self.decoder.decode(&mut self.cumulation)? {
                DecodeOutcome::Produced(item) => produced.push(item),
                DecodeOutcome::NeedMoreData => break,
            }
        }
        self.cumulation.discard_read_if_beneficial();
        Ok(produced)
    }

    /// Channel went inactive (remote closed). Drains whatever `decode_last`
    /// can still produce, then surfaces any remaining bytes as
    /// [`LeftOverBytesError`] rather than silently dropping them.
    pub fn channel_inactive(
        &mut self,
    ) -> Result<(Vec<D::Item>, Option<LeftOverBytesError>), D::Error> {
        self.drain_on_teardown(true)
    }

    /// Handler removed from a pipeline that's still active.
    pub fn handler_removed(
        &mut self,
    ) -> Result<(Vec<D::Item>, Option<LeftOverBytesError>), D::Error> {
        self.drain_on_teardown(false)
    }

    fn drain_on_teardown(
        &mut self,
        seen_eof: bool,
    ) -> Result<(Vec<D::Item>, Option<LeftOverBytesError>), D::Error> {
        let mut produced = Vec::new();
        loop {
            match self.decoder.decode_last(&mut self.cumulation, seen_eof)? {
                DecodeOutcome::Produced(item) => produced.push(item),
                DecodeOutcome::NeedMoreData => break,
            }
        }
        let residue = self.cumulation.take_residue();
        let left_over = if residue.is_empty() { None } else { Some(LeftOverBytesError { residue }) };
        Ok((produced, left_over))
    }
}
