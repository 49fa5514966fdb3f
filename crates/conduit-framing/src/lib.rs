//! Frame codecs (spec component C): fixed-length, length-field-prefixed,
//! line-delimited, and the JSON-RPC-style `Content-Length` header framer.
//! Decoders plug into `conduit_codec::ByteToMessageDecoder`; encoders are
//! plain functions, since prepending a header to an outbound payload needs
//! no cumulation state.

mod content_length;
mod error;
mod fixed;
mod length_field;
mod line;

pub use conduit_bytes::Endianness;
pub use content_length::{ContentLengthDecoder, content_length_encode};
pub use error::FramingError;
pub use fixed::FixedLengthFrameDecoder;
pub use length_field::{LengthFieldBasedFrameDecoder, LengthFieldConfig, LengthFieldPrepender, max_representable};
pub use line::LineBasedFrameDecoder;

pub(crate) fn find_byte(slice: &[u8], target: u8) -> Option<usize> {
    slice.iter().position(|&b| b == target)
}
