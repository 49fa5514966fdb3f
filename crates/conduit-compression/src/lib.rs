//! HTTP/1 content compression middleware (spec component G): a streaming
//! gzip/deflate request compressor, a response compressor that negotiates
//! via `Accept-Encoding` and q-values, and decompressors bounded by a
//! configurable expansion limit.

mod error;
mod head;
mod qvalue;
mod request;
mod response;
mod stream;

pub use error::CompressionError;
pub use head::{CompressDecision, RequestHead, ResponseHead};
pub use qvalue::negotiate;
pub use request::RequestCompressor;
pub use response::{CompressPredicate, ResponseCompressor};
pub use stream::{Compressor, Decompressor, Limit};

/// The two encodings this workspace negotiates and speaks. `identity` (no
/// compression) is represented as `Option::None` wherever an algorithm
/// selection is returned, rather than as a third variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Gzip,
    Deflate,
}
