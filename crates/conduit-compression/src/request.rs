use flate2::Compression;

use crate::error::CompressionError;
use crate::head::RequestHead;
use crate::stream::Compressor;
use crate::Algorithm;

/// Outbound request compressor, configured with a fixed algorithm rather
/// than negotiated (there's no peer `Accept-Encoding` to negotiate against
/// on the request side). Injects `Content-Encoding` on the head and
/// streams the body through zlib.
///
/// Per the Open Question resolution in this crate's design notes: the
/// stream finalizes only on an explicit `end` call, never implicitly on
/// drop or on an empty write, and intermediate flushes use a sync flush
/// rather than a finish -- a caller that drops the compressor mid-body
/// without calling `end` gets a truncated (but not corrupted) stream, not
/// a silently double-finalized one.
pub struct RequestCompressor {
    algorithm: Algorithm,
    level: Compression,
    compressor: Option<Compressor>,
}

impl RequestCompressor {
    pub fn new(algorithm: Algorithm, level: Compression) -> Self {
        Self { algorithm, level, compressor: None }
    }

    pub fn on_request_head(&mut self, head: &mut RequestHead) {
        head.set_header(
            "content-encoding",
            match self.algorithm {
                Algorithm::Gzip => "gzip",
                Algorithm::Deflate => "deflate",
            },
        );
        self.compressor = Some(Compressor::new(self.algorithm, self.level));
    }

    pub fn compress_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CompressionError> {
        match &mut self.compressor {
            Some(compressor) => compressor.compress(chunk),
            None => Ok(chunk.to_vec()),
        }
    }

    /// Explicit end-of-body signal. Finalizes the zlib stream (trailer,
    /// checksum) and returns whatever final bytes it produces.
    pub fn end(&mut self) -> Result<Vec<u8>, CompressionError> {
        match self.compressor.take() {
            Some(compressor) => compressor.finish(),
            None => Ok(Vec::new()),
        }
    }
}
