use conduit_pipeline::{PipelineError, Promise};
use flate2::Compression;

use crate::error::CompressionError;
use crate::head::{CompressDecision, ResponseHead};
use crate::qvalue::negotiate;
use crate::stream::Compressor;
use crate::Algorithm;

/// Caller hook consulted once negotiation, status-exclusion, and header
/// normalization have all run; lets the caller veto or force compression
/// for a specific response (e.g. a content type the caller knows doesn't
/// compress well).
pub trait CompressPredicate {
    fn decide(&mut self, head: &ResponseHead, negotiated: Algorithm) -> CompressDecision;
}

impl<F: FnMut(&ResponseHead, Algorithm) -> CompressDecision> CompressPredicate for F {
    fn decide(&mut self, head: &ResponseHead, negotiated: Algorithm) -> CompressDecision {
        self(head, negotiated)
    }
}

struct AlwaysCompress;
impl CompressPredicate for AlwaysCompress {
    fn decide(&mut self, _head: &ResponseHead, _negotiated: Algorithm) -> CompressDecision {
        CompressDecision::Compress
    }
}

/// Per-connection outbound compressor (spec component G, response side).
/// Reads the negotiated algorithm off the inbound `Accept-Encoding`
/// (`on_request_head`), then rewrites and compresses the matching outbound
/// response.
///
/// Two body-write shapes, per spec.md §4.G: a single `Content-Length`
/// write (the caller already has the whole body -- `compress_full_body`)
/// keeps `Content-Length`, rewritten to the compressed length; a body
/// split across more than one write (`on_response_head` +
/// `compress_chunk`/`finish`) switches to `Transfer-Encoding: chunked`
/// since the compressed length isn't known until the last chunk lands.
pub struct ResponseCompressor<P: CompressPredicate = AlwaysCompress> {
    negotiated: Option<Algorithm>,
    level: Compression,
    predicate: P,
    active: Option<Compressor>,
    pending_writes: Vec<Promise<()>>,
}

impl ResponseCompressor<AlwaysCompress> {
    pub fn new(level: Compression) -> Self {
        Self { negotiated: None, level, predicate: AlwaysCompress, active: None, pending_writes: Vec::new() }
    }
}

impl<P: CompressPredicate> ResponseCompressor<P> {
    pub fn with_predicate(level: Compression, predicate: P) -> Self {
        Self { negotiated: None, level, predicate, active: None, pending_writes: Vec::new() }
    }

    /// Parses the inbound request's `Accept-Encoding` and stores the
    /// negotiated algorithm as per-connection state for the matching
    /// response.
    pub fn on_request_head(&mut self, accept_encoding: Option<&str>) {
        self.negotiated = accept_encoding.and_then(negotiate);
    }

    /// Decides whether `head`'s body should be compressed, consulting
    /// negotiation, status-exclusion, and the predicate hook in that order.
    /// Returns the negotiated algorithm once all three have cleared it,
    /// else `None` (and resets `self.active`, since neither caller-facing
    /// entry point below should compress this response).
    fn negotiate_for(&mut self, head: &ResponseHead) -> Option<Algorithm> {
        let negotiated = self.negotiated?;
        if !head.permits_body() {
            return None;
        }
        if self.predicate.decide(head, negotiated) == CompressDecision::PassThrough {
            return None;
        }
        Some(negotiated)
    }

    /// Rewrites `head` in place for a body that will arrive split across
    /// more than one write (`compress_chunk` called more than once, or
    /// followed by `finish`): the compressed length isn't known until the
    /// last chunk lands, so framing switches to `Transfer-Encoding:
    /// chunked` and any `Content-Length` is stripped. Returns whether the
    /// body that follows should be compressed.
    pub fn on_response_head(&mut self, head: &mut ResponseHead) -> bool {
        let Some(negotiated) = self.negotiate_for(head) else {
            self.active = None;
            return false;
        };

        head.remove_header("content-length");
        head.set_header("transfer-encoding", "chunked");
        head.set_header("content-encoding", content_encoding_name(negotiated));
        self.active = Some(Compressor::new(negotiated, self.level));
        true
    }

    /// Compresses one body chunk of a split (chunked) response, flushing
    /// per-chunk so the first chunk isn't held hostage behind a later one.
    pub fn compress_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let Some(compressor) = &mut self.active else {
            return Ok(chunk.to_vec());
        };
        compressor.compress(chunk)
    }

    /// Finalizes a split (chunked) response's compressed stream at `end`.
    pub fn finish(&mut self) -> Result<Vec<u8>, CompressionError> {
        let Some(compressor) = self.active.take() else {
            return Ok(Vec::new());
        };
        compressor.finish()
    }

    /// Compresses a response whose entire body is already available -- a
    /// single `Content-Length` write, per spec.md §4.G. Rewrites `head`'s
    /// `Content-Length` to the compressed length instead of switching to
    /// chunked framing, and returns the complete compressed body in one
    /// shot. Mutually exclusive with the `on_response_head` streaming path:
    /// use this when the caller isn't going to call `compress_chunk`.
    pub fn compress_full_body(
        &mut self,
        head: &mut ResponseHead,
        body: &[u8],
    ) -> Result<Vec<u8>, CompressionError> {
        let Some(negotiated) = self.negotiate_for(head) else {
            self.active = None;
            return Ok(body.to_vec());
        };

        let mut compressor = Compressor::new(negotiated, self.level);
        let mut compressed = compressor.compress(body)?;
        compressed.extend(compressor.finish()?);

        head.set_header("content-length", compressed.len().to_string());
        head.remove_header("transfer-encoding");
        head.set_header("content-encoding", content_encoding_name(negotiated));
        self.active = None;
        Ok(compressed)
    }

    /// Tracks a write's completion promise so it can be failed in bulk if
    /// the handler is removed mid-compression.
    pub fn track_pending_write(&mut self, promise: Promise<()>) {
        self.pending_writes.push(promise);
    }

    /// Fails every write still pending with `uncompressedWritesPending`,
    /// per spec.md §4.G. Called from the handler's removal hook.
    pub fn fail_pending_writes(&mut self) {
        for promise in self.pending_writes.drain(..) {
            promise.fail(PipelineError::from(CompressionError::UncompressedWritesPending));
        }
    }
}

fn content_encoding_name(algorithm: Algorithm) -> &'static str {
    match algorithm {
        Algorithm::Gzip => "gzip",
        Algorithm::Deflate => "deflate",
    }
}
