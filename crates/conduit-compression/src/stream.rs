use std::io::Write as _;

use flate2::Compression;
use flate2::write::{GzDecoder, GzEncoder, ZlibDecoder, ZlibEncoder};

use crate::error::CompressionError;
use crate::Algorithm;

/// Incremental compressor: feed chunks in, drain compressed output after
/// each, `finish()` once at end-of-stream. Never finalizes on its own --
/// callers decide when `end` has been reached (see `request.rs`'s Open
/// Question resolution for why that matters).
pub struct Compressor {
    inner: Inner,
}

enum Inner {
    Gzip(GzEncoder<Vec<u8>>),
    /// `Algorithm::Deflate` is the zlib-wrapped format (RFC 1950, windowBits
    /// 15) — a zlib header plus an Adler-32 trailer around the raw deflate
    /// stream -- not raw DEFLATE (RFC 1951). `flate2`'s own `Deflate*` types
    /// produce the headerless raw format, so `Zlib*` is the correct pick
    /// here for an RFC-compliant `Content-Encoding: deflate` peer.
    Deflate(ZlibEncoder<Vec<u8>>),
}

impl Compressor {
    pub fn new(algorithm: Algorithm, level: Compression) -> Self {
        let inner = match algorithm {
            Algorithm::Gzip => Inner::Gzip(GzEncoder::new(Vec::new(), level)),
            Algorithm::Deflate => Inner::Deflate(ZlibEncoder::new(Vec::new(), level)),
        };
        Self { inner }
    }

    /// Writes `chunk` into the stream and drains whatever the encoder has
    /// produced so far. A `flush()` between chunks (rather than waiting for
    /// `finish()`) trades a slightly worse compression ratio for not
    /// holding a chunk hostage behind a later one.
    pub fn compress(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CompressionError> {
        match &mut self.inner {
            Inner::Gzip(encoder) => {
                encoder.write_all(chunk)?;
                encoder.flush()?;
                Ok(std::mem::take(encoder.get_mut()))
            }
            Inner::Deflate(encoder) => {
                encoder.write_all(chunk)?;
                encoder.flush()?;
                Ok(std::mem::take(encoder.get_mut()))
            }
        }
    }

    /// Finalizes the stream (trailer/checksum) and returns the last bytes.
    pub fn finish(self) -> Result<Vec<u8>, CompressionError> {
        match self.inner {
            Inner::Gzip(encoder) => Ok(encoder.finish()?),
            Inner::Deflate(encoder) => Ok(encoder.finish()?),
        }
    }
}

/// Bound on decompressed output a `Decompressor` will tolerate before
/// aborting with `LimitExceeded`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Limit {
    None,
    Size(usize),
    /// Output bytes must not exceed `input_bytes_seen * ratio`. Guards
    /// against zip-bomb-style pathological expansion ratios rather than an
    /// absolute size.
    Ratio(f64),
}

impl Limit {
    fn check(&self, input_bytes_seen: usize, output_bytes_so_far: usize) -> Result<(), CompressionError> {
        let within = match self {
            Limit::None => true,
            Limit::Size(max) => output_bytes_so_far <= *max,
            Limit::Ratio(ratio) => {
                (output_bytes_so_far as f64) <= (input_bytes_seen.max(1) as f64) * ratio
            }
        };
        if within {
            Ok(())
        } else {
            tracing::warn!(output_bytes_so_far, input_bytes_seen, "decompression limit exceeded, aborting stream");
            Err(CompressionError::LimitExceeded)
        }
    }
}

enum DecoderState {
    Gzip(Box<GzDecoder<Vec<u8>>>),
    Deflate(Box<ZlibDecoder<Vec<u8>>>),
}

/// Incremental decompressor with a bounded-expansion `Limit` and a
/// format-fallback: if the announced algorithm's decoder ever hard-fails,
/// a fresh decoder under the other algorithm retries from the raw bytes
/// seen so far. This is a pragmatic approximation of "try both formats" --
/// true streaming format-sniffing isn't possible for ambiguous raw deflate
/// vs. gzip bytes, so the fallback replays from the start instead of
/// resuming mid-stream.
pub struct Decompressor {
    state: DecoderState,
    announced: Algorithm,
    limit: Limit,
    raw: Vec<u8>,
    input_bytes_seen: usize,
    output_bytes_so_far: usize,
    fallback_attempted: bool,
}

impl Decompressor {
    pub fn new(algorithm: Algorithm, limit: Limit) -> Self {
        Self {
            state: Self::fresh_decoder(algorithm),
            announced: algorithm,
            limit,
            raw: Vec::new(),
            input_bytes_seen: 0,
            output_bytes_so_far: 0,
            fallback_attempted: false,
        }
    }

    fn fresh_decoder(algorithm: Algorithm) -> DecoderState {
        match algorithm {
            Algorithm::Gzip => DecoderState::Gzip(Box::new(GzDecoder::new(Vec::new()))),
            Algorithm::Deflate => DecoderState::Deflate(Box::new(ZlibDecoder::new(Vec::new()))),
        }
    }

    pub fn decompress(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CompressionError> {
        self.raw.extend_from_slice(chunk);
        self.input_bytes_seen += chunk.len();
        match self.write_chunk(chunk) {
            Ok(out) => {
                self.output_bytes_so_far += out.len();
                self.limit.check(self.input_bytes_seen, self.output_bytes_so_far)?;
                Ok(out)
            }
            Err(CompressionError::Stream(_)) if !self.fallback_attempted => self.retry_with_fallback(),
            Err(err) => Err(err),
        }
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CompressionError> {
        match &mut self.state {
            DecoderState::Gzip(decoder) => {
                decoder.write_all(chunk)?;
                decoder.flush()?;
                Ok(std::mem::take(decoder.get_mut()))
            }
            DecoderState::Deflate(decoder) => {
                decoder.write_all(chunk)?;
                decoder.flush()?;
                Ok(std::mem::take(decoder.get_mut()))
            }
        }
    }

    fn retry_with_fallback(&mut self) -> Result<Vec<u8>, CompressionError> {
        self.fallback_attempted = true;
        let fallback = match self.announced {
            Algorithm::Gzip => Algorithm::Deflate,
            Algorithm::Deflate => Algorithm::Gzip,
        };
        let announced = self.announced;
        tracing::debug!(?announced, ?fallback, "announced decode format failed, retrying under fallback");
        self.state = Self::fresh_decoder(fallback);
        self.output_bytes_so_far = 0;
        let raw = std::mem::take(&mut self.raw);
        let result = self.write_chunk(&raw);
        self.raw = raw;
        match result {
            Ok(out) => {
                self.output_bytes_so_far = out.len();
                self.limit.check(self.input_bytes_seen, self.output_bytes_so_far)?;
                Ok(out)
            }
            Err(CompressionError::Stream(_)) => Err(CompressionError::Malformed),
            Err(err) => Err(err),
        }
    }

    /// Finalizes the stream, verifying trailers/checksums. A decoder that
    /// never completed its footer (truncated mid-stream) surfaces as
    /// `Truncated` rather than a bare I/O error.
    pub fn finish(self) -> Result<Vec<u8>, CompressionError> {
        let result = match self.state {
            DecoderState::Gzip(decoder) => decoder.finish(),
            DecoderState::Deflate(decoder) => decoder.finish(),
        };
        result.map_err(|_| CompressionError::Truncated)
    }
}
