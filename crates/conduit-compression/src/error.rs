use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("zlib stream error: {0}")]
    Stream(#[from] std::io::Error),

    /// Decompressed output exceeded the configured `Limit` -- the stream is
    /// aborted, not truncated and returned.
    #[error("decompressed output exceeded the configured expansion limit")]
    LimitExceeded,

    /// Neither the announced format nor its counterpart could decode the
    /// bytes seen so far.
    #[error("compressed data is malformed under every format attempted")]
    Malformed,

    /// A stream ended before its trailer/checksum could be verified.
    #[error("compressed stream truncated before completion")]
    Truncated,

    /// Every write still pending when a response compressor handler is
    /// removed mid-compression fails with this.
    #[error("handler removed with uncompressed writes still pending")]
    UncompressedWritesPending,
}
