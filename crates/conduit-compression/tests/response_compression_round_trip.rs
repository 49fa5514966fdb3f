use conduit_compression::{Algorithm, Decompressor, Limit, ResponseCompressor, ResponseHead};
use flate2::Compression;

/// Negotiates gzip off a multi-value `Accept-Encoding`, rewrites the
/// response head, streams a multi-chunk body through the compressor, and
/// confirms a real `Decompressor` recovers the original bytes exactly --
/// end to end through both halves of component G.
#[test]
fn negotiated_gzip_body_round_trips_across_multiple_chunks() {
    let mut compressor = ResponseCompressor::new(Compression::default());
    compressor.on_request_head(Some("br;q=1.0, gzip;q=0.9, deflate;q=0.8"));

    let mut head = ResponseHead::new(200);
    head.set_header("content-length", "999");
    head.set_header("content-type", "text/plain");
    assert!(compressor.on_response_head(&mut head));
    assert_eq!(head.header("content-encoding"), Some("gzip"));
    assert_eq!(head.header("transfer-encoding"), Some("chunked"));
    assert!(head.header("content-length").is_none());

    let chunks: [&[u8]; 3] = [b"first chunk of the body, ", b"a second chunk right after it, ", b"and the last one."];
    let mut compressed = Vec::new();
    for chunk in chunks {
        compressed.extend(compressor.compress_chunk(chunk).unwrap());
    }
    compressed.extend(compressor.finish().unwrap());

    let mut decompressor = Decompressor::new(Algorithm::Gzip, Limit::None);
    let mut recovered = decompressor.decompress(&compressed).unwrap();
    recovered.extend(decompressor.finish().unwrap());

    assert_eq!(recovered, chunks.concat());
}

/// A q=0 entry for the only encoding the peer lists is a hard refusal, not
/// a fallback to identity-with-a-warning -- the negotiated algorithm must
/// be `None` and the response passes through unmodified.
#[test]
fn explicit_q_zero_on_every_offered_encoding_leaves_the_response_uncompressed() {
    let mut compressor = ResponseCompressor::new(Compression::default());
    compressor.on_request_head(Some("gzip;q=0, deflate;q=0"));

    let mut head = ResponseHead::new(200);
    head.set_header("content-length", "5");
    assert!(!compressor.on_response_head(&mut head));
    assert_eq!(head.header("content-length"), Some("5"));
    assert!(head.header("content-encoding").is_none());
}
