use conduit_bytes::ByteBuffer;
use conduit_codec::{DecodeOutcome, Decoder};

use crate::error::FramingError;

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    ReadingHeaders,
    ReadingBody { content_length: usize },
}

/// Decodes the JSON-RPC-style header block used for editor/IDE protocols:
/// ASCII `Name: Value\r\n` headers terminated by a blank line, followed by
/// exactly `Content-Length` body bytes. Lenient about missing whitespace
/// after the colon and about LF-only line endings -- real clients in the
/// wild emit both.
pub struct ContentLengthDecoder {
    state: State,
}

impl Default for ContentLengthDecoder {
    fn default() -> Self {
        Self { state: State::ReadingHeaders }
    }
}

impl ContentLengthDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Returns the offset just past the header block's terminating blank line,
/// or `None` if the full block hasn't arrived yet.
fn find_header_terminator(data: &[u8]) -> Option<usize> {
    let mut start = 0usize;
    loop {
        let newline_rel = data[start..].iter().position(|&b| b == b'\n')?;
        let newline_abs = start + newline_rel;
        let line_end =
            if newline_abs > start && data[newline_abs - 1] == b'\r' { newline_abs - 1 } else { newline_abs };
        if line_end == start {
            return Some(newline_abs + 1);
        }
        start = newline_abs + 1;
    }
}

/// Raw (untrimmed, terminator-included) header values keyed by lowercased
/// header name -- the `Content-Length` error path needs to echo the exact
/// raw bytes it rejected, not a cleaned-up version.
fn parse_header_block(block: &str) -> std::collections::HashMap<String, String> {
    let mut headers = std::collections::HashMap::new();
    for line in block.split_inclusive('\n') {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(colon) = line.find(':') {
            let name = line[..colon].trim().to_ascii_lowercase();
            let raw_value = line[colon + 1..].to_string();
            headers.insert(name, raw_value);
        }
    }
    headers
}

fn parse_content_length(headers: &std::collections::HashMap<String, String>) -> Result<usize, FramingError> {
    let Some(raw) = headers.get("content-length") else {
        return Err(FramingError::MissingContentLengthHeader);
    };
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n as usize),
        _ => Err(FramingError::IllegalContentLengthHeaderValue(raw.clone())),
    }
}

impl Decoder for ContentLengthDecoder {
    type Item = Vec<u8>;
    type Error = FramingError;

    fn decode(&mut self, buf: &mut ByteBuffer) -> Result<DecodeOutcome<Vec<u8>>, FramingError> {
        if self.state == State::ReadingHeaders {
            let Some(terminator_end) = find_header_terminator(buf.readable_slice()) else {
                return Ok(DecodeOutcome::NeedMoreData);
            };
            let header_bytes = buf.read_bytes(terminator_end).unwrap();
            let header_text = String::from_utf8_lossy(header_bytes).into_owned();
            let headers = parse_header_block(&header_text);
            let content_length = parse_content_length(&headers)?;
            self.state = State::ReadingBody { content_length };
        }

        let State::ReadingBody { content_length } = self.state else { unreachable!() };
        if buf.readable_bytes() < content_length {
            return Ok(DecodeOutcome::NeedMoreData);
        }
        let body = buf.read_bytes(content_length).unwrap().to_vec();
        self.state = State::ReadingHeaders;
        Ok(DecodeOutcome::Produced(body))
    }
}

/// Encoder side: `"Content-Length: N\r\n\r\n" ++ payload`.
pub fn content_length_encode(payload: &[u8]) -> Vec<u8> {
    let mut out = format!("Content-Length: {}\r\n\r\n", payload.len()).into_bytes();
    out.extend_from_slice(payload);
    out
}
