/// A hand-rolled scanner for just enough of an HTTP/1 response to drive the
/// CONNECT handshake: the status code and where the header block ends.
/// Not a general HTTP parser -- that's a declared external collaborator's
/// job; this only needs to recognize a status line and a blank-line
/// terminator.
pub struct ResponseHead {
    pub status: u16,
    /// Offset into the scanned buffer just past the header block's
    /// terminating blank line -- anything after this is body.
    pub header_block_end: usize,
}

/// Returns `Some(head)` once a full status line + header block (through
/// the blank-line terminator) has arrived, or `None` if more bytes are
/// needed. Tolerant of LF-only line endings, matching this workspace's
/// other line-oriented parsers.
pub fn scan_response_head(data: &[u8]) -> Option<ResponseHead> {
    let header_block_end = find_header_terminator(data)?;
    let status_line_end = data.iter().position(|&b| b == b'\n')? + 1;
    let status_line = &data[..status_line_end];
    let status = parse_status_line(status_line)?;
    Some(ResponseHead { status, header_block_end })
}

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

/// Parses `HTTP/1.1 200 Connection established` (or `HTTP/1.0`, any reason
/// phrase) down to the three-digit status code.
fn parse_status_line(line: &[u8]) -> Option<u16> {
    let text = std::str::from_utf8(line).ok()?;
    let text = text.trim_end();
    let mut parts = text.splitn(3, ' ');
    let _version = parts.next()?;
    let status = parts.next()?;
    status.parse::<u16>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_a_complete_2xx_head() {
        let data = b"HTTP/1.1 200 Connection established\r\nProxy-Agent: test\r\n\r\n";
        let head = scan_response_head(data).unwrap();
        assert_eq!(head.status, 200);
        assert_eq!(head.header_block_end, data.len());
    }

    #[test]
    fn incomplete_head_returns_none() {
        let data = b"HTTP/1.1 200 Connection established\r\nProxy-Agent: test\r\n";
        assert!(scan_response_head(data).is_none());
    }

    #[test]
    fn tolerates_lf_only_line_endings() {
        let data = b"HTTP/1.1 500 Internal Server Error\n\n";
        let head = scan_response_head(data).unwrap();
        assert_eq!(head.status, 500);
    }

    #[test]
    fn detects_trailing_body_past_the_header_block() {
        let data = b"HTTP/1.1 500 Internal Server Error\r\n\r\nbody follows";
        let head = scan_response_head(data).unwrap();
        assert_eq!(&data[head.header_block_end..], b"body follows");
    }
}
