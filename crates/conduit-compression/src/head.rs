/// Minimal response head representation: just enough for the compressor to
/// inspect/rewrite status and headers without depending on a full HTTP
/// parser crate (out of scope -- see spec.md's non-goals for this
/// component: wire parsing of the surrounding HTTP message is a caller
/// concern, this crate only touches the fields it must rewrite).
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: u16,
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    pub fn new(status: u16) -> Self {
        Self { status, headers: Vec::new() }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.remove_header(name);
        self.headers.push((name.to_string(), value.into()));
    }

    /// Status codes that never carry a body: 1xx informational, 204 No
    /// Content, 304 Not Modified.
    pub fn permits_body(&self) -> bool {
        !(self.status / 100 == 1 || self.status == 204 || self.status == 304)
    }
}

#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
}

impl RequestHead {
    pub fn new(method: impl Into<String>, target: impl Into<String>) -> Self {
        Self { method: method.into(), target: target.into(), headers: Vec::new() }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.remove_header(name);
        self.headers.push((name.to_string(), value.into()));
    }
}

/// What the response compressor decided to do with this response, after
/// status-exclusion, header normalization, and the caller's predicate hook
/// have all had a say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressDecision {
    Compress,
    PassThrough,
}
