use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::file::file_header;

/// Plain data a caller's own configuration layer can serialize -- the ring
/// buffer's constructor takes bare parameters, but the caps themselves are
/// a natural thing to persist alongside other per-connection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingBufferLimits {
    pub max_fragments: usize,
    pub max_bytes: usize,
}

/// Dual-capped deque of byte fragments (spec.md §4.F). `add_fragment` evicts
/// from the front while either cap is exceeded; `emit` prepends a file
/// header (skipping it if the oldest surviving fragment already *is* one --
/// useful when a previous `emit`'s output is fed back in as a fragment) and
/// clears the buffer.
pub struct RingBuffer {
    max_fragments: usize,
    max_bytes: usize,
    fragments: VecDeque<Vec<u8>>,
    total_bytes: usize,
}

impl RingBuffer {
    pub fn new(max_fragments: usize, max_bytes: usize) -> Self {
        Self { max_fragments, max_bytes, fragments: VecDeque::new(), total_bytes: 0 }
    }

    pub fn from_limits(limits: RingBufferLimits) -> Self {
        Self::new(limits.max_fragments, limits.max_bytes)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn add_fragment(&mut self, fragment: Vec<u8>) {
        self.total_bytes += fragment.len();
        self.fragments.push_back(fragment);
        while self.fragments.len() > self.max_fragments || self.total_bytes > self.max_bytes {
            let Some(evicted) = self.fragments.pop_front() else { break };
            self.total_bytes -= evicted.len();
        }
    }

    /// Empties the buffer into a standalone pcap file: header, then every
    /// surviving fragment concatenated. Returns an empty buffer (not even a
    /// bare header) if nothing has been retained. Calling `emit` twice with
    /// no intervening `add_fragment` is safe -- the second call sees an
    /// empty buffer and returns empty.
    pub fn emit(&mut self) -> Vec<u8> {
        if self.fragments.is_empty() {
            return Vec::new();
        }
        let header = file_header();
        let mut out = Vec::with_capacity(self.total_bytes + header.len());
        let mut fragments = std::mem::take(&mut self.fragments);
        if fragments.front().is_some_and(|first| *first == header) {
            fragments.pop_front();
        } else {
            out.extend_from_slice(&header);
        }
        for fragment in fragments {
            out.extend_from_slice(&fragment);
        }
        self.total_bytes = 0;
        out
    }
}
