//! Cursor-based byte buffer with independent reader/writer indices, plus
//! endianness-aware integer read/write helpers -- the leaf data structure
//! every codec in this workspace cumulates bytes into.

use std::fmt;

/// Byte order used when interpreting or emitting a multi-byte integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Endianness {
    Big,
    Little,
}

/// A contiguous, growable byte region with independent `reader_index` and
/// `writer_index` cursors.
///
/// Invariant: `0 <= reader_index <= writer_index <= data.len()` always
/// holds between calls. The readable view is `data[reader_index..writer_index]`.
#[derive(Clone, Default)]
pub struct ByteBuffer {
    data: Vec<u8>,
    reader_index: usize,
    writer_index: usize,
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("reader_index", &self.reader_index)
            .field("writer_index", &self.writer_index)
            .field("capacity", &self.data.len())
            .finish()
    }
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self { data: Vec::new(), reader_index: 0, writer_index: 0 }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: Vec::with_capacity(capacity), reader_index: 0, writer_index: 0 }
    }

    /// Wraps an already-filled buffer: `reader_index` starts at 0,
    /// `writer_index` at `bytes.len()`.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        let writer_index = bytes.len();
        Self { data: bytes, reader_index: 0, writer_index }
    }

    pub fn reader_index(&self) -> usize {
        self.reader_index
    }

    pub fn writer_index(&self) -> usize {
        self.writer_index
    }

    /// Number of bytes available to read: `[reader_index, writer_index)`.
    pub fn readable_bytes(&self) -> usize {
        self.writer_index - self.reader_index
    }

    pub fn is_readable(&self) -> bool {
        self.readable_bytes() > 0
    }

    /// The unread portion of the buffer, without moving the reader cursor.
    pub fn readable_slice(&self) -> &[u8] {
        &self.data[self.reader_index..self.writer_index]
    }

    /// Appends `bytes` at the writer cursor, growing the backing store as
    /// needed, and advances `writer_index`.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.writer_index == self.data.len() {
            self.data.extend_from_slice(bytes);
        } else {
            // There's already-discarded capacity ahead; reuse it instead of
            // growing further.
            let end = self.writer_index + bytes.len();
            if end > self.data.len() {
                self.data.resize(end, 0);
            }
            self.data[self.writer_index..end].copy_from_slice(bytes);
        }
        self.writer_index += bytes.len();
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    pub fn write_u16(&mut self, value: u16, endianness: Endianness) {
        let bytes = match endianness {
            Endianness::Big => value.to_be_bytes(),
            Endianness::Little => value.to_le_bytes(),
        };
        self.write_bytes(&bytes);
    }

    /// Writes the low 24 bits of `value`; the caller is responsible for
    /// ensuring `value < 2^24` (frame codecs reject oversized lengths before
    /// reaching here).
    pub fn write_u24(&mut self, value: u32, endianness: Endianness) {
        let be = value.to_be_bytes(); // [_, b1, b2, b3]
        match endianness {
            Endianness::Big => self.write_bytes(&be[1..4]),
            Endianness::Little => self.write_bytes(&[be[3], be[2], be[1]]),
        }
    }

    pub fn write_u32(&mut self, value: u32, endianness: Endianness) {
        let bytes = match endianness {
            Endianness::Big => value.to_be_bytes(),
            Endianness::Little => value.to_le_bytes(),
        };
        self.write_bytes(&bytes);
    }

    pub fn write_u64(&mut self, value: u64, endianness: Endianness) {
        let bytes = match endianness {
            Endianness::Big => value.to_be_bytes(),
            Endianness::Little => value.to_le_bytes(),
        };
        self.write_bytes(&bytes);
    }

    /// Writes an unsigned integer occupying `width` bytes (1, 2, 3, 4 or 8).
    ///
    /// # Panics
    /// Panics if `width` isn't one of the supported widths -- callers
    /// validate the configured width once, at construction time.
    pub fn write_uint(&mut self, value: u64, width: usize, endianness: Endianness) {
        match width {
            1 => self.write_u8(value as u8),
            2 => self.write_u16(value as u16, endianness),
            3 => self.write_u24(value as u32, endianness),
            4 => self.write_u32(value as u32, endianness),
            8 => self.write_u64(value, endianness),
            other => panic!("unsupported integer width: {other}"),
        }
    }

    /// Non-consuming read of `length` bytes starting at `at` (absolute
    /// index, not relative to `reader_index`). Returns `None` if that range
    /// isn't fully within `[0, writer_index)`.
    pub fn get_slice(&self, at: usize, length: usize) -> Option<&[u8]> {
        let end = at.checked_add(length)?;
        if end > self.writer_index {
            return None;
        }
        Some(&self.data[at..end])
    }

    /// Consuming read of `n` bytes from the reader cursor. Returns `None`
    /// (never a partial slice) if fewer than `n` bytes are readable.
    pub fn read_bytes(&mut self, n: usize) -> Option<&[u8]> {
        if self.readable_bytes() < n {
            return None;
        }
        let start = self.reader_index;
        self.reader_index += n;
        Some(&self.data[start..start + n])
    }

    /// Advances the reader cursor by `n` without returning the skipped
    /// bytes. Used once a frame header has been peeked via `get_slice`.
    pub fn skip(&mut self, n: usize) -> bool {
        if self.readable_bytes() < n {
            return false;
        }
        self.reader_index += n;
        true
    }

    pub fn peek_u8(&self) -> Option<u8> {
        self.get_slice(self.reader_index, 1).map(|s| s[0])
    }

    pub fn peek_uint(&self, width: usize, endianness: Endianness) -> Option<u64> {
        let slice = self.get_slice(self.reader_index, width)?;
        Some(decode_uint(slice, endianness))
    }

    pub fn read_uint(&mut self, width: usize, endianness: Endianness) -> Option<u64> {
        let value = self.peek_uint(width, endianness)?;
        self.reader_index += width;
        Some(value)
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        self.read_uint(1, Endianness::Big).map(|v| v as u8)
    }

    pub fn read_u16(&mut self, endianness: Endianness) -> Option<u16> {
        self.read_uint(2, endianness).map(|v| v as u16)
    }

    pub fn read_u24(&mut self, endianness: Endianness) -> Option<u32> {
        self.read_uint(3, endianness).map(|v| v as u32)
    }

    pub fn read_u32(&mut self, endianness: Endianness) -> Option<u32> {
        self.read_uint(4, endianness).map(|v| v as u32)
    }

    pub fn read_u64(&mut self, endianness: Endianness) -> Option<u64> {
        self.read_uint(8, endianness)
    }

    /// Shifts unread bytes to the front of the backing store and resets
    /// `reader_index` to 0. Cheap no-op if there's nothing to discard.
    pub fn discard_read(&mut self) {
        if self.reader_index == 0 {
            return;
        }
        self.data.copy_within(self.reader_index..self.writer_index, 0);
        self.writer_index -= self.reader_index;
        self.data.truncate(self.writer_index);
        self.reader_index = 0;
    }

    /// Discards consumed bytes only once the reader has advanced far
    /// enough to make the `copy_within` worthwhile -- avoids shuffling the
    /// buffer on every single small frame.
    pub fn discard_read_if_beneficial(&mut self) {
        const DISCARD_THRESHOLD: usize = 4 * 1024;
        if self.reader_index >= DISCARD_THRESHOLD || self.reader_index == self.writer_index {
            self.discard_read();
        }
    }

    /// Everything left unread, consuming the buffer. Used when a handler is
    /// removed or a channel goes inactive with bytes still in flight.
    pub fn take_residue(&mut self) -> Vec<u8> {
        let residue = self.data[self.reader_index..self.writer_index].to_vec();
        self.reader_index = 0;
        self.writer_index = 0;
        self.data.clear();
        residue
    }
}

fn decode_uint(slice: &[u8], endianness: Endianness) -> u64 {
    let mut value: u64 = 0;
    match endianness {
        Endianness::Big => {
            for &b in slice {
                value = (value << 8) | u64::from(b);
            }
        }
        Endianness::Little => {
            for &b in slice.iter().rev() {
                value = (value << 8) | u64::from(b);
            }
        }
    }
    value
}
