//! Line framing for newline-delimited JSON response bodies.
//!
//! The transport hands over byte fragments of arbitrary size: one record may
//! span several fragments and one fragment may carry several records. The
//! decoder keeps the unterminated tail between calls and yields each complete
//! line as trimmed text.
//!
//! Bytes are buffered and split on `\n` before any UTF-8 decoding happens.
//! A line feed byte never occurs inside a multi-byte UTF-8 sequence, so a
//! character split across fragments stays in the buffer until its line is
//! complete. Invalid sequences decode to U+FFFD instead of failing.

use memchr::memchr;

/// Request-scoped line buffer. Create one per response body.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    buffer: Vec<u8>,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment and iterate the lines it completes.
    ///
    /// The iterator is lazy; lines it does not reach stay buffered and are
    /// yielded by the next call.
    pub fn push(&mut self, fragment: &[u8]) -> DecodedLines<'_> {
        self.buffer.extend_from_slice(fragment);
        DecodedLines {
            buffer: &mut self.buffer,
            consumed: 0,
        }
    }

    /// Flush the unterminated tail once the body has ended.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let tail = std::mem::take(&mut self.buffer);
        Some(decode_line(&tail))
    }

    /// Bytes held back waiting for a line feed.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}

/// Lines completed by one [`ChunkDecoder::push`].
pub struct DecodedLines<'a> {
    buffer: &'a mut Vec<u8>,
    consumed: usize,
}

impl Iterator for DecodedLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let rest = &self.buffer[self.consumed..];
        let newline_pos = memchr(b'\n', rest)?;
        let line = decode_line(&rest[..newline_pos]);
        self.consumed += newline_pos + 1;
        Some(line)
    }
}

impl Drop for DecodedLines<'_> {
    fn drop(&mut self) {
        self.buffer.drain(..self.consumed);
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}
