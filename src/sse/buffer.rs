//! Chunk reassembly for the line protocol.
//!
//! The transport hands us byte chunks with no framing guarantee: a chunk may
//! end in the middle of a record or in the middle of a multi-byte UTF-8
//! character. `LineBuffer` decodes incrementally and hands back complete
//! newline-terminated lines, keeping the unresolved suffix for the next chunk.

/// Growable accumulator holding decoded text not yet resolved into a line.
#[derive(Debug, Default)]
pub struct LineBuffer {
    /// Decoded text; everything before `cursor` has already been returned
    text: String,
    /// Start of the unresolved suffix within `text`
    cursor: usize,
    /// Trailing bytes of an incomplete UTF-8 sequence
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw chunk from the transport.
    ///
    /// An incomplete multi-byte sequence at the end of the chunk is held back
    /// until the next chunk completes it. Invalid sequences are replaced with
    /// U+FFFD rather than failing the stream.
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.compact();

        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // valid_up_to guarantees this prefix is well-formed
                    self.text.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            // Incomplete sequence at the end: wait for more bytes
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Pop the next complete line, without its `\n` (and one trailing `\r`).
    pub fn next_line(&mut self) -> Option<String> {
        let unresolved = &self.text[self.cursor..];
        let newline = unresolved.find('\n')?;
        let line = unresolved[..newline]
            .strip_suffix('\r')
            .unwrap_or(&unresolved[..newline])
            .to_string();
        self.cursor += newline + 1;
        Some(line)
    }

    /// Flush at end of input, returning the unterminated tail if any.
    ///
    /// Pending bytes of a truncated UTF-8 sequence are decoded lossily.
    pub fn finish(&mut self) -> Option<String> {
        if !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            self.text.push_str(&String::from_utf8_lossy(&pending));
        }
        let tail = self.text[self.cursor..].trim_end_matches('\r').to_string();
        self.clear();
        if tail.is_empty() {
            None
        } else {
            Some(tail)
        }
    }

    /// The unresolved suffix as currently decoded.
    pub fn remainder(&self) -> &str {
        &self.text[self.cursor..]
    }

    /// Whether nothing is buffered (neither text nor pending bytes).
    pub fn is_empty(&self) -> bool {
        self.cursor == self.text.len() && self.pending.is_empty()
    }

    /// Drop all buffered state.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.pending.clear();
    }

    /// Discard already-returned text so the buffer does not grow unbounded.
    fn compact(&mut self) {
        if self.cursor > 0 {
            self.text.drain(..self.cursor);
            self.cursor = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(buffer: &mut LineBuffer) -> Vec<String> {
        std::iter::from_fn(|| buffer.next_line()).collect()
    }

    #[test]
    fn test_single_chunk_multiple_lines() {
        let mut buffer = LineBuffer::new();
        buffer.push_chunk(b"one\ntwo\nthr");
        assert_eq!(drain(&mut buffer), vec!["one", "two"]);
        assert_eq!(buffer.remainder(), "thr");
    }

    #[test]
    fn test_partial_line_completed_by_next_chunk() {
        let mut buffer = LineBuffer::new();
        buffer.push_chunk(b"data: {\"a\"");
        assert!(buffer.next_line().is_none());
        buffer.push_chunk(b":1}\n");
        assert_eq!(buffer.next_line().as_deref(), Some("data: {\"a\":1}"));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_crlf_is_stripped() {
        let mut buffer = LineBuffer::new();
        buffer.push_chunk(b"a\r\nb\r\n");
        assert_eq!(drain(&mut buffer), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_lines_are_returned() {
        let mut buffer = LineBuffer::new();
        buffer.push_chunk(b"a\n\nb\n");
        assert_eq!(drain(&mut buffer), vec!["a", "", "b"]);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let text = "思考\n";
        let bytes = text.as_bytes();
        let mut buffer = LineBuffer::new();
        // Split inside the first three-byte character
        buffer.push_chunk(&bytes[..1]);
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.remainder(), "");
        buffer.push_chunk(&bytes[1..4]);
        assert_eq!(buffer.remainder(), "思");
        buffer.push_chunk(&bytes[4..]);
        assert_eq!(buffer.next_line().as_deref(), Some("思考"));
    }

    #[test]
    fn test_byte_at_a_time_matches_whole() {
        let text = "data: héllo wörld ✓\ndata: 二\n";
        let mut buffer = LineBuffer::new();
        let mut lines = Vec::new();
        for byte in text.as_bytes() {
            buffer.push_chunk(std::slice::from_ref(byte));
            lines.extend(drain(&mut buffer));
        }
        assert_eq!(lines, vec!["data: héllo wörld ✓", "data: 二"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut buffer = LineBuffer::new();
        buffer.push_chunk(b"a\xffb\n");
        assert_eq!(buffer.next_line().as_deref(), Some("a\u{FFFD}b"));
    }

    #[test]
    fn test_finish_returns_tail() {
        let mut buffer = LineBuffer::new();
        buffer.push_chunk(b"done\ntail");
        assert_eq!(buffer.next_line().as_deref(), Some("done"));
        assert_eq!(buffer.finish().as_deref(), Some("tail"));
        assert!(buffer.is_empty());
        assert!(buffer.finish().is_none());
    }

    #[test]
    fn test_finish_flushes_truncated_sequence() {
        let mut buffer = LineBuffer::new();
        buffer.push_chunk(&"x二".as_bytes()[..2]);
        assert_eq!(buffer.finish().as_deref(), Some("x\u{FFFD}"));
    }

    #[test]
    fn test_compaction_keeps_remainder() {
        let mut buffer = LineBuffer::new();
        buffer.push_chunk(b"first\nsec");
        assert_eq!(buffer.next_line().as_deref(), Some("first"));
        buffer.push_chunk(b"ond\n");
        assert_eq!(buffer.next_line().as_deref(), Some("second"));
        assert_eq!(buffer.remainder(), "");
    }
}
