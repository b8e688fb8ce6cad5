//! Incremental streaming core (spec §4.7, §4.9): an append-only buffer with
//! an absorbed-prefix offset, a depth-tracking scanner that recognizes
//! complete top-level JSON values inside chunked text, and the sticky
//! failure state machine shared by every collector in `json.rs`/`sql.rs`.
//!
//! Design note (spec §9 "Arena/index for streaming"): previously-scanned
//! text is drained from the buffer as soon as a value is extracted, so the
//! buffer only ever holds the unabsorbed tail. Offsets, not pointers, cross
//! `append` calls.

pub mod json;
pub mod sql;

use memchr::memchr2;

use crate::error::{LimitKind, ValidationError};
use crate::options::StreamLimits;

/// Cursor position of the scanner, tracked across `append`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamLocation {
    pub offset: u64,
    pub line: u64,
    pub col: u64,
}

/// The uniform result shape for every stream operation (spec §3).
/// `done ∧ ok ⇒ value.is_some() ∧ error.is_none()`;
/// `done ∧ ¬ok ⇒ error.is_some()`; `¬done ⇒ value.is_none() ∧ error.is_none()`.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamOutcome<T> {
    pub done: bool,
    pub ok: bool,
    pub value: Option<T>,
    pub error: Option<ValidationError>,
}

impl<T> StreamOutcome<T> {
    pub fn pending() -> Self {
        Self { done: false, ok: false, value: None, error: None }
    }

    pub fn open_value(value: T) -> Self {
        Self { done: false, ok: true, value: Some(value), error: None }
    }

    pub fn done_ok(value: T) -> Self {
        Self { done: true, ok: true, value: Some(value), error: None }
    }

    pub fn closed() -> Self {
        Self { done: true, ok: true, value: None, error: None }
    }

    pub fn failure(error: ValidationError) -> Self {
        Self { done: true, ok: false, value: None, error: Some(error) }
    }
}

/// Shared buffer/scanner state. Not schema- or format-aware; `json.rs` and
/// `sql.rs` layer segmentation and validation on top.
pub struct StreamCore {
    buffer: String,
    absorbed_offset: u64,
    absorbed_line: u64,
    absorbed_col: u64,
    limits: StreamLimits,
    finished: bool,
    sticky_error: Option<ValidationError>,
}

impl StreamCore {
    pub fn new(limits: StreamLimits) -> Self {
        Self {
            buffer: String::new(),
            absorbed_offset: 0,
            absorbed_line: 1,
            absorbed_col: 1,
            limits,
            finished: false,
            sticky_error: None,
        }
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.absorbed_offset = 0;
        self.absorbed_line = 1;
        self.absorbed_col = 1;
        self.finished = false;
        self.sticky_error = None;
    }

    pub fn sticky_error(&self) -> Option<ValidationError> {
        self.sticky_error.clone()
    }

    /// Appends `chunk` to the buffer. Returns the sticky limit error the
    /// moment `maxBufferBytes` would be exceeded; once set it is returned on
    /// every subsequent call until `reset` (spec §4.9).
    pub fn append(&mut self, chunk: &str) -> Option<ValidationError> {
        if let Some(err) = &self.sticky_error {
            return Some(err.clone());
        }
        tracing::debug!("stream: append {} bytes", chunk.len());
        self.buffer.push_str(chunk);
        if let Some(max) = self.limits.max_buffer_bytes_effective() {
            let current = self.absorbed_offset + self.buffer.len() as u64;
            if current > max {
                let err = ValidationError::limit_error(
                    "$.stream.maxBufferBytes",
                    LimitKind::MaxBufferBytes,
                    current,
                    max,
                );
                tracing::debug!("stream: maxBufferBytes exceeded ({} > {})", current, max);
                self.sticky_error = Some(err.clone());
                return Some(err);
            }
        }
        None
    }

    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn location(&self) -> StreamLocation {
        StreamLocation { offset: self.absorbed_offset, line: self.absorbed_line, col: self.absorbed_col }
    }

    pub fn max_items_effective(&self) -> Option<u64> {
        self.limits.max_items_effective()
    }

    pub fn has_unconsumed_non_whitespace(&self) -> bool {
        self.buffer.chars().any(|c| !crate::classify::is_whitespace(c))
    }

    /// Fast-forwards past prose/fence markers to the next structural opener
    /// or a recognized scalar start inside a fence, scans forward tracking
    /// depth (respecting strings/escapes) or the scalar's own grammar, and,
    /// once a complete top-level span is found, drains it (and everything
    /// before it) from the buffer and returns its text.
    pub fn next_value_span(&mut self) -> Option<String> {
        let brace = memchr2(b'{', b'[', self.buffer.as_bytes());
        let scalar = find_fenced_scalar_start(&self.buffer);
        let start = match (brace, scalar) {
            (Some(b), Some(s)) => b.min(s),
            (Some(b), None) => b,
            (None, Some(s)) => s,
            (None, None) => return None,
        };
        let end = scan_value_end(&self.buffer, start, self.finished)?;
        let span = self.buffer[start..end].to_string();
        self.advance_absorbed(end);
        Some(span)
    }

    /// SQL segmentation: returns the next `;`-terminated statement (sans the
    /// semicolon), or, if `finish()` has been called and a non-empty tail
    /// remains, the tail itself.
    pub fn next_sql_statement(&mut self) -> Option<String> {
        if let Some(pos) = memchr::memchr(b';', self.buffer.as_bytes()) {
            let stmt = self.buffer[..pos].trim().to_string();
            self.advance_absorbed(pos + 1);
            return if stmt.is_empty() { self.next_sql_statement() } else { Some(stmt) };
        }
        if self.finished {
            let tail = self.buffer.trim().to_string();
            self.advance_absorbed(self.buffer.len());
            if tail.is_empty() {
                return None;
            }
            return Some(tail);
        }
        None
    }

    fn advance_absorbed(&mut self, consumed_bytes: usize) {
        for c in self.buffer[..consumed_bytes].chars() {
            if c == '\n' {
                self.absorbed_line += 1;
                self.absorbed_col = 1;
            } else {
                self.absorbed_col += 1;
            }
        }
        self.absorbed_offset += consumed_bytes as u64;
        self.buffer.drain(..consumed_bytes);
    }
}

/// Looks for a fenced code block opener (three backticks, an optional
/// language tag, then a newline) whose body's first non-whitespace
/// character is a recognized JSON scalar start: a quote, a digit, `-`, or
/// the leading letter of `true`/`false`/`null`. Structural openers (`{`,
/// `[`) are handled separately by the plain `memchr2` scan in
/// `next_value_span`, so this only needs to cover the bare-scalar case.
fn find_fenced_scalar_start(buf: &str) -> Option<usize> {
    let mut search_from = 0;
    loop {
        let fence_rel = buf[search_from..].find("```")?;
        let fence_start = search_from + fence_rel;
        let after_fence = fence_start + 3;
        let newline_rel = buf[after_fence..].find('\n')?;
        let body_start = after_fence + newline_rel + 1;
        let body = &buf[body_start..];
        match body.find(|c: char| !crate::classify::is_whitespace(c)) {
            Some(first_non_ws) => {
                let pos = body_start + first_non_ws;
                let c = buf.as_bytes()[pos];
                if matches!(c, b'"' | b'-' | b'0'..=b'9' | b't' | b'f' | b'n') {
                    return Some(pos);
                }
                search_from = after_fence;
            }
            None => return None,
        }
    }
}

fn scan_value_end(buf: &str, start: usize, finished: bool) -> Option<usize> {
    match buf.as_bytes()[start] {
        b'{' | b'[' => scan_balanced(buf, start),
        b'"' => scan_scalar_string(buf, start),
        b'-' | b'0'..=b'9' => scan_scalar_number(buf, start, finished),
        b't' | b'f' | b'n' => scan_scalar_literal(buf, start),
        _ => None,
    }
}

fn scan_scalar_string(buf: &str, start: usize) -> Option<usize> {
    let bytes = buf.as_bytes();
    let mut i = start + 1;
    let mut escape = false;
    while i < bytes.len() {
        let b = bytes[i];
        if escape {
            escape = false;
        } else if b == b'\\' {
            escape = true;
        } else if b == b'"' {
            return Some(i + 1);
        }
        i += 1;
    }
    None
}

/// A bare number has no closing delimiter of its own, so we can only be
/// sure it's complete once either a non-numeric byte follows it in the
/// buffer or the stream has been told there's no more input coming.
fn scan_scalar_number(buf: &str, start: usize, finished: bool) -> Option<usize> {
    let bytes = buf.as_bytes();
    let mut i = start;
    if bytes.get(i) == Some(&b'-') {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits_start {
        return None;
    }
    if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if matches!(bytes.get(i), Some(b'e') | Some(b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+') | Some(b'-')) {
            j += 1;
        }
        if bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    if i < bytes.len() {
        Some(i)
    } else if finished {
        Some(i)
    } else {
        None
    }
}

fn scan_scalar_literal(buf: &str, start: usize) -> Option<usize> {
    for lit in ["true", "false", "null"] {
        let end = start + lit.len();
        if buf.len() >= end {
            if &buf[start..end] == lit {
                return Some(end);
            }
        } else if lit.as_bytes().starts_with(buf[start..].as_bytes()) {
            return None;
        }
    }
    None
}

fn scan_balanced(buf: &str, start: usize) -> Option<usize> {
    let bytes = buf.as_bytes();
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    let mut i = start;
    let mut seen_token = false;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escape {
                escape = false;
            } else if b == b'\\' {
                escape = true;
            } else if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                seen_token = true;
            }
            b'}' | b']' => {
                depth -= 1;
                if depth == 0 && seen_token {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_value_span_skips_prose_and_tracks_offsets() {
        let mut core = StreamCore::new(StreamLimits::default());
        core.append("noise before ```json\n{\"a\":1}\n```\nmore noise {\"b\":2}");
        let first = core.next_value_span().unwrap();
        assert_eq!(first, "{\"a\":1}");
        let second = core.next_value_span().unwrap();
        assert_eq!(second, "{\"b\":2}");
        assert!(core.next_value_span().is_none());
    }

    #[test]
    fn max_buffer_bytes_is_sticky() {
        let mut core = StreamCore::new(StreamLimits { max_buffer_bytes: Some(8), max_items: None });
        assert!(core.append("0123456789").is_some());
        let first = core.sticky_error().unwrap();
        assert!(core.append("more").is_some());
        let second = core.sticky_error().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn sql_statement_segmentation_on_semicolon() {
        let mut core = StreamCore::new(StreamLimits::default());
        core.append("SELECT 1; SELECT 2;");
        assert_eq!(core.next_sql_statement().unwrap(), "SELECT 1");
        assert_eq!(core.next_sql_statement().unwrap(), "SELECT 2");
        assert!(core.next_sql_statement().is_none());
    }

    #[test]
    fn next_value_span_finds_fenced_scalar_string() {
        let mut core = StreamCore::new(StreamLimits::default());
        core.append("preamble ```json\n\"hello world\"\n``` trailer");
        assert_eq!(core.next_value_span().unwrap(), "\"hello world\"");
    }

    #[test]
    fn next_value_span_finds_fenced_scalar_number_once_finished() {
        let mut core = StreamCore::new(StreamLimits::default());
        core.append("```json\n42");
        // Not finished yet: the number could still be growing (e.g. "420").
        assert!(core.next_value_span().is_none());
        core.finish();
        assert_eq!(core.next_value_span().unwrap(), "42");
    }

    #[test]
    fn next_value_span_finds_fenced_scalar_number_terminated_by_fence() {
        let mut core = StreamCore::new(StreamLimits::default());
        core.append("```json\n-3.5e2\n```\n");
        assert_eq!(core.next_value_span().unwrap(), "-3.5e2");
    }

    #[test]
    fn next_value_span_finds_fenced_scalar_literal() {
        let mut core = StreamCore::new(StreamLimits::default());
        core.append("```json\ntrue\n```");
        assert_eq!(core.next_value_span().unwrap(), "true");
    }

    /// Linear-congruential chunk-size generator: produces a sequence of
    /// sizes in `1..16` that sum to `len`, so a fixed seed always yields the
    /// same chunking for a given input length.
    fn lcg_sizes(seed: u64, len: usize) -> Vec<usize> {
        let mut state = seed;
        let mut sizes = Vec::new();
        let mut remaining = len;
        while remaining > 0 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let size = ((state >> 33) % 15) as usize + 1;
            let size = size.min(remaining);
            sizes.push(size);
            remaining -= size;
        }
        sizes
    }

    /// Splits `s` into the given chunk `sizes` (char-boundary respecting),
    /// appending any remainder as a final chunk.
    fn chunk_by_char(s: &str, sizes: &[usize]) -> Vec<String> {
        let chars: Vec<char> = s.chars().collect();
        let mut out = Vec::new();
        let mut idx = 0;
        for &size in sizes {
            if idx >= chars.len() {
                break;
            }
            let end = (idx + size).min(chars.len());
            out.push(chars[idx..end].iter().collect());
            idx = end;
        }
        if idx < chars.len() {
            out.push(chars[idx..].iter().collect());
        }
        out
    }

    /// Invariant: feeding the same document through the streaming core in
    /// different chunk partitions must yield the same sequence of spans,
    /// independent of where the chunk boundaries happen to fall.
    #[test]
    fn chunk_partitioning_does_not_affect_span_extraction() {
        let mut doc = String::from("[");
        for i in 0..200 {
            if i > 0 {
                doc.push(',');
            }
            doc.push_str(&format!("{{\"i\":{}}}", i));
        }
        doc.push(']');

        let mut whole = StreamCore::new(StreamLimits::default());
        whole.append(&doc);
        whole.finish();
        let expected = whole.next_value_span().unwrap();

        for seed in [1u64, 7, 42, 1000] {
            let sizes = lcg_sizes(seed, doc.len());
            let chunks = chunk_by_char(&doc, &sizes);
            let mut core = StreamCore::new(StreamLimits::default());
            for chunk in &chunks {
                core.append(chunk);
            }
            core.finish();
            assert_eq!(core.next_value_span().unwrap(), expected, "seed {seed} produced a different span");
        }
    }
}
