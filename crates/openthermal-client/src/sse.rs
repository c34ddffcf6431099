//! Incremental server-sent-events parser.
//!
//! Feeds on raw response chunks and yields complete event data payloads.
//! Chunk boundaries carry no meaning in SSE, so the parser buffers bytes
//! until a blank line closes an event; a chunk may complete zero, one, or
//! many events, and may split lines or multi-byte characters anywhere.

use bytes::{Buf, BytesMut};

/// Stateful parser for one SSE connection.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: BytesMut,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one transport chunk, returning the data payload of every
    /// event completed by it, in order.
    ///
    /// An event's payload is its `data:` lines joined with `\n`. Events
    /// without any `data:` line (comment keepalives, bare `event:`/`id:`
    /// fields) are dropped, per the SSE processing model.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        while let Some((end, sep_len)) = find_event_boundary(&self.buffer) {
            let block = self.buffer.split_to(end);
            self.buffer.advance(sep_len);
            if let Some(data) = extract_data(&block) {
                payloads.push(data);
            }
        }
        payloads
    }
}

/// Locate the blank line closing the first complete event.
///
/// Returns (block length, separator length). The separator is `\n\n` or,
/// when the sender uses CRLF, `\n\r\n` (the first line's `\r` stays inside
/// the block and is stripped per line).
fn find_event_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    for (i, &byte) in buf.iter().enumerate() {
        if byte != b'\n' {
            continue;
        }
        let rest = &buf[i + 1..];
        if rest.first() == Some(&b'\n') {
            return Some((i, 2));
        }
        if rest.starts_with(b"\r\n") {
            return Some((i, 3));
        }
    }
    None
}

fn extract_data(block: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(block);
    let mut data_lines: Vec<&str> = Vec::new();
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.strip_prefix(' ').unwrap_or(value));
        } else if line == "data" {
            data_lines.push("");
        }
    }
    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}
