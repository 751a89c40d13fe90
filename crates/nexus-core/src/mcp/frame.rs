//! Content-Length framing for JSON-RPC over a byte stream
//!
//! Every message is `Content-Length: <n>\r\n\r\n<n bytes of UTF-8 JSON>`.
//! Decoding is tolerant: a header without a usable length is skipped up to
//! its separator, and a body that isn't valid JSON is dropped. A declared
//! length above [`MAX_FRAME_LEN`] counts as unusable.

use serde_json::Value;

use crate::logging::file_logger as log;

const SEPARATOR: &[u8] = b"\r\n\r\n";

/// Larger declared bodies are treated as a malformed header
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Incremental frame decoder; also hosts the encoder
#[derive(Debug, Default)]
pub struct FrameCodec {
    buffer: Vec<u8>,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode one message as a complete frame
    pub fn encode(message: &Value) -> Vec<u8> {
        let body = message.to_string();
        let mut frame = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
        frame.extend_from_slice(body.as_bytes());
        frame
    }

    /// Feed bytes; `on_message` runs once per complete frame, in stream order
    pub fn push(&mut self, chunk: &[u8], mut on_message: impl FnMut(Value)) {
        self.buffer.extend_from_slice(chunk);

        loop {
            let Some(header_end) = find_separator(&self.buffer) else {
                return;
            };
            let body_start = header_end + SEPARATOR.len();

            let frame_end = content_length(&self.buffer[..header_end])
                .filter(|length| *length <= MAX_FRAME_LEN)
                .and_then(|length| body_start.checked_add(length));
            let Some(frame_end) = frame_end else {
                log::debug(
                    "mcp::frame",
                    &format!("Dropping {} bytes of unparseable header", body_start),
                );
                self.buffer.drain(..body_start);
                continue;
            };

            if self.buffer.len() < frame_end {
                return;
            }

            let parsed = serde_json::from_slice::<Value>(&self.buffer[body_start..frame_end]);
            self.buffer.drain(..frame_end);
            match parsed {
                Ok(message) => on_message(message),
                Err(e) => log::debug("mcp::frame", &format!("Dropping frame with invalid JSON body: {}", e)),
            }
        }
    }

    /// Feed bytes and collect the decoded messages
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<Value> {
        let mut out = Vec::new();
        self.push(chunk, |message| out.push(message));
        out
    }

    /// Bytes waiting for the rest of a frame
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

fn find_separator(buffer: &[u8]) -> Option<usize> {
    buffer.windows(SEPARATOR.len()).position(|w| w == SEPARATOR)
}

/// Read `Content-Length` from a header block, case-insensitively
fn content_length(header: &[u8]) -> Option<usize> {
    let text = String::from_utf8_lossy(header);
    text.split("\r\n").find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if !key.trim().eq_ignore_ascii_case("content-length") {
            return None;
        }
        let value = value.trim();
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        value.parse().ok()
    })
}
