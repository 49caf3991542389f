//! Line framing for the chat event stream.
//!
//! The body is newline-delimited text. Lines beginning with `data: ` carry a
//! JSON payload tagged by `type`; every other line is ignored.
use tracing::debug;

use crate::errors::{ChatError, FrameError};
use crate::model::ChatResponse;
use crate::stream::StreamEvent;

pub const DATA_PREFIX: &str = "data: ";
pub const DONE_SENTINEL: &str = "[DONE]";

/// Words per chunk frame when a response is replayed as a stream.
const WORDS_PER_CHUNK: usize = 5;

/// Outcome of decoding one complete line.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Decoded {
    Event(StreamEvent),
    /// The `[DONE]` marker. Produces no event.
    Done,
    /// A data line whose payload could not be decoded.
    Dropped(FrameError),
}

/// Splits incoming bytes into lines and decodes data frames.
///
/// Bytes after the last newline stay buffered until the next chunk, so a
/// frame (or a multi-byte character) split across reads is decoded once,
/// whole.
#[derive(Default)]
pub(crate) struct FrameDecoder {
    buf: Vec<u8>,
    /// Prefix of `buf` already known to hold no newline.
    scanned: usize,
}

impl FrameDecoder {
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<Decoded> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();
        let mut start = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.buf[search_from..].iter().position(|&b| b == b'\n') {
            let end = search_from + offset;
            let line = String::from_utf8_lossy(&self.buf[start..end]);
            if let Some(decoded) = decode_line(line.trim_end_matches('\r')) {
                out.push(decoded);
            }
            start = end + 1;
            search_from = start;
        }
        self.buf.drain(..start);
        self.scanned = self.buf.len();
        out
    }

    /// Number of bytes waiting for a newline.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

pub(crate) fn decode_line(line: &str) -> Option<Decoded> {
    let payload = line.strip_prefix(DATA_PREFIX)?;
    if payload == DONE_SENTINEL {
        return Some(Decoded::Done);
    }
    match decode_payload(payload) {
        Ok(Some(event)) => Some(Decoded::Event(event)),
        Ok(None) => None,
        Err(err) => Some(Decoded::Dropped(err)),
    }
}

fn decode_payload(payload: &str) -> Result<Option<StreamEvent>, FrameError> {
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| FrameError::Malformed(e.to_string()))?;
    let Some(kind) = value.get("type").and_then(|v| v.as_str()) else {
        debug!("ignoring data frame without a type");
        return Ok(None);
    };
    match kind {
        "chunk" | "tool_call" | "complete" => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| FrameError::Malformed(e.to_string())),
        other => {
            debug!(frame_type = other, "ignoring unknown frame type");
            Ok(None)
        }
    }
}

/// Serializes one event as a wire frame, including the blank separator line.
pub fn encode_event(event: &StreamEvent) -> Result<String, ChatError> {
    let json = serde_json::to_string(event)
        .map_err(|e| ChatError::protocol(format!("failed to encode frame: {e}")))?;
    Ok(format!("{DATA_PREFIX}{json}\n\n"))
}

/// Replays a finished response as the frame sequence the server streams.
///
/// Order: one `tool_call` frame per tool call, the message in chunks of five
/// space-separated words (each followed by a space), the `complete` frame,
/// then `[DONE]`.
pub fn encode_response(response: &ChatResponse) -> Result<Vec<String>, ChatError> {
    let mut frames = Vec::new();
    for tool_call in &response.tool_calls {
        frames.push(encode_event(&StreamEvent::ToolCall {
            tool_call: tool_call.clone(),
        })?);
    }

    let words: Vec<&str> = response.message.split(' ').collect();
    let mut chunk = String::new();
    for (i, word) in words.iter().enumerate() {
        chunk.push_str(word);
        chunk.push(' ');
        if i % WORDS_PER_CHUNK == WORDS_PER_CHUNK - 1 || i == words.len() - 1 {
            frames.push(encode_event(&StreamEvent::Chunk {
                content: std::mem::take(&mut chunk),
            })?);
        }
    }

    frames.push(encode_event(&StreamEvent::Complete {
        response: response.clone(),
    })?);
    frames.push(format!("{DATA_PREFIX}{DONE_SENTINEL}\n\n"));
    Ok(frames)
}
