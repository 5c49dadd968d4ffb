//! Decoder for the chat stream's line-delimited `data:` frames.
//!
//! The backend writes one JSON object per line, prefixed with `data: `.
//! Network chunks do not respect line boundaries (or UTF-8 boundaries), so the
//! decoder keeps raw bytes until a full line is available.

use memchr::memchr;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// Text to append to the reply so far.
    Content(String),
    /// Backend-reported failure; replaces whatever text has accumulated.
    Error(String),
    /// Terminal frame. Nothing after it is read.
    Done,
}

#[derive(Deserialize)]
struct FramePayload {
    content: Option<String>,
    error: Option<String>,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    finished: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a `done` frame has been decoded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed one network chunk, returning every frame completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamFrame> {
        let mut frames = Vec::new();
        if self.finished {
            return frames;
        }

        self.buffer.extend_from_slice(chunk);
        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            self.decode_line(&line[..newline_pos], &mut frames);
            if self.finished {
                self.buffer.clear();
                break;
            }
        }
        frames
    }

    /// Flush a trailing line that was never newline-terminated.
    pub fn finish(&mut self) -> Vec<StreamFrame> {
        let mut frames = Vec::new();
        if self.finished || self.buffer.is_empty() {
            self.buffer.clear();
            return frames;
        }
        let line = std::mem::take(&mut self.buffer);
        self.decode_line(&line, &mut frames);
        frames
    }

    fn decode_line(&mut self, raw: &[u8], frames: &mut Vec<StreamFrame>) {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim(),
            Err(err) => {
                tracing::debug!(error = %err, "skipping stream line with invalid UTF-8");
                return;
            }
        };

        let Some(payload) = line.strip_prefix("data:").map(str::trim_start) else {
            return;
        };

        let payload = match serde_json::from_str::<FramePayload>(payload) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::debug!(error = %err, "skipping unparseable stream frame");
                return;
            }
        };

        if let Some(error) = payload.error.filter(|e| !e.is_empty()) {
            frames.push(StreamFrame::Error(error));
        }
        if let Some(content) = payload.content.filter(|c| !c.is_empty()) {
            frames.push(StreamFrame::Content(content));
        }
        if payload.done {
            frames.push(StreamFrame::Done);
            self.finished = true;
        }
    }
}
