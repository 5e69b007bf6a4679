//! Incremental decoder for `text/event-stream` bodies.
//!
//! Chunks arrive at arbitrary byte boundaries, so the decoder buffers
//! partial lines and yields complete events only. Comment lines (`:` prefix)
//! are how servers send keep-alives; they never produce an event.

use bytes::{Buf, BytesMut};

/// One dispatched server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: BytesMut,
    skip_lf: bool,
    data: String,
    has_data: bool,
    event: Option<String>,
    id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the response body and collect the events it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();

        loop {
            // A CR line ending may have its LF in the next chunk.
            if self.skip_lf {
                match self.buf.first() {
                    Some(b'\n') => {
                        self.buf.advance(1);
                        self.skip_lf = false;
                    }
                    Some(_) => self.skip_lf = false,
                    None => {}
                }
            }

            let Some(pos) = self.buf.iter().position(|b| *b == b'\n' || *b == b'\r') else {
                break;
            };
            let line = self.buf.split_to(pos);
            if self.buf.first() == Some(&b'\r') {
                self.skip_lf = true;
            }
            self.buf.advance(1);

            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            "event" => self.event = Some(value.to_owned()),
            "id" => self.id = Some(value.to_owned()),
            // `retry` is ignored: reconnect timing belongs to the caller.
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if !self.has_data {
            return None;
        }
        self.has_data = false;
        Some(SseEvent {
            event,
            id: self.id.clone(),
            data: std::mem::take(&mut self.data),
        })
    }
}
