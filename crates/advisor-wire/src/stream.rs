//! Line-protocol stream reader
//!
//! The chat endpoint answers with newline-delimited lines. Lines starting with
//! `data:` carry one JSON record each; everything else is ignored. Decoding is
//! lenient: a malformed line is logged and skipped instead of ending the turn.

use std::pin::Pin;

use async_stream::stream;
use futures::StreamExt;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::types::WireEvent;

/// Marker that prefixes a payload-carrying line
pub const DATA_MARKER: &str = "data:";

/// Payload that closes the stream early
pub const DONE_SENTINEL: &str = "[DONE]";

/// A stream of decoded wire events.
///
/// Ends when the body closes. On cancellation it yields a single
/// `Err(Error::Aborted)` and ends.
pub type WireEventStream = Pin<Box<dyn Stream<Item = Result<WireEvent>> + Send>>;

/// Splits arriving bytes into complete lines.
///
/// Bytes are kept until a newline arrives, so multi-byte characters split across
/// network chunks decode intact.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Take the trailing unterminated line, if any
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let mut rest = std::mem::take(&mut self.pending);
        if rest.last() == Some(&b'\r') {
            rest.pop();
        }
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}

/// Outcome of interpreting one line
#[derive(Debug, PartialEq, Eq)]
pub enum LineRecord {
    /// A decoded event
    Event(WireEvent),
    /// The `[DONE]` sentinel
    Done,
    /// Not a data line, empty, unrecognised or malformed
    Skip,
}

/// Interpret a single line of the response body
pub fn parse_line(line: &str) -> LineRecord {
    let Some(payload) = line.strip_prefix(DATA_MARKER) else {
        return LineRecord::Skip;
    };
    let payload = payload.strip_prefix(' ').unwrap_or(payload).trim_end();

    if payload.is_empty() {
        return LineRecord::Skip;
    }
    if payload == DONE_SENTINEL {
        return LineRecord::Done;
    }

    match WireEvent::decode(payload) {
        Ok(Some(event)) => LineRecord::Event(event),
        Ok(None) => {
            tracing::debug!(payload, "ignoring unrecognised stream record");
            LineRecord::Skip
        }
        Err(e) => {
            tracing::warn!(payload, error = %e, "skipping malformed stream line");
            LineRecord::Skip
        }
    }
}

enum Next<T> {
    Cancelled,
    Chunk(Option<T>),
}

/// Decode a byte stream into wire events.
///
/// Events are yielded strictly in arrival order. The cancellation token is checked
/// while waiting for bytes and before every yielded event.
pub fn read_events<S, B>(body: S, cancel: CancellationToken) -> WireEventStream
where
    S: Stream<Item = Result<B>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    Box::pin(stream! {
        let mut body = Box::pin(body);
        let mut lines = LineBuffer::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => Next::Cancelled,
                chunk = body.next() => Next::Chunk(chunk),
            };

            match next {
                Next::Cancelled => {
                    yield Err(Error::Aborted);
                    return;
                }
                Next::Chunk(Some(Ok(chunk))) => {
                    for line in lines.push(chunk.as_ref()) {
                        if cancel.is_cancelled() {
                            yield Err(Error::Aborted);
                            return;
                        }
                        match parse_line(&line) {
                            LineRecord::Event(event) => yield Ok(event),
                            LineRecord::Done => return,
                            LineRecord::Skip => {}
                        }
                    }
                }
                Next::Chunk(Some(Err(e))) => {
                    yield Err(e);
                    return;
                }
                Next::Chunk(None) => break,
            }
        }

        if let Some(line) = lines.finish() {
            if cancel.is_cancelled() {
                yield Err(Error::Aborted);
                return;
            }
            if let LineRecord::Event(event) = parse_line(&line) {
                yield Ok(event);
            }
        }
    })
}
