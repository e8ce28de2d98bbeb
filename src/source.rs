//! Where raw score-event messages come from.
//!
//! The ingest loop pulls one message at a time through [`EventSource`]. A
//! source ends by returning [`Error::UpstreamClosed`], which the loop treats
//! as a clean stop.

use crate::error::Error;
use crossbeam_channel::{Receiver, Sender};
use std::io::BufRead;

/// Event name the SSE protocol assigns to frames without an `event:` line.
pub const DEFAULT_SSE_EVENT: &str = "message";

/// A sequential producer of raw message payloads.
pub trait EventSource {
    /// Block until the next payload is available.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UpstreamClosed`] once the source has ended, or
    /// [`Error::Io`] if reading from the underlying transport failed.
    fn next_message(&mut self) -> Result<Vec<u8>, Error>;
}

impl<S: EventSource + ?Sized> EventSource for &mut S {
    fn next_message(&mut self) -> Result<Vec<u8>, Error> {
        (**self).next_message()
    }
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn next_message(&mut self) -> Result<Vec<u8>, Error> {
        (**self).next_message()
    }
}

/// The receiving half of a [`channel`]. Closes once every sender is dropped.
impl EventSource for Receiver<Vec<u8>> {
    fn next_message(&mut self) -> Result<Vec<u8>, Error> {
        self.recv().map_err(|_| Error::UpstreamClosed)
    }
}

/// An unbounded in-process event channel.
///
/// The producer pushes raw payloads into the [`Sender`]; the [`Receiver`]
/// is handed to the ingest loop. Dropping every sender shuts the loop down.
pub fn channel() -> (Sender<Vec<u8>>, Receiver<Vec<u8>>) {
    crossbeam_channel::unbounded()
}

/// Reads a Server-Sent-Events stream and yields the data of each frame.
///
/// `data:` lines of one frame are joined with `\n`, `event:` names the
/// frame, comment lines (leading `:`) and `id:`/`retry:` are ignored, and a
/// blank line dispatches the frame. When a filter is set, frames with a
/// different event name are skipped. End of input closes the source; a
/// frame that was never terminated by a blank line is dropped.
///
/// # Examples
///
/// ```
/// use scorefold::{EventSource, SseSource};
///
/// let stream = "event: score\ndata: {\"studentId\":\"a\",\"exam\":1,\"score\":0.5}\n\n";
/// let mut source = SseSource::new(stream.as_bytes()).with_event_name("score");
/// let payload = source.next_message().unwrap();
/// assert_eq!(payload, br#"{"studentId":"a","exam":1,"score":0.5}"#);
/// assert!(source.next_message().is_err());
/// ```
#[derive(Debug)]
pub struct SseSource<R> {
    reader: R,
    event_name: Option<String>,
    line: Vec<u8>,
}

#[derive(Default)]
struct Frame {
    event: Option<String>,
    data: Option<Vec<u8>>,
}

impl Frame {
    fn push_data(&mut self, value: &[u8]) {
        match &mut self.data {
            Some(data) => {
                data.push(b'\n');
                data.extend_from_slice(value);
            }
            None => self.data = Some(value.to_vec()),
        }
    }

    fn matches(&self, filter: Option<&str>) -> bool {
        match filter {
            None => true,
            Some(name) => self.event.as_deref().unwrap_or(DEFAULT_SSE_EVENT) == name,
        }
    }
}

impl<R: BufRead> SseSource<R> {
    pub fn new(reader: R) -> Self {
        SseSource {
            reader,
            event_name: None,
            line: Vec::new(),
        }
    }

    /// Only yield frames whose event name is `name`.
    pub fn with_event_name(mut self, name: impl Into<String>) -> Self {
        self.event_name = Some(name.into());
        self
    }

    /// Apply an optional filter, as carried by [`Config::event_name`](crate::Config).
    pub fn with_filter(mut self, name: Option<String>) -> Self {
        self.event_name = name;
        self
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

// Lines are handled as raw bytes: a payload that is not UTF-8 is passed on
// for the decoder to reject, it does not fail the read.
impl<R: BufRead> EventSource for SseSource<R> {
    fn next_message(&mut self) -> Result<Vec<u8>, Error> {
        let mut frame = Frame::default();
        loop {
            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line)? == 0 {
                return Err(Error::UpstreamClosed);
            }

            let mut line = self.line.as_slice();
            while let [rest @ .., b'\n' | b'\r'] = line {
                line = rest;
            }
            if line.is_empty() {
                let done = std::mem::take(&mut frame);
                if done.matches(self.event_name.as_deref()) {
                    if let Some(data) = done.data {
                        return Ok(data);
                    }
                }
                continue;
            }
            if line[0] == b':' {
                continue;
            }

            let (field, value) = match line.iter().position(|&b| b == b':') {
                Some(i) => {
                    let value = &line[i + 1..];
                    (&line[..i], value.strip_prefix(b" ").unwrap_or(value))
                }
                None => (line, &[][..]),
            };
            match field {
                b"event" => frame.event = Some(String::from_utf8_lossy(value).into_owned()),
                b"data" => frame.push_data(value),
                _ => {}
            }
        }
    }
}

/// Reads one JSON payload per line, skipping blank lines. Handy for
/// replaying a recorded stream.
#[derive(Debug)]
pub struct JsonLinesSource<R> {
    reader: R,
    line: Vec<u8>,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        JsonLinesSource {
            reader,
            line: Vec::new(),
        }
    }
}

impl<R: BufRead> EventSource for JsonLinesSource<R> {
    fn next_message(&mut self) -> Result<Vec<u8>, Error> {
        loop {
            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line)? == 0 {
                return Err(Error::UpstreamClosed);
            }
            if !self.line.trim_ascii().is_empty() {
                return Ok(self.line.trim_ascii().to_vec());
            }
        }
    }
}
