//! Line-oriented frame decoding.
//!
//! A `FrameReader` pulls one line at a time from an `AsyncBufRead` and classifies it:
//! blank lines separate frames and are dropped, comment lines are keep-alives,
//! `data:` lines yield their trimmed remainder, and the terminal sentinel ends the
//! feed. Anything else (`event:`, `id:`, `retry:`, unknown directives) is ignored.

use std::fmt;

use futures::TryStreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::io::StreamReader;

use crate::error::LlmError;
use crate::streaming::FrameStream;
use crate::utils::cancel::CancelHandle;

/// Wire conventions of a line-oriented event feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameProtocol {
    /// Prefix of lines carrying a payload.
    pub data_prefix: String,
    /// Prefix of keep-alive lines.
    pub comment_prefix: String,
    /// Payload that ends the feed.
    pub terminal: String,
}

impl Default for FrameProtocol {
    fn default() -> Self {
        Self::sse()
    }
}

impl FrameProtocol {
    /// Server-sent events as emitted by OpenAI-style APIs.
    pub fn sse() -> Self {
        Self {
            data_prefix: "data:".to_string(),
            comment_prefix: ":".to_string(),
            terminal: "[DONE]".to_string(),
        }
    }

    pub fn with_data_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.data_prefix = prefix.into();
        self
    }

    pub fn with_comment_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.comment_prefix = prefix.into();
        self
    }

    pub fn with_terminal(mut self, terminal: impl Into<String>) -> Self {
        self.terminal = terminal.into();
        self
    }

    fn classify<'a>(&self, line: &'a str) -> Line<'a> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Line::Boundary;
        }
        if line.starts_with(self.comment_prefix.as_str()) {
            return Line::KeepAlive;
        }
        match line.strip_prefix(self.data_prefix.as_str()) {
            Some(rest) => {
                let payload = rest.trim();
                if payload == self.terminal {
                    Line::Terminal
                } else if payload.is_empty() {
                    Line::Boundary
                } else {
                    Line::Data(payload)
                }
            }
            None => Line::Ignored,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Boundary,
    KeepAlive,
    Data(&'a str),
    Terminal,
    Ignored,
}

/// Decodes frames from a buffered reader.
///
/// The sequence is not restartable: once the sentinel, end-of-stream or a read
/// error has been observed, `next_frame` keeps returning `Ok(None)`.
pub struct FrameReader<R> {
    reader: R,
    protocol: FrameProtocol,
    line: Vec<u8>,
    finished: bool,
}

impl<R> fmt::Debug for FrameReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameReader")
            .field("protocol", &self.protocol)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<R> FrameReader<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self::with_protocol(reader, FrameProtocol::default())
    }

    pub fn with_protocol(reader: R, protocol: FrameProtocol) -> Self {
        Self {
            reader,
            protocol,
            line: Vec::new(),
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Read until the next data frame.
    ///
    /// Blocks only on the underlying read; at most one line is buffered. A line
    /// that is not valid UTF-8 is skipped like any other unusable line.
    pub async fn next_frame(&mut self) -> Result<Option<String>, LlmError> {
        if self.finished {
            return Ok(None);
        }

        loop {
            self.line.clear();
            let read = match self.reader.read_until(b'\n', &mut self.line).await {
                Ok(read) => read,
                Err(e) => {
                    self.finished = true;
                    return Err(e.into());
                }
            };

            if read == 0 {
                tracing::debug!("frame feed closed without terminal sentinel");
                self.finished = true;
                return Ok(None);
            }

            let line = match std::str::from_utf8(&self.line) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, len = self.line.len(), "skipping line that is not valid UTF-8");
                    continue;
                }
            };

            match self.protocol.classify(line) {
                Line::Data(payload) => return Ok(Some(payload.to_string())),
                Line::Terminal => {
                    tracing::debug!("terminal sentinel received");
                    self.finished = true;
                    return Ok(None);
                }
                Line::Boundary | Line::KeepAlive => {}
                Line::Ignored => {
                    tracing::trace!(line = %line.trim_end(), "ignoring unrecognized line");
                }
            }
        }
    }
}

impl<R> FrameReader<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    /// Turn the reader into a lazy frame stream bound to `cancel`.
    ///
    /// A cancel interrupts a pending read and yields a single `LlmError::Cancelled`.
    pub fn into_stream(mut self, cancel: CancelHandle) -> FrameStream {
        let frames = async_stream::stream! {
            loop {
                match cancel.run(self.next_frame()).await {
                    Ok(Ok(Some(frame))) => yield Ok(frame),
                    Ok(Ok(None)) => break,
                    Ok(Err(e)) | Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        };
        Box::pin(frames)
    }
}

/// Decode frames from a stream of byte chunks (e.g. `reqwest::Response::bytes_stream`).
pub fn frames_from_byte_stream<S, B, E>(
    byte_stream: S,
    protocol: FrameProtocol,
    cancel: CancelHandle,
) -> FrameStream
where
    S: futures::Stream<Item = Result<B, E>> + Send + 'static,
    B: bytes::Buf + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let byte_stream = Box::pin(byte_stream.map_err(std::io::Error::other));
    let reader = StreamReader::new(byte_stream);
    FrameReader::with_protocol(reader, protocol).into_stream(cancel)
}
