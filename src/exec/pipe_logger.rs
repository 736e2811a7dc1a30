// src/exec/pipe_logger.rs

//! Line-streaming logger for the combined stdout/stderr of a child process.
//!
//! Bytes are split into lines as they arrive and handed to a [`LineSink`]
//! immediately; nothing beyond the current partial line is buffered.
//!
//! The read loop ends on end-of-stream. The runner additionally raises a
//! "writer closed" flag once the child has been reaped: from then on the
//! logger only drains what is still readable, so a detached grandchild that
//! inherited the pipe cannot keep the runner waiting forever.
//!
//! A trailing fragment without a final newline is flushed as a last line.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::logging::OUTPUT_TARGET;

/// How long the drain phase waits for more bytes after the writer side has
/// been reported closed.
pub const DRAIN_IDLE: Duration = Duration::from_millis(100);

const READ_CHUNK: usize = 8 * 1024;

/// One line of child output, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub program: String,
    pub pid: u32,
    pub text: String,
}

impl fmt::Display for OutputLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} (: {})] {}", self.program, self.pid, self.text)
    }
}

/// Destination for output lines.
pub trait LineSink: Send + Sync {
    fn emit(&self, line: OutputLine);
}

/// Production sink: every line becomes an `info` event on the
/// `provisioner::output` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LineSink for TracingSink {
    fn emit(&self, line: OutputLine) {
        info!(target: OUTPUT_TARGET, "{line}");
    }
}

/// Splits a byte stream into `\n`-terminated lines.
///
/// A `\r` directly before the newline is dropped. Invalid UTF-8 is replaced
/// lossily.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|b| *b == b'\n') {
            self.pending.extend_from_slice(&rest[..pos]);
            lines.push(take_line(&mut self.pending));
            rest = &rest[pos + 1..];
        }
        self.pending.extend_from_slice(rest);

        lines
    }

    /// The unterminated remainder, if any.
    pub fn finish(mut self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(take_line(&mut self.pending))
        }
    }
}

fn take_line(buf: &mut Vec<u8>) -> String {
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    let line = String::from_utf8_lossy(buf).into_owned();
    buf.clear();
    line
}

/// Streams one child's output into a sink.
pub struct PipeLogger {
    program: String,
    pid: u32,
    sink: Arc<dyn LineSink>,
}

impl PipeLogger {
    pub fn new(program: impl Into<String>, pid: u32, sink: Arc<dyn LineSink>) -> Self {
        Self {
            program: program.into(),
            pid,
            sink,
        }
    }

    /// Read `reader` until end-of-stream (or until `writer_closed` flips and
    /// the remaining bytes are drained). Returns the number of lines emitted.
    ///
    /// Read errors end the loop quietly; they never fail the command.
    pub async fn stream<R>(self, mut reader: R, mut writer_closed: watch::Receiver<bool>) -> usize
    where
        R: AsyncRead + Unpin,
    {
        let mut splitter = LineSplitter::new();
        let mut buf = vec![0u8; READ_CHUNK];
        let mut emitted = 0usize;
        let mut reached_eof = false;

        loop {
            tokio::select! {
                read = reader.read(&mut buf) => match read {
                    Ok(0) => {
                        reached_eof = true;
                        break;
                    }
                    Ok(n) => emitted += self.emit_all(splitter.push(&buf[..n])),
                    Err(e) => {
                        debug!(program = %self.program, pid = self.pid, error = %e, "output read failed; stopping");
                        reached_eof = true;
                        break;
                    }
                },
                _ = closed(&mut writer_closed) => break,
            }
        }

        if !reached_eof {
            emitted += self.drain(&mut reader, &mut splitter, &mut buf).await;
        }

        if let Some(last) = splitter.finish() {
            emitted += self.emit_all(vec![last]);
        }

        debug!(program = %self.program, pid = self.pid, lines = emitted, "output stream ended");
        emitted
    }

    async fn drain<R>(&self, reader: &mut R, splitter: &mut LineSplitter, buf: &mut [u8]) -> usize
    where
        R: AsyncRead + Unpin,
    {
        let mut emitted = 0usize;
        loop {
            match timeout(DRAIN_IDLE, reader.read(buf)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => emitted += self.emit_all(splitter.push(&buf[..n])),
                Ok(Err(e)) => {
                    debug!(program = %self.program, pid = self.pid, error = %e, "output read failed while draining");
                    break;
                }
                Err(_) => {
                    debug!(
                        program = %self.program,
                        pid = self.pid,
                        "process reaped but output pipe still open; stopping after drain"
                    );
                    break;
                }
            }
        }
        emitted
    }

    fn emit_all(&self, lines: Vec<String>) -> usize {
        let count = lines.len();
        for text in lines {
            self.sink.emit(OutputLine {
                program: self.program.clone(),
                pid: self.pid,
                text,
            });
        }
        count
    }
}

/// Resolves once the flag is `true` or the sender is gone.
async fn closed(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|closed| *closed).await;
}
