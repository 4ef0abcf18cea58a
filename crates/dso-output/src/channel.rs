//! The open output resource bound to one run.
//!
//! An [`OutputChannel`] owns exactly one buffered stream matched to the
//! configured output kind; the other variant is structurally absent.  The
//! stream is flushed and closed exactly once, on [`close`][OutputChannel::close]
//! or on drop, whichever comes first.  A channel whose file cannot be opened
//! is never constructed at all, so there is no half-open state to tear down.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::OutputConfig;
use crate::error::{OutputError, OutputResult};

// ── OutputKind ────────────────────────────────────────────────────────────────

/// The output kinds this crate ships backends for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputKind {
    /// Binary event-stream container.
    Structured,
    /// Line-oriented human-readable records.
    Text,
}

impl OutputKind {
    pub const ALL: [OutputKind; 2] = [OutputKind::Structured, OutputKind::Text];

    pub fn as_str(self) -> &'static str {
        match self {
            OutputKind::Structured => "structured",
            OutputKind::Text       => "text",
        }
    }

    /// Parse a configured kind identifier.
    pub fn parse(s: &str) -> OutputResult<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| OutputError::UnknownKind {
                requested: s.to_owned(),
                known:     Self::known_kinds(),
            })
    }

    /// Comma-separated list of the known kind identifiers, for error text.
    pub fn known_kinds() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── OutputChannel ─────────────────────────────────────────────────────────────

#[derive(Debug)]
enum ChannelStream {
    Text(BufWriter<File>),
    Structured(BufWriter<File>),
    Closed,
}

/// The open output resource for one run: resolved kind, destination path,
/// and the single matching stream.
#[derive(Debug)]
pub struct OutputChannel {
    kind:   OutputKind,
    path:   PathBuf,
    stream: ChannelStream,
}

impl OutputChannel {
    /// Resolve the configured kind and open the destination file.
    ///
    /// Fails with [`OutputError::UnknownKind`] for an unrecognized kind and
    /// with [`OutputError::Io`] if the file cannot be created.
    pub fn open(config: &OutputConfig) -> OutputResult<Self> {
        let kind = OutputKind::parse(&config.kind)?;
        let file = File::create(&config.path)?;
        let writer = BufWriter::new(file);
        let stream = match kind {
            OutputKind::Text       => ChannelStream::Text(writer),
            OutputKind::Structured => ChannelStream::Structured(writer),
        };
        tracing::debug!(kind = %kind, path = %config.path.display(), "output channel opened");
        Ok(Self { kind, path: config.path.clone(), stream })
    }

    pub fn kind(&self) -> OutputKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The text stream.  Fails if this channel is structured or closed.
    pub fn text(&mut self) -> OutputResult<&mut BufWriter<File>> {
        match &mut self.stream {
            ChannelStream::Text(w) => Ok(w),
            ChannelStream::Structured(_) => Err(OutputError::Channel(
                "text stream requested from a structured channel".to_owned(),
            )),
            ChannelStream::Closed => Err(OutputError::Channel("channel is closed".to_owned())),
        }
    }

    /// The structured (binary) stream.  Fails if this channel is text or closed.
    pub fn structured(&mut self) -> OutputResult<&mut BufWriter<File>> {
        match &mut self.stream {
            ChannelStream::Structured(w) => Ok(w),
            ChannelStream::Text(_) => Err(OutputError::Channel(
                "structured stream requested from a text channel".to_owned(),
            )),
            ChannelStream::Closed => Err(OutputError::Channel("channel is closed".to_owned())),
        }
    }

    /// Flush and close the stream.  Idempotent — a second call is a no-op.
    pub fn close(&mut self) -> OutputResult<()> {
        match std::mem::replace(&mut self.stream, ChannelStream::Closed) {
            ChannelStream::Text(mut w) | ChannelStream::Structured(mut w) => {
                w.flush()?;
                tracing::debug!(path = %self.path.display(), "output channel closed");
                Ok(())
            }
            ChannelStream::Closed => Ok(()),
        }
    }
}

impl Drop for OutputChannel {
    /// Best-effort flush on every exit path.  Errors are swallowed here;
    /// callers that need to observe them use [`close`][Self::close].
    fn drop(&mut self) {
        if let ChannelStream::Text(w) | ChannelStream::Structured(w) = &mut self.stream {
            let _ = w.flush();
        }
    }
}
