//! Where generated bytes go.
//!
//! Code that renders output (reports, diffs, protocol replies) often does
//! not know whether its result will be buffered for later or sent straight
//! to the terminal. It writes into an [`Output`] and lets the caller decide.

use std::fmt;
use std::io::{self, Write};

use crate::blob::Blob;

/// A byte sink: either an in-memory [`Blob`] or a direct channel such as
/// standard output or a protocol response stream.
pub enum Output<'o, 'a> {
    Buffer(&'o mut Blob<'a>),
    Channel(&'o mut dyn io::Write),
}

impl<'o, 'a> Output<'o, 'a> {
    /// Append raw bytes. Writing into a buffer never fails.
    pub fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Self::Buffer(blob) => {
                blob.append(bytes);
                Ok(())
            }
            Self::Channel(w) => w.write_all(bytes),
        }
    }

    pub fn append_str(&mut self, text: &str) -> io::Result<()> {
        self.append(text.as_bytes())
    }

    /// Append formatted text. A buffer sink is marked as not pure SQL.
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        match self {
            Self::Buffer(blob) => {
                blob.append_fmt(args);
                Ok(())
            }
            Self::Channel(w) => w.write_fmt(args),
        }
    }

    /// Returns `true` if bytes are going to a buffer.
    pub fn is_buffered(&self) -> bool {
        matches!(self, Self::Buffer(_))
    }
}

impl<'o, 'a> From<&'o mut Blob<'a>> for Output<'o, 'a> {
    fn from(blob: &'o mut Blob<'a>) -> Self {
        Self::Buffer(blob)
    }
}

impl io::Write for Output<'_, '_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Buffer(blob) => blob.write(buf),
            Self::Channel(w) => w.write(buf),
        }
    }

    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.append_fmt(args)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Buffer(_) => Ok(()),
            Self::Channel(w) => w.flush(),
        }
    }
}
