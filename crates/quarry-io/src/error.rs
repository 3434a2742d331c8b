use std::io;
use std::path::PathBuf;

/// Errors from the file and stream adapters.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("cannot open file: {0}")]
    NotFound(PathBuf),

    /// Fewer bytes reached the file than were handed to the writer.
    #[error("short write to {path}: {written} of {expected} bytes")]
    ShortWrite {
        path: PathBuf,
        written: usize,
        expected: usize,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type IoResult<T> = Result<T, IoError>;
