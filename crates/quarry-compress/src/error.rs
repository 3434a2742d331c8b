use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("corrupt compressed stream: {0}")]
    Corrupt(String),

    #[error("stream inflates past its declared length of {declared} bytes")]
    LengthMismatch { declared: usize },

    #[error("declared length of {declared} bytes exceeds the blob size limit")]
    DeclaredTooLarge { declared: usize },
}

pub type CompressResult<T> = Result<T, CompressError>;
