use quarry_compress::CompressError;
use quarry_io::IoError;
use quarry_types::ArtifactId;

/// Errors from artifact store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested artifact was not found.
    #[error("artifact not found: {0}")]
    NotFound(ArtifactId),

    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for {id}: content hashes to {computed}")]
    HashMismatch { id: ArtifactId, computed: ArtifactId },

    /// The stored envelope does not decompress.
    #[error("corrupt artifact {id}: {source}")]
    Corrupt {
        id: ArtifactId,
        #[source]
        source: CompressError,
    },

    #[error("invalid store configuration: {0}")]
    Config(String),

    /// Failure in the file adapters of an on-disk store.
    #[error(transparent)]
    File(#[from] IoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
