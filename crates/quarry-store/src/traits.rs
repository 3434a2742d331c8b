use quarry_blob::Blob;
use quarry_compress::{compress, decompress};
use quarry_types::ArtifactId;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};

/// Content-addressed artifact store.
///
/// All implementations must satisfy these invariants:
/// - Artifacts are immutable once written: the same content always produces
///   the same ID, so a second `put` of it is a no-op.
/// - Artifacts are kept as compression envelopes; callers only ever see
///   the uncompressed content.
/// - With `verify_reads` set, content whose hash does not match its ID is
///   never returned.
pub trait ContentStore: Send + Sync {
    /// Store `content` and return its ID.
    fn put(&self, content: &Blob<'_>) -> StoreResult<ArtifactId>;

    /// Read an artifact. Returns `Ok(None)` if it does not exist.
    fn get(&self, id: &ArtifactId) -> StoreResult<Option<Blob<'static>>>;

    fn exists(&self, id: &ArtifactId) -> StoreResult<bool>;

    /// Delete an artifact. Returns `true` if it existed.
    fn delete(&self, id: &ArtifactId) -> StoreResult<bool>;

    /// Number of stored artifacts.
    fn len(&self) -> StoreResult<usize>;

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Like [`get`](ContentStore::get), but a missing artifact is an error.
    fn get_required(&self, id: &ArtifactId) -> StoreResult<Blob<'static>> {
        self.get(id)?.ok_or(StoreError::NotFound(*id))
    }
}

/// Hash `content` and wrap it in an envelope.
pub(crate) fn seal(config: &StoreConfig, content: &Blob<'_>) -> (ArtifactId, Blob<'static>) {
    let id = ArtifactId::compute(config.algorithm, content.as_bytes());
    (id, compress(content))
}

/// Unwrap the envelope stored under `id`, checking its hash when asked to.
pub(crate) fn open(
    config: &StoreConfig,
    id: &ArtifactId,
    envelope: &Blob<'_>,
) -> StoreResult<Blob<'static>> {
    let content = decompress(envelope).map_err(|source| StoreError::Corrupt { id: *id, source })?;
    if config.verify_reads && !id.verify(content.as_bytes()) {
        let computed = ArtifactId::compute(id.algorithm(), content.as_bytes());
        return Err(StoreError::HashMismatch { id: *id, computed });
    }
    Ok(content)
}
