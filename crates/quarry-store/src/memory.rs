use std::collections::HashMap;
use std::sync::RwLock;

use quarry_blob::Blob;
use quarry_types::ArtifactId;

use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::traits::{open, seal, ContentStore};

/// In-memory, HashMap-based artifact store.
///
/// Intended for tests and embedding. Envelopes are held behind a `RwLock`
/// for safe concurrent access.
pub struct InMemoryContentStore {
    envelopes: RwLock<HashMap<ArtifactId, Vec<u8>>>,
    config: StoreConfig,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            envelopes: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Total bytes of compressed envelopes held.
    pub fn total_bytes(&self) -> usize {
        self.envelopes
            .read()
            .expect("lock poisoned")
            .values()
            .map(Vec::len)
            .sum()
    }

    /// All stored IDs, sorted.
    pub fn all_ids(&self) -> Vec<ArtifactId> {
        let map = self.envelopes.read().expect("lock poisoned");
        let mut ids: Vec<ArtifactId> = map.keys().copied().collect();
        ids.sort();
        ids
    }

    #[cfg(test)]
    fn replace_envelope(&self, id: ArtifactId, envelope: Vec<u8>) {
        self.envelopes.write().expect("lock poisoned").insert(id, envelope);
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for InMemoryContentStore {
    fn put(&self, content: &Blob<'_>) -> StoreResult<ArtifactId> {
        let (id, envelope) = seal(&self.config, content);
        let mut map = self.envelopes.write().expect("lock poisoned");
        map.entry(id).or_insert_with(|| envelope.into_vec());
        Ok(id)
    }

    fn get(&self, id: &ArtifactId) -> StoreResult<Option<Blob<'static>>> {
        let map = self.envelopes.read().expect("lock poisoned");
        match map.get(id) {
            Some(envelope) => open(&self.config, id, &Blob::borrowed(envelope)).map(Some),
            None => Ok(None),
        }
    }

    fn exists(&self, id: &ArtifactId) -> StoreResult<bool> {
        Ok(self.envelopes.read().expect("lock poisoned").contains_key(id))
    }

    fn delete(&self, id: &ArtifactId) -> StoreResult<bool> {
        Ok(self.envelopes.write().expect("lock poisoned").remove(id).is_some())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.envelopes.read().expect("lock poisoned").len())
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.envelopes.read().map(|m| m.len()).unwrap_or_default();
        f.debug_struct("InMemoryContentStore")
            .field("artifact_count", &count)
            .field("algorithm", &self.config.algorithm)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use quarry_compress::compress;
    use quarry_types::HashAlgorithm;

    #[test]
    fn put_and_get() {
        let store = InMemoryContentStore::new();
        let id = store.put(&Blob::borrowed(b"hello world")).unwrap();
        assert_eq!(id.algorithm(), HashAlgorithm::Sha3_256);
        let back = store.get(&id).unwrap().expect("should exist");
        assert_eq!(back.as_bytes(), b"hello world");
    }

    #[test]
    fn same_content_same_id() {
        let store = InMemoryContentStore::new();
        let a = store.put(&Blob::borrowed(b"identical")).unwrap();
        let b = store.put(&Blob::from_vec(b"identical".to_vec())).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn envelopes_are_compressed() {
        let store = InMemoryContentStore::new();
        store.put(&Blob::borrowed(&[b'z'; 10_000])).unwrap();
        assert!(store.total_bytes() < 1_000);
    }

    #[test]
    fn sha1_config() {
        let store = InMemoryContentStore::with_config(StoreConfig {
            algorithm: HashAlgorithm::Sha1,
            ..StoreConfig::default()
        });
        let id = store.put(&Blob::new()).unwrap();
        assert_eq!(id.to_hex(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert!(store.get(&id).unwrap().unwrap().is_empty());
    }

    #[test]
    fn exists_and_delete() {
        let store = InMemoryContentStore::new();
        let id = store.put(&Blob::borrowed(b"short-lived")).unwrap();
        assert!(store.exists(&id).unwrap());
        assert!(store.delete(&id).unwrap());
        assert!(!store.exists(&id).unwrap());
        assert!(!store.delete(&id).unwrap());
        assert!(store.get(&id).unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn get_required_reports_missing() {
        let store = InMemoryContentStore::new();
        let id = ArtifactId::compute(HashAlgorithm::Sha3_256, b"never stored");
        assert!(matches!(store.get_required(&id), Err(StoreError::NotFound(missing)) if missing == id));
    }

    #[test]
    fn tampered_content_is_rejected() {
        let store = InMemoryContentStore::new();
        let id = store.put(&Blob::borrowed(b"original")).unwrap();
        store.replace_envelope(id, compress(&Blob::borrowed(b"tampered")).into_vec());
        assert!(matches!(store.get(&id), Err(StoreError::HashMismatch { .. })));
    }

    #[test]
    fn tampering_passes_without_verification() {
        let store = InMemoryContentStore::with_config(StoreConfig {
            verify_reads: false,
            ..StoreConfig::default()
        });
        let id = store.put(&Blob::borrowed(b"original")).unwrap();
        store.replace_envelope(id, compress(&Blob::borrowed(b"tampered")).into_vec());
        assert_eq!(store.get(&id).unwrap().unwrap().as_bytes(), b"tampered");
    }

    #[test]
    fn corrupt_envelope_is_reported() {
        let store = InMemoryContentStore::new();
        let id = store.put(&Blob::borrowed(b"original")).unwrap();
        store.replace_envelope(id, b"\0\0\0\x08garbage!".to_vec());
        assert!(matches!(store.get(&id), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn all_ids_sorted() {
        let store = InMemoryContentStore::new();
        for word in ["c", "a", "b"] {
            store.put(&Blob::from(word)).unwrap();
        }
        let ids = store.all_ids();
        assert_eq!(ids.len(), 3);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}
