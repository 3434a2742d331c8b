use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use quarry_blob::Blob;
use quarry_io::{read_file, IoConfig, IoError, SymlinkPolicy};
use tempfile::NamedTempFile;
use quarry_types::{validate_hash_name, ArtifactId};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::traits::{open, seal, ContentStore};

/// Artifact store in a directory tree.
///
/// Each artifact is one file holding its envelope, at
/// `<root>/<first two hex digits>/<remaining hex digits>` of its ID.
/// Each write goes to its own uniquely named temporary file in the shard
/// directory and is renamed into place, so a reader never sees a partly
/// written envelope and concurrent writers of the same artifact never share
/// a file. Symbolic links in the tree are followed on read.
#[derive(Debug)]
pub struct DirContentStore {
    root: PathBuf,
    config: StoreConfig,
}

impl DirContentStore {
    /// Open the store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>, config: StoreConfig) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, config })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the envelope for `id` lives.
    pub fn path_for(&self, id: &ArtifactId) -> PathBuf {
        let hex = id.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }
}

impl ContentStore for DirContentStore {
    fn put(&self, content: &Blob<'_>) -> StoreResult<ArtifactId> {
        let (id, envelope) = seal(&self.config, content);
        let path = self.path_for(&id);
        if path.exists() {
            debug!(%id, "artifact already stored");
            return Ok(id);
        }
        let shard = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(shard)?;
        let mut tmp = NamedTempFile::new_in(shard)?;
        tmp.write_all(envelope.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;
        debug!(%id, size = content.len(), stored = envelope.len(), "stored artifact");
        Ok(id)
    }

    fn get(&self, id: &ArtifactId) -> StoreResult<Option<Blob<'static>>> {
        let mut envelope = Blob::new();
        let path = self.path_for(id);
        match read_file(&mut envelope, &path, SymlinkPolicy::Follow, &IoConfig::default()) {
            Ok(_) => {}
            Err(IoError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        open(&self.config, id, &envelope).map(Some).inspect_err(|e| {
            warn!(%id, error = %e, "unreadable artifact");
        })
    }

    fn exists(&self, id: &ArtifactId) -> StoreResult<bool> {
        Ok(self.path_for(id).is_file())
    }

    fn delete(&self, id: &ArtifactId) -> StoreResult<bool> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn len(&self) -> StoreResult<usize> {
        let mut count = 0;
        for shard in fs::read_dir(&self.root)? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            let prefix = shard.file_name();
            for entry in fs::read_dir(shard.path())? {
                let name = entry?.file_name();
                let mut full = prefix.clone();
                full.push(&name);
                if validate_hash_name(full.as_encoded_bytes()).is_some() {
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use quarry_types::HashAlgorithm;

    fn store() -> (tempfile::TempDir, DirContentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DirContentStore::open(dir.path().join("artifacts"), StoreConfig::default()).unwrap();
        (dir, store)
    }

    #[test]
    fn put_get_round_trip() {
        let (_dir, store) = store();
        let id = store.put(&Blob::borrowed(b"file content\n")).unwrap();
        let back = store.get(&id).unwrap().expect("should exist");
        assert_eq!(back.as_bytes(), b"file content\n");
    }

    #[test]
    fn layout_is_sharded_by_prefix() {
        let (_dir, store) = store();
        let id = store.put(&Blob::borrowed(b"sharded")).unwrap();
        let hex = id.to_hex();
        let path = store.root().join(&hex[..2]).join(&hex[2..]);
        assert!(path.is_file());
    }

    #[test]
    fn put_leaves_no_temporary_files() {
        let (_dir, store) = store();
        let id = store.put(&Blob::borrowed(b"tidy")).unwrap();
        let shard = store.path_for(&id).parent().unwrap().to_path_buf();
        assert_eq!(fs::read_dir(shard).unwrap().count(), 1);
    }

    #[test]
    fn concurrent_puts_of_same_content() {
        let (_dir, store) = store();
        let content = vec![b'q'; 256 * 1024];
        let expected = ArtifactId::compute(HashAlgorithm::Sha3_256, &content);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let id = store.put(&Blob::borrowed(&content)).unwrap();
                    assert_eq!(id, expected);
                    if let Some(back) = store.get(&id).unwrap() {
                        assert_eq!(back.as_bytes(), &content[..]);
                    }
                });
            }
        });
        assert_eq!(store.get(&expected).unwrap().unwrap().as_bytes(), &content[..]);
        assert_eq!(store.len().unwrap(), 1);
        let shard = store.path_for(&expected).parent().unwrap().to_path_buf();
        assert_eq!(fs::read_dir(shard).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn linked_artifact_is_followed() {
        let (dir, store) = store();
        let id = store.put(&Blob::borrowed(b"behind a link")).unwrap();
        let path = store.path_for(&id);
        let moved = dir.path().join("elsewhere");
        fs::rename(&path, &moved).unwrap();
        std::os::unix::fs::symlink(&moved, &path).unwrap();
        assert_eq!(store.get(&id).unwrap().unwrap().as_bytes(), b"behind a link");
    }

    #[test]
    fn put_is_idempotent() {
        let (_dir, store) = store();
        let a = store.put(&Blob::borrowed(b"twice")).unwrap();
        let b = store.put(&Blob::borrowed(b"twice")).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn missing_artifact_is_none() {
        let (_dir, store) = store();
        let id = ArtifactId::compute(HashAlgorithm::Sha3_256, b"absent");
        assert!(store.get(&id).unwrap().is_none());
        assert!(!store.exists(&id).unwrap());
        assert!(!store.delete(&id).unwrap());
    }

    #[test]
    fn delete_removes_file() {
        let (_dir, store) = store();
        let id = store.put(&Blob::borrowed(b"temporary")).unwrap();
        assert!(store.delete(&id).unwrap());
        assert!(!store.path_for(&id).exists());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn len_ignores_stray_files() {
        let (_dir, store) = store();
        store.put(&Blob::borrowed(b"one")).unwrap();
        store.put(&Blob::borrowed(b"two")).unwrap();
        fs::write(store.root().join("README"), b"not an artifact").unwrap();
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn corrupted_file_is_detected() {
        let (_dir, store) = store();
        let id = store.put(&Blob::borrowed(b"precious")).unwrap();
        let path = store.path_for(&id);
        let mut bytes = fs::read(&path).unwrap();
        bytes[4] ^= 0xFF;
        fs::write(&path, bytes).unwrap();
        assert!(matches!(store.get(&id), Err(StoreError::Corrupt { .. })));
    }
}
