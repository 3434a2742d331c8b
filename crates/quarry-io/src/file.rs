use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use quarry_blob::Blob;
use tracing::debug;

use crate::config::IoConfig;
use crate::error::{IoError, IoResult};

const CHUNK: usize = 64 * 1024;

/// What [`read_file`] does when the path names a symbolic link.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SymlinkPolicy {
    /// Read the file the link points to.
    Follow,
    /// Read the link itself: the content is the target path.
    ReadLink,
    /// [`ReadLink`](Self::ReadLink) if `IoConfig::allow_symlinks` is set,
    /// [`Follow`](Self::Follow) otherwise.
    #[default]
    Configured,
}

impl SymlinkPolicy {
    fn follows(self, config: &IoConfig) -> bool {
        match self {
            Self::Follow => true,
            Self::ReadLink => false,
            Self::Configured => !config.allow_symlinks,
        }
    }
}

/// `true` for the paths that mean "standard input/output".
fn is_std_stream(path: &Path) -> bool {
    path.as_os_str().is_empty() || path.as_os_str() == "-"
}

/// Replace the content of `blob` with everything `reader` yields, up to
/// `limit` bytes when one is given. Returns the number of bytes read.
pub fn read_stream<R: Read>(blob: &mut Blob<'_>, reader: R, limit: Option<u64>) -> IoResult<usize> {
    blob.reset();
    read_appending(blob, reader.take(limit.unwrap_or(u64::MAX)))
}

/// Replace the content of `blob` with the content of the file at `path`.
///
/// An empty path or `-` reads standard input, capped by
/// `config.max_read_bytes`. A symbolic link is read according to `policy`.
/// A missing file is [`IoError::NotFound`].
pub fn read_file(
    blob: &mut Blob<'_>,
    path: &Path,
    policy: SymlinkPolicy,
    config: &IoConfig,
) -> IoResult<usize> {
    if is_std_stream(path) {
        return read_stream(blob, io::stdin().lock(), config.max_read_bytes);
    }
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(IoError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    blob.reset();
    if meta.file_type().is_symlink() && !policy.follows(config) {
        let target = fs::read_link(path)?;
        blob.append(&link_bytes(&target));
        debug!(path = %path.display(), "read symlink target");
        return Ok(blob.len());
    }

    let file = match File::open(path) {
        Ok(file) => file,
        // A dangling link that we were told to follow.
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(IoError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    let size = file.metadata()?.len();
    if size == 0 {
        return Ok(0);
    }
    blob.reserve(usize::try_from(size).unwrap_or(usize::MAX).saturating_add(1));
    let n = read_appending(blob, file)?;
    debug!(path = %path.display(), bytes = n, "read file");
    Ok(n)
}

fn read_appending(blob: &mut Blob<'_>, mut reader: impl Read) -> IoResult<usize> {
    let mut chunk = vec![0u8; CHUNK];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => return Ok(blob.len()),
            Ok(n) => blob.append(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn link_bytes(target: &Path) -> std::borrow::Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    std::borrow::Cow::Borrowed(target.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn link_bytes(target: &Path) -> std::borrow::Cow<'_, [u8]> {
    match target.to_string_lossy() {
        std::borrow::Cow::Borrowed(s) => std::borrow::Cow::Borrowed(s.as_bytes()),
        std::borrow::Cow::Owned(s) => std::borrow::Cow::Owned(s.into_bytes()),
    }
}

/// Write all of `blob` to `writer`, failing with [`IoError::ShortWrite`] if
/// the writer stops accepting bytes.
fn write_exact(writer: &mut impl Write, bytes: &[u8], path: &Path) -> IoResult<()> {
    let mut written = 0;
    while written < bytes.len() {
        match writer.write(&bytes[written..]) {
            Ok(0) => {
                return Err(IoError::ShortWrite {
                    path: path.to_path_buf(),
                    written,
                    expected: bytes.len(),
                })
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Write the content of `blob` to `path`, creating missing parent
/// directories. An empty path or `-` writes to standard output, byte for
/// byte. Returns the number of bytes written.
pub fn write_file(blob: &Blob<'_>, path: &Path) -> IoResult<usize> {
    let bytes = blob.as_bytes();
    if is_std_stream(path) {
        let mut out = io::stdout().lock();
        write_exact(&mut out, bytes, Path::new("-"))?;
        out.flush()?;
        return Ok(bytes.len());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    write_exact(&mut file, bytes, path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote file");
    Ok(bytes.len())
}
