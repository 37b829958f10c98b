//! Files on the local disk, below a root directory.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use vstorage_core::{Backend, Error, ReadStream, VirtualPath};

use crate::writable_path;

/// Maps virtual paths onto files under a host directory.
///
/// The virtual path `/a/b.txt` lives at `<root>/a/b.txt`. Paths are
/// canonicalized before they are mapped, so `..` never leaves the root.
///
/// # Example
///
/// ```rust
/// use vstorage_adapters::FileSystemAdapter;
/// use vstorage_core::Backend;
///
/// let dir = tempfile::tempdir().unwrap();
/// let adapter = FileSystemAdapter::new(dir.path()).unwrap();
///
/// adapter.put("/notes/today.txt", b"buy milk").unwrap();
/// assert!(dir.path().join("notes/today.txt").is_file());
/// ```
#[derive(Debug, Clone)]
pub struct FileSystemAdapter {
    root: PathBuf,
}

impl FileSystemAdapter {
    /// Create an adapter rooted at `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, Error> {
        let root = root.as_ref();
        let attr = fs::metadata(root).map_err(|error| Error::InvalidAdapter {
            message: format!("root path {} is not accessible: {}", root.display(), error),
        })?;
        if !attr.is_dir() {
            return Err(Error::InvalidAdapter {
                message: format!("root path {} must be a directory", root.display()),
            });
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// An adapter over the whole host filesystem.
    pub fn host() -> Self {
        Self {
            root: PathBuf::from("/"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn host_path(&self, path: &VirtualPath) -> PathBuf {
        let mut host = self.root.clone();
        host.extend(path.segments());
        host
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, Error> {
        Ok(self.host_path(&VirtualPath::new(path)?))
    }

    /// Resolve a write target, creating its parent directories.
    fn prepare_write(&self, path: &str) -> Result<PathBuf, Error> {
        let virtual_path = writable_path(path)?;
        let host = self.host_path(&virtual_path);
        if host.is_dir() {
            return Err(Error::invalid_path(virtual_path.as_str()));
        }
        if let Some(parent) = host.parent() {
            fs::create_dir_all(parent)
                .map_err(|_| Error::invalid_path(virtual_path.as_str()))?;
        }
        Ok(host)
    }

    /// Remove everything below the root, keeping the root itself.
    fn clear_root(&self) -> Result<bool, Error> {
        let mut removed = false;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
            removed = true;
        }
        tracing::debug!(adapter = self.name(), root = %self.root.display(), "cleared root");
        Ok(removed)
    }

    fn existing_file(&self, path: &str) -> Result<PathBuf, Error> {
        let host = self.resolve(path)?;
        if !host.is_file() {
            return Err(Error::file_not_found(path));
        }
        Ok(host)
    }
}

impl Backend for FileSystemAdapter {
    fn name(&self) -> &str {
        "FileSystem"
    }

    fn exists(&self, path: &str) -> Result<bool, Error> {
        Ok(self.resolve(path)?.exists())
    }

    fn get(&self, path: &str) -> Result<Option<Bytes>, Error> {
        let host = self.existing_file(path)?;
        Ok(Some(Bytes::from(fs::read(host)?)))
    }

    fn get_stream(&self, path: &str) -> Result<Option<ReadStream>, Error> {
        let host = self.existing_file(path)?;
        let file = fs::File::open(host)?;
        Ok(Some(Box::new(io::BufReader::new(file))))
    }

    fn put(&self, path: &str, contents: &[u8]) -> Result<bool, Error> {
        let host = self.prepare_write(path)?;
        fs::write(&host, contents)?;
        tracing::debug!(adapter = self.name(), path, bytes = contents.len(), "wrote file");
        Ok(true)
    }

    fn put_stream(&self, path: &str, stream: &mut dyn Read) -> Result<bool, Error> {
        let host = self.prepare_write(path)?;
        let mut file = fs::File::create(&host)?;
        let written = io::copy(stream, &mut file)?;
        tracing::debug!(adapter = self.name(), path, bytes = written, "streamed file");
        Ok(true)
    }

    fn rename(&self, path: &str, new_path: &str, overwrite: bool) -> Result<bool, Error> {
        let from = self.resolve(path)?;
        if !from.exists() {
            return Err(Error::file_not_found(path));
        }
        let to = self.resolve(new_path)?;
        if to.exists() && !overwrite {
            return Err(Error::file_exists(new_path));
        }
        let to = self.prepare_write(new_path)?;
        fs::rename(from, to)?;
        Ok(true)
    }

    fn copy(&self, path: &str, new_path: &str) -> Result<bool, Error> {
        let from = self.existing_file(path)?;
        let to = self.prepare_write(new_path)?;
        fs::copy(from, to)?;
        Ok(true)
    }

    fn delete(&self, path: &str) -> Result<bool, Error> {
        let virtual_path = VirtualPath::new(path)?;
        if virtual_path.is_root() {
            return self.clear_root();
        }
        let host = self.host_path(&virtual_path);
        if host.is_dir() {
            fs::remove_dir_all(&host)?;
        } else if host.is_file() {
            fs::remove_file(&host)?;
        } else {
            return Ok(false);
        }
        tracing::debug!(adapter = self.name(), path, "deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vstorage_core::testing::backend_test_suite;

    fn adapter() -> (FileSystemAdapter, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let adapter = FileSystemAdapter::new(dir.path()).unwrap();
        (adapter, dir)
    }

    #[test]
    fn satisfies_backend_contract() {
        backend_test_suite::run_all(|| {
            let (adapter, dir) = adapter();
            (adapter, "/data".to_string(), dir)
        });
    }

    #[test]
    fn maps_virtual_paths_under_root() {
        let (adapter, dir) = adapter();
        adapter.put("/a/b/c.txt", b"mapped").unwrap();

        let on_disk = fs::read(dir.path().join("a").join("b").join("c.txt")).unwrap();
        assert_eq!(on_disk, b"mapped");
    }

    #[test]
    fn parent_segments_stay_inside_root() {
        let (adapter, dir) = adapter();
        adapter.put("/../../escape.txt", b"caught").unwrap();

        assert!(dir.path().join("escape.txt").is_file());
    }

    #[test]
    fn reads_files_created_outside() {
        let (adapter, dir) = adapter();
        fs::write(dir.path().join("external.txt"), b"hello").unwrap();

        assert!(adapter.exists("/external.txt").unwrap());
        assert_eq!(adapter.get("/external.txt").unwrap().unwrap(), Bytes::from_static(b"hello"));
    }

    #[test]
    fn get_of_a_directory_is_not_found() {
        let (adapter, dir) = adapter();
        fs::create_dir(dir.path().join("folder")).unwrap();

        assert!(matches!(adapter.get("/folder"), Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            FileSystemAdapter::new(&missing),
            Err(Error::InvalidAdapter { .. })
        ));
    }

    #[test]
    fn rejects_file_as_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"").unwrap();
        assert!(matches!(
            FileSystemAdapter::new(&file),
            Err(Error::InvalidAdapter { .. })
        ));
    }

    #[test]
    fn copy_of_missing_source_is_not_found() {
        let (adapter, _dir) = adapter();
        assert!(matches!(
            adapter.copy("/ghost", "/copy"),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn relative_paths_are_rejected() {
        let (adapter, _dir) = adapter();
        assert!(matches!(
            adapter.exists("relative.txt"),
            Err(Error::RelativePathNotAllowed { .. })
        ));
    }

    #[test]
    fn delete_of_root_keeps_root_directory() {
        let (adapter, dir) = adapter();
        adapter.put("/top.txt", b"a").unwrap();
        adapter.put("/nested/deep.txt", b"b").unwrap();

        assert!(adapter.delete("/").unwrap());
        assert!(dir.path().is_dir());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(!adapter.delete("/").unwrap());

        assert!(adapter.put("/after.txt", b"c").unwrap());
    }

    #[test]
    fn put_below_a_file_is_invalid_path() {
        let (adapter, dir) = adapter();
        adapter.put("/file", b"plain").unwrap();

        assert!(matches!(
            adapter.put_stream("/file/child", &mut io::Cursor::new(b"x".to_vec())),
            Err(Error::InvalidPath { .. })
        ));
        assert!(matches!(
            adapter.copy("/file", "/file/copy"),
            Err(Error::InvalidPath { .. })
        ));
        assert!(dir.path().join("file").is_file());
    }

    #[test]
    fn host_adapter_is_rooted_at_slash() {
        assert_eq!(FileSystemAdapter::host().root(), Path::new("/"));
    }
}
