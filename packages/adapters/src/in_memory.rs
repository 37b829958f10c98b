//! In-memory adapter.
//!
//! Files are kept in a sorted map keyed by canonical path. Directories are
//! not stored; a directory exists while some file lies below it.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use vstorage_core::{Backend, Error, ReadStream, VirtualPath};

use crate::writable_path;

type Files = BTreeMap<String, Bytes>;

/// A thread-safe map of virtual path to file contents.
///
/// # Example
///
/// ```rust
/// use vstorage_adapters::MemoryAdapter;
/// use vstorage_core::Backend;
///
/// let adapter = MemoryAdapter::new();
/// adapter.put("/cache/key", b"value").unwrap();
///
/// assert!(adapter.exists("/cache").unwrap());
/// assert_eq!(adapter.get("/cache/key").unwrap().unwrap().as_ref(), b"value");
/// ```
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    files: Mutex<Files>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an adapter pre-populated with `files`.
    pub fn with_files<P, C>(files: impl IntoIterator<Item = (P, C)>) -> Result<Self, Error>
    where
        P: AsRef<str>,
        C: Into<Bytes>,
    {
        let adapter = Self::new();
        for (path, contents) in files {
            let contents: Bytes = contents.into();
            adapter.put(path.as_ref(), &contents)?;
        }
        Ok(adapter)
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files().is_empty()
    }

    fn files(&self) -> MutexGuard<'_, Files> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn file(files: &Files, path: &str) -> Result<Bytes, Error> {
        let key = VirtualPath::new(path)?;
        files
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| Error::file_not_found(path))
    }

    /// Insert a file, enforcing that neither the target nor any ancestor is
    /// of the wrong kind.
    fn store(files: &mut Files, path: &str, contents: Bytes) -> Result<(), Error> {
        let target = writable_path(path)?;
        if is_dir(files, &target) {
            return Err(Error::invalid_path(target.as_str()));
        }
        let mut ancestor = target.parent();
        while let Some(dir) = ancestor {
            if files.contains_key(dir.as_str()) {
                return Err(Error::invalid_path(target.as_str()));
            }
            ancestor = dir.parent();
        }
        files.insert(target.into(), contents);
        Ok(())
    }
}

fn dir_prefix(path: &VirtualPath) -> String {
    if path.is_root() {
        path.as_str().to_string()
    } else {
        format!("{}/", path)
    }
}

fn is_dir(files: &Files, path: &VirtualPath) -> bool {
    let prefix = dir_prefix(path);
    files
        .range(prefix.clone()..)
        .next()
        .is_some_and(|(key, _)| key.starts_with(&prefix))
}

impl Backend for MemoryAdapter {
    fn name(&self) -> &str {
        "Memory"
    }

    fn exists(&self, path: &str) -> Result<bool, Error> {
        let path = VirtualPath::new(path)?;
        let files = self.files();
        Ok(files.contains_key(path.as_str()) || is_dir(&files, &path))
    }

    fn get(&self, path: &str) -> Result<Option<Bytes>, Error> {
        Ok(Some(Self::file(&self.files(), path)?))
    }

    fn get_stream(&self, path: &str) -> Result<Option<ReadStream>, Error> {
        let contents = Self::file(&self.files(), path)?;
        Ok(Some(Box::new(Cursor::new(contents))))
    }

    fn put(&self, path: &str, contents: &[u8]) -> Result<bool, Error> {
        Self::store(&mut self.files(), path, Bytes::copy_from_slice(contents))?;
        Ok(true)
    }

    fn put_stream(&self, path: &str, stream: &mut dyn Read) -> Result<bool, Error> {
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer)?;
        Self::store(&mut self.files(), path, Bytes::from(buffer))?;
        Ok(true)
    }

    fn rename(&self, path: &str, new_path: &str, overwrite: bool) -> Result<bool, Error> {
        let mut files = self.files();
        let contents = Self::file(&files, path)?;
        let to = VirtualPath::new(new_path)?;
        if !overwrite && (files.contains_key(to.as_str()) || is_dir(&files, &to)) {
            return Err(Error::file_exists(new_path));
        }
        let from = VirtualPath::new(path)?;
        files.remove(from.as_str());
        if let Err(e) = Self::store(&mut files, new_path, contents.clone()) {
            files.insert(from.into(), contents);
            return Err(e);
        }
        Ok(true)
    }

    fn copy(&self, path: &str, new_path: &str) -> Result<bool, Error> {
        let mut files = self.files();
        let contents = Self::file(&files, path)?;
        Self::store(&mut files, new_path, contents)?;
        Ok(true)
    }

    fn delete(&self, path: &str) -> Result<bool, Error> {
        let path = VirtualPath::new(path)?;
        let mut files = self.files();
        let removed_file = files.remove(path.as_str()).is_some();

        let prefix = dir_prefix(&path);
        let before = files.len();
        files.retain(|key, _| !key.starts_with(&prefix));
        Ok(removed_file || files.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vstorage_core::testing::backend_test_suite;

    #[test]
    fn satisfies_backend_contract() {
        backend_test_suite::run_all(|| (MemoryAdapter::new(), "/mem".to_string(), ()));
    }

    #[test]
    fn keys_are_canonical() {
        let adapter = MemoryAdapter::new();
        adapter.put("\\a//b/./c", b"x").unwrap();

        assert!(adapter.exists("/a/b/c").unwrap());
        assert_eq!(adapter.len(), 1);
    }

    #[test]
    fn directories_are_implied() {
        let adapter = MemoryAdapter::with_files([("/a/b/c.txt", &b"c"[..])]).unwrap();

        assert!(adapter.exists("/a").unwrap());
        assert!(adapter.exists("/a/b").unwrap());
        assert!(adapter.exists("/").unwrap());
        assert!(!adapter.exists("/a/b/c").unwrap());
        assert!(matches!(adapter.get("/a/b"), Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn sibling_names_are_not_directories() {
        let adapter = MemoryAdapter::with_files([("/abc", &b"x"[..])]).unwrap();
        assert!(!adapter.exists("/ab").unwrap());
        assert!(!adapter.delete("/ab").unwrap());
        assert!(adapter.exists("/abc").unwrap());
    }

    #[test]
    fn cannot_write_below_a_file() {
        let adapter = MemoryAdapter::with_files([("/file", &b"x"[..])]).unwrap();
        assert!(matches!(
            adapter.put("/file/child", b"y"),
            Err(Error::InvalidPath { .. })
        ));
    }

    #[test]
    fn failed_rename_restores_source() {
        let adapter = MemoryAdapter::with_files([
            ("/src", &b"data"[..]),
            ("/dir/inside", &b"x"[..]),
        ])
        .unwrap();

        assert!(matches!(
            adapter.rename("/src", "/dir", true),
            Err(Error::InvalidPath { .. })
        ));
        assert_eq!(adapter.get("/src").unwrap().unwrap(), Bytes::from_static(b"data"));
    }

    #[test]
    fn empty_adapter_has_nothing() {
        let adapter = MemoryAdapter::new();
        assert!(adapter.is_empty());
        assert!(!adapter.exists("/").unwrap());
        assert!(!adapter.delete("/anything").unwrap());
    }

    #[test]
    fn shared_between_threads() {
        let adapter = std::sync::Arc::new(MemoryAdapter::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let adapter = adapter.clone();
                std::thread::spawn(move || adapter.put(&format!("/t/{i}"), b"x").unwrap())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(adapter.len(), 4);
    }
}
