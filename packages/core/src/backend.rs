//! The capability set every storage adapter implements.

use std::io::Read;
use std::sync::Arc;

use bytes::Bytes;

use crate::Error;

/// A readable stream returned by [`Backend::get_stream`].
///
/// The stream is closed when the value is dropped.
pub type ReadStream = Box<dyn Read + Send>;

/// A shared backend handle, as held by mount points and call strategies.
pub type BackendRef = Arc<dyn Backend>;

/// Storage operations over paths.
///
/// Paths are passed as strings. Routing layers hand backends the canonical
/// form of a [`VirtualPath`](crate::VirtualPath); adapters are responsible
/// for mapping it into their own namespace.
///
/// Soft failures are reported as `Ok(false)` or `Ok(None)`; errors are
/// reserved for conditions the caller must handle (missing files on reads,
/// existing destinations, invalid paths, I/O failures).
///
/// # Object Safety
///
/// This trait is object-safe: strategies and mount points hold `Arc<dyn Backend>`.
pub trait Backend: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Check whether a file exists.
    fn exists(&self, path: &str) -> Result<bool, Error>;

    /// Read a whole file.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(bytes))` - The file contents.
    /// * `Ok(None)` - The backend could not produce the contents.
    /// * `Err(Error::FileNotFound)` - The file does not exist.
    fn get(&self, path: &str) -> Result<Option<Bytes>, Error>;

    /// Open a read stream for a file.
    fn get_stream(&self, path: &str) -> Result<Option<ReadStream>, Error>;

    /// Create or replace a file, creating missing parents.
    fn put(&self, path: &str, contents: &[u8]) -> Result<bool, Error>;

    /// Create or replace a file from a stream, creating missing parents.
    fn put_stream(&self, path: &str, stream: &mut dyn Read) -> Result<bool, Error>;

    /// Move a file. Fails with [`Error::FileExists`] when `new_path` exists
    /// and `overwrite` is false.
    fn rename(&self, path: &str, new_path: &str, overwrite: bool) -> Result<bool, Error>;

    /// Copy a file.
    fn copy(&self, path: &str, new_path: &str) -> Result<bool, Error>;

    /// Delete a file or directory.
    fn delete(&self, path: &str) -> Result<bool, Error>;
}

// Blanket implementations for smart pointers

impl<T: Backend + ?Sized> Backend for Arc<T> {
    fn name(&self) -> &str {
        self.as_ref().name()
    }

    fn exists(&self, path: &str) -> Result<bool, Error> {
        self.as_ref().exists(path)
    }

    fn get(&self, path: &str) -> Result<Option<Bytes>, Error> {
        self.as_ref().get(path)
    }

    fn get_stream(&self, path: &str) -> Result<Option<ReadStream>, Error> {
        self.as_ref().get_stream(path)
    }

    fn put(&self, path: &str, contents: &[u8]) -> Result<bool, Error> {
        self.as_ref().put(path, contents)
    }

    fn put_stream(&self, path: &str, stream: &mut dyn Read) -> Result<bool, Error> {
        self.as_ref().put_stream(path, stream)
    }

    fn rename(&self, path: &str, new_path: &str, overwrite: bool) -> Result<bool, Error> {
        self.as_ref().rename(path, new_path, overwrite)
    }

    fn copy(&self, path: &str, new_path: &str) -> Result<bool, Error> {
        self.as_ref().copy(path, new_path)
    }

    fn delete(&self, path: &str) -> Result<bool, Error> {
        self.as_ref().delete(path)
    }
}

impl<T: Backend + ?Sized> Backend for Box<T> {
    fn name(&self) -> &str {
        self.as_ref().name()
    }

    fn exists(&self, path: &str) -> Result<bool, Error> {
        self.as_ref().exists(path)
    }

    fn get(&self, path: &str) -> Result<Option<Bytes>, Error> {
        self.as_ref().get(path)
    }

    fn get_stream(&self, path: &str) -> Result<Option<ReadStream>, Error> {
        self.as_ref().get_stream(path)
    }

    fn put(&self, path: &str, contents: &[u8]) -> Result<bool, Error> {
        self.as_ref().put(path, contents)
    }

    fn put_stream(&self, path: &str, stream: &mut dyn Read) -> Result<bool, Error> {
        self.as_ref().put_stream(path, stream)
    }

    fn rename(&self, path: &str, new_path: &str, overwrite: bool) -> Result<bool, Error> {
        self.as_ref().rename(path, new_path, overwrite)
    }

    fn copy(&self, path: &str, new_path: &str) -> Result<bool, Error> {
        self.as_ref().copy(path, new_path)
    }

    fn delete(&self, path: &str) -> Result<bool, Error> {
        self.as_ref().delete(path)
    }
}
