//! MountableStorage: route each operation to the backend mounted at the
//! deepest enclosing prefix.
//!
//! The storage is constructed with a default backend bound at `/`, so every
//! path resolves. Paths are canonicalized before resolution and forwarded to
//! the resolved backend unchanged; the mount prefix is not stripped.
//!
//! Moves and copies between two different backends go through a stream copy:
//! `exists(src)`, `get_stream(src)`, `put_stream(dst)`, `exists(dst)`, and for
//! moves a final `delete(src)`. This is not atomic. A failure between the
//! write and the delete leaves the file in both places.

use std::sync::Arc;

use bytes::Bytes;

use crate::{Backend, BackendRef, Error, MountPoint, MountTable, ReadStream, VirtualPath};

pub struct MountableStorage {
    default: MountPoint,
    mounts: MountTable,
}

impl MountableStorage {
    /// Create a storage whose every path routes to `default_storage` until
    /// more specific mounts are added.
    pub fn new(default_storage: BackendRef) -> Self {
        let default = MountPoint::new(VirtualPath::root(), default_storage);
        let mut mounts = MountTable::new();
        mounts.set(default.clone());
        Self { default, mounts }
    }

    /// Bind a mount point, replacing any binding at the same path.
    ///
    /// Registering at `/` replaces the default backend.
    pub fn register_mount_point(&mut self, mount_point: MountPoint) -> Option<MountPoint> {
        if mount_point.virtual_path().is_root() {
            self.default = mount_point.clone();
        }
        tracing::debug!(
            path = %mount_point.virtual_path(),
            adapter = mount_point.storage().name(),
            "mounted storage"
        );
        self.mounts.set(mount_point)
    }

    /// Parse `path` and mount `storage` there.
    pub fn mount(&mut self, path: &str, storage: BackendRef) -> Result<Option<MountPoint>, Error> {
        let path = VirtualPath::new(path)?;
        Ok(self.register_mount_point(MountPoint::new(path, storage)))
    }

    /// Remove the mount at `path`, returning its backend.
    ///
    /// The root binding cannot be removed; asking for it returns `None`.
    pub fn unmount(&mut self, path: &VirtualPath) -> Option<BackendRef> {
        if path.is_root() {
            tracing::warn!(path = %path, "refusing to unmount the default storage");
            return None;
        }
        self.mounts
            .take(path)
            .map(|mount_point| mount_point.storage().clone())
    }

    /// All bindings in routing order, the root binding last.
    pub fn mount_points(&self) -> &MountTable {
        &self.mounts
    }

    pub fn default_mount_point(&self) -> &MountPoint {
        &self.default
    }

    /// The mount point that serves `path`.
    pub fn mount_point_for_path(&self, path: &VirtualPath) -> &MountPoint {
        self.mounts.find_for_path(path).unwrap_or(&self.default)
    }

    fn resolve(&self, raw: &str) -> Result<(VirtualPath, &BackendRef), Error> {
        let path = VirtualPath::new(raw)?;
        let mount_point = self.mount_point_for_path(&path);
        tracing::debug!(
            path = %path,
            mount = %mount_point.virtual_path(),
            adapter = mount_point.storage().name(),
            "resolved mount point"
        );
        let storage = mount_point.storage();
        Ok((path, storage))
    }

    /// Copy `from` on `source` to `to` on `target` through a read stream.
    ///
    /// Returns true iff `to` exists on `target` afterwards.
    fn stream_copy(
        &self,
        from: &VirtualPath,
        source: &BackendRef,
        to: &VirtualPath,
        target: &BackendRef,
    ) -> Result<bool, Error> {
        if !source.exists(from.as_str())? {
            return Ok(false);
        }

        let mut stream: ReadStream = match source.get_stream(from.as_str()) {
            Ok(Some(stream)) => stream,
            Ok(None) => return Ok(false),
            Err(e) => {
                tracing::warn!(
                    adapter = source.name(),
                    from = %from,
                    error = %e,
                    "unable to open source stream"
                );
                return Ok(false);
            }
        };

        if let Err(e) = target.put_stream(to.as_str(), &mut stream) {
            tracing::warn!(
                adapter = target.name(),
                from = %from,
                to = %to,
                error = %e,
                "unable to write destination stream"
            );
            return Ok(false);
        }
        drop(stream);

        target.exists(to.as_str())
    }
}

impl Backend for MountableStorage {
    fn name(&self) -> &str {
        "MountableStorage"
    }

    fn exists(&self, path: &str) -> Result<bool, Error> {
        let (path, storage) = self.resolve(path)?;
        storage.exists(path.as_str())
    }

    fn get(&self, path: &str) -> Result<Option<Bytes>, Error> {
        let (path, storage) = self.resolve(path)?;
        storage.get(path.as_str())
    }

    fn get_stream(&self, path: &str) -> Result<Option<ReadStream>, Error> {
        let (path, storage) = self.resolve(path)?;
        storage.get_stream(path.as_str())
    }

    fn put(&self, path: &str, contents: &[u8]) -> Result<bool, Error> {
        let (path, storage) = self.resolve(path)?;
        storage.put(path.as_str(), contents)
    }

    fn put_stream(&self, path: &str, stream: &mut dyn std::io::Read) -> Result<bool, Error> {
        let (path, storage) = self.resolve(path)?;
        storage.put_stream(path.as_str(), stream)
    }

    fn rename(&self, path: &str, new_path: &str, overwrite: bool) -> Result<bool, Error> {
        let (from, source) = self.resolve(path)?;
        let (to, target) = self.resolve(new_path)?;

        if !overwrite && target.exists(to.as_str())? {
            return Err(Error::file_exists(to.as_str()));
        }

        if Arc::ptr_eq(source, target) {
            return source.rename(from.as_str(), to.as_str(), overwrite);
        }

        tracing::debug!(
            from = %from,
            to = %to,
            "moving across storages"
        );
        if !self.stream_copy(&from, source, &to, target)? {
            return Ok(false);
        }
        source.delete(from.as_str())
    }

    fn copy(&self, path: &str, new_path: &str) -> Result<bool, Error> {
        let (from, source) = self.resolve(path)?;
        let (to, target) = self.resolve(new_path)?;

        if Arc::ptr_eq(source, target) {
            return source.copy(from.as_str(), to.as_str());
        }
        self.stream_copy(&from, source, &to, target)
    }

    fn delete(&self, path: &str) -> Result<bool, Error> {
        let (path, storage) = self.resolve(path)?;
        storage.delete(path.as_str())
    }
}
