//! Mount points and the specificity-ordered mount table.

use std::cmp::Ordering;
use std::collections::{btree_map, BTreeMap};
use std::fmt;

use crate::path::separator_count;
use crate::{BackendRef, VirtualPath};

/// A binding of a virtual path prefix to a backend.
#[derive(Clone)]
pub struct MountPoint {
    path: VirtualPath,
    storage: BackendRef,
}

impl MountPoint {
    pub fn new(path: VirtualPath, storage: BackendRef) -> Self {
        Self { path, storage }
    }

    pub fn virtual_path(&self) -> &VirtualPath {
        &self.path
    }

    pub fn storage(&self) -> &BackendRef {
        &self.storage
    }
}

impl fmt::Debug for MountPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountPoint")
            .field("path", &self.path.as_str())
            .field("storage", &self.storage.name())
            .finish()
    }
}

/// Table key ordering mount paths by specificity: deeper paths first, then
/// reverse lexicographic order between paths of equal depth.
#[derive(Clone, Debug, PartialEq, Eq)]
struct MountKey(String);

impl Ord for MountKey {
    fn cmp(&self, other: &Self) -> Ordering {
        separator_count(&other.0)
            .cmp(&separator_count(&self.0))
            .then_with(|| other.0.cmp(&self.0))
    }
}

impl PartialOrd for MountKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Mount points keyed by canonical path, iterated deepest first.
///
/// Iteration order is a deterministic total order; routing relies on it, as
/// the first mount whose prefix contains a path wins.
#[derive(Default, Clone)]
pub struct MountTable {
    mounts: BTreeMap<MountKey, MountPoint>,
}

impl MountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the mount at the mount point's path.
    ///
    /// Returns the replaced mount point, if any.
    pub fn set(&mut self, mount_point: MountPoint) -> Option<MountPoint> {
        let key = MountKey(mount_point.virtual_path().as_str().to_string());
        self.mounts.insert(key, mount_point)
    }

    /// Exact lookup of the mount registered at `path`.
    pub fn get(&self, path: &VirtualPath) -> Option<&MountPoint> {
        self.mounts.get(&MountKey(path.as_str().to_string()))
    }

    pub fn contains(&self, path: &VirtualPath) -> bool {
        self.get(path).is_some()
    }

    /// Remove the mount registered at `path`. Returns false if absent.
    pub fn remove(&mut self, path: &VirtualPath) -> bool {
        self.take(path).is_some()
    }

    /// Remove and return the mount registered at `path`.
    pub fn take(&mut self, path: &VirtualPath) -> Option<MountPoint> {
        self.mounts.remove(&MountKey(path.as_str().to_string()))
    }

    /// Mount points in routing order.
    pub fn iter(&self) -> Iter<'_> {
        Iter(self.mounts.values())
    }

    /// The most specific mount whose prefix lies strictly above `path`.
    pub fn find_for_path(&self, path: &VirtualPath) -> Option<&MountPoint> {
        self.iter()
            .find(|mount_point| mount_point.virtual_path().is_child(path))
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }
}

impl fmt::Debug for MountTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over a [`MountTable`] in routing order.
pub struct Iter<'a>(btree_map::Values<'a, MountKey, MountPoint>);

impl<'a> Iterator for Iter<'a> {
    type Item = &'a MountPoint;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a> IntoIterator for &'a MountTable {
    type Item = &'a MountPoint;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
