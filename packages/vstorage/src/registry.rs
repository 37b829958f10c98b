//! Named adapter factories.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use vstorage_adapters::{FileSystemAdapter, MemoryAdapter};
use vstorage_core::{BackendRef, Error};

/// Builds a fresh adapter instance.
pub type AdapterFactory = Box<dyn Fn() -> Result<BackendRef, Error> + Send + Sync>;

/// Adapters that can be requested by name.
///
/// Every call to [`create`](Self::create) builds a new instance.
pub struct AdapterRegistry {
    factories: BTreeMap<String, AdapterFactory>,
}

impl AdapterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// A registry with the adapters shipped in this workspace:
    /// `FileSystem` (rooted at `/`) and `Memory`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("FileSystem", || {
            Ok(Arc::new(FileSystemAdapter::host()) as BackendRef)
        });
        registry.register("Memory", || Ok(Arc::new(MemoryAdapter::new()) as BackendRef));
        registry
    }

    /// Register `factory` under `name`, replacing any previous factory.
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Result<BackendRef, Error> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
        self
    }

    pub fn create(&self, name: &str) -> Result<BackendRef, Error> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::AdapterNotFound {
                name: name.to_string(),
            })?;
        factory()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
