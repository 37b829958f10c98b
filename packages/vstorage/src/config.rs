//! Declarative storage trees.
//!
//! A configuration names the default storage and any number of mounted
//! storages, each with a strategy and an adapter list:
//!
//! ```json
//! {
//!   "default": { "strategy": "call_all", "adapters": [{ "type": "filesystem", "root": "/srv/data" }] },
//!   "mounts": [
//!     { "path": "/tmp", "storage": { "strategy": "fallback_chain",
//!         "adapters": [{ "type": "memory" }, { "type": "filesystem", "root": "/var/tmp" }] } }
//!   ]
//! }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vstorage_adapters::{FileSystemAdapter, MemoryAdapter};
use vstorage_core::{
    BackendRef, Error, MountPoint, MountableStorage, StrategyKind, VirtualPath, VirtualStorage,
};

use crate::builder::StorageBuilder;

/// One adapter instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AdapterConfig {
    /// Files under a host directory; the whole host filesystem when `root`
    /// is omitted.
    FileSystem {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        root: Option<PathBuf>,
    },
    /// Process-local, lost on exit.
    Memory,
}

impl AdapterConfig {
    pub fn create(&self) -> Result<BackendRef, Error> {
        match self {
            AdapterConfig::FileSystem { root: Some(root) } => {
                Ok(Arc::new(FileSystemAdapter::new(root)?) as BackendRef)
            }
            AdapterConfig::FileSystem { root: None } => {
                Ok(Arc::new(FileSystemAdapter::host()) as BackendRef)
            }
            AdapterConfig::Memory => Ok(Arc::new(MemoryAdapter::new()) as BackendRef),
        }
    }
}

/// A strategy and the adapters it dispatches to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StorageSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyKind>,
    #[serde(default)]
    pub adapters: Vec<AdapterConfig>,
}

impl StorageSpec {
    /// A builder preloaded with these settings. Builder defaults fill whatever
    /// is left out.
    pub fn builder(&self) -> Result<StorageBuilder, Error> {
        let mut builder = StorageBuilder::new();
        if let Some(kind) = self.strategy {
            builder = builder.with_strategy_kind(kind);
        }
        for adapter in &self.adapters {
            builder = builder.add_adapter(adapter.create()?);
        }
        Ok(builder)
    }

    pub fn build(&self) -> Result<VirtualStorage, Error> {
        self.builder()?.build()
    }
}

/// A storage mounted below `path`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MountConfig {
    pub path: VirtualPath,
    #[serde(default)]
    pub storage: StorageSpec,
}

/// The whole storage tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<StorageSpec>,
    #[serde(default)]
    pub mounts: Vec<MountConfig>,
}

impl StorageConfig {
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("unable to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Build every storage and mount it.
    ///
    /// Mount paths must be unique, and `/` is configured through `default`.
    pub fn build(&self) -> Result<MountableStorage, Error> {
        let default = match &self.default {
            Some(spec) => spec.build()?,
            None => StorageBuilder::new().build()?,
        };
        let mut storage = MountableStorage::new(Arc::new(default));

        let mut seen = BTreeSet::new();
        for mount in &self.mounts {
            if mount.path.is_root() {
                return Err(Error::config(
                    "the root storage is configured through \"default\", not \"mounts\"",
                ));
            }
            if !seen.insert(mount.path.as_str()) {
                return Err(Error::config(format!(
                    "mount point '{}' is configured more than once",
                    mount.path
                )));
            }
            let mounted = mount.storage.build()?;
            tracing::debug!(
                path = %mount.path,
                strategy = mounted.call_strategy_name(),
                "configured mount"
            );
            storage.register_mount_point(MountPoint::new(mount.path.clone(), Arc::new(mounted)));
        }
        Ok(storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vstorage_core::Backend;

    const EXAMPLE: &str = r#"{
        "default": { "strategy": "call_all", "adapters": [{ "type": "memory" }] },
        "mounts": [
            { "path": "/tmp", "storage": { "strategy": "fallback_chain",
                "adapters": [{ "type": "memory" }, { "type": "filesystem" }] } }
        ]
    }"#;

    #[test]
    fn parses_full_document() {
        let config = StorageConfig::from_json_str(EXAMPLE).unwrap();

        let default = config.default.as_ref().unwrap();
        assert_eq!(default.strategy, Some(StrategyKind::CallAll));
        assert_eq!(default.adapters, vec![AdapterConfig::Memory]);

        assert_eq!(config.mounts.len(), 1);
        let tmp = &config.mounts[0];
        assert_eq!(tmp.path.as_str(), "/tmp");
        assert_eq!(tmp.storage.strategy, Some(StrategyKind::FallbackChain));
        assert_eq!(
            tmp.storage.adapters,
            vec![AdapterConfig::Memory, AdapterConfig::FileSystem { root: None }]
        );
    }

    #[test]
    fn empty_document_is_all_defaults() {
        let config = StorageConfig::from_json_str("{}").unwrap();
        assert_eq!(config, StorageConfig::default());

        let storage = config.build().unwrap();
        assert_eq!(storage.mount_points().len(), 1);
        assert_eq!(
            storage.default_mount_point().storage().name(),
            "VirtualStorage"
        );
    }

    #[test]
    fn builds_routed_tree() {
        let config = StorageConfig::from_json_str(EXAMPLE).unwrap();
        let storage = config.build().unwrap();

        let order: Vec<&str> = storage
            .mount_points()
            .iter()
            .map(|m| m.virtual_path().as_str())
            .collect();
        assert_eq!(order, vec!["/tmp", "/"]);

        assert!(storage.put("/docs/readme", b"root").unwrap());
        assert!(storage.exists("/docs/readme").unwrap());
    }

    #[test]
    fn mount_paths_are_canonicalized() {
        let config = StorageConfig::from_json_str(
            r#"{ "mounts": [{ "path": "/data//cache/", "storage": { "adapters": [{ "type": "memory" }] } }] }"#,
        )
        .unwrap();
        assert_eq!(config.mounts[0].path.as_str(), "/data/cache");
    }

    #[test]
    fn rejects_relative_mount_path() {
        let err = StorageConfig::from_json_str(r#"{ "mounts": [{ "path": "tmp" }] }"#).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn rejects_unknown_adapter_type() {
        let err =
            StorageConfig::from_json_str(r#"{ "default": { "adapters": [{ "type": "s3" }] } }"#)
                .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn rejects_unknown_strategy() {
        let err = StorageConfig::from_json_str(r#"{ "default": { "strategy": "random" } }"#)
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn rejects_duplicate_and_root_mounts() {
        let duplicate = StorageConfig::from_json_str(
            r#"{ "mounts": [{ "path": "/a" }, { "path": "/a/" }] }"#,
        )
        .unwrap();
        assert!(matches!(duplicate.build(), Err(Error::Config { .. })));

        let root = StorageConfig::from_json_str(r#"{ "mounts": [{ "path": "/" }] }"#).unwrap();
        assert!(matches!(root.build(), Err(Error::Config { .. })));
    }

    #[test]
    fn filesystem_root_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let spec = StorageSpec {
            strategy: None,
            adapters: vec![AdapterConfig::FileSystem {
                root: Some(missing),
            }],
        };
        assert!(matches!(spec.build(), Err(Error::InvalidAdapter { .. })));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, EXAMPLE).unwrap();

        let config = StorageConfig::load(&path).unwrap();
        assert_eq!(config.mounts.len(), 1);

        let err = StorageConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn serializes_back_to_equivalent_document() {
        let config = StorageConfig::from_json_str(EXAMPLE).unwrap();
        let json = config.to_json_string().unwrap();
        assert_eq!(StorageConfig::from_json_str(&json).unwrap(), config);
        assert!(json.contains("\"fallback_chain\""));
    }
}
