//! vstorage: one filesystem-like interface over many storages.
//!
//! Storages are mounted at virtual path prefixes. Each mounted storage is a
//! call strategy dispatching to an ordered list of adapters:
//!
//! ```text
//! caller → MountableStorage → (deepest mount) → VirtualStorage
//!                                                 → CallAllStrategy / FallbackChainStrategy
//!                                                     → FileSystem, Memory, ...
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vstorage::{Backend, MemoryAdapter, MountableStorage, StorageBuilder, StrategyKind};
//!
//! let cache = StorageBuilder::new()
//!     .with_strategy_kind(StrategyKind::FallbackChain)
//!     .add_adapter(Arc::new(MemoryAdapter::new()))
//!     .build()
//!     .unwrap();
//!
//! let mut storage = MountableStorage::new(Arc::new(MemoryAdapter::new()));
//! storage.mount("/cache", Arc::new(cache)).unwrap();
//!
//! storage.put("/cache/session", b"token").unwrap();
//! assert!(storage.exists("/cache/session").unwrap());
//! ```

pub mod builder;
pub mod config;
pub mod logging;
pub mod registry;

pub use builder::{StorageBuilder, DEFAULT_ADAPTER};
pub use config::{AdapterConfig, MountConfig, StorageConfig, StorageSpec};
pub use registry::{AdapterFactory, AdapterRegistry};

pub use vstorage_adapters::{FileSystemAdapter, MemoryAdapter};
pub use vstorage_core::{
    vpath, Backend, BackendRef, Bytes, CallAllStrategy, CallStrategy, Error,
    FallbackChainStrategy, MountPoint, MountTable, MountableStorage, ReadStream, StrategyKind,
    VirtualPath, VirtualStorage,
};
