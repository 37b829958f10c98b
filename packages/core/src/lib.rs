//! Core vstorage: Virtual Storage Layer
//!
//! One filesystem-like interface over heterogeneous backing stores:
//! - `VirtualPath`: Canonical absolute path, slash-normalized
//! - `Backend`: The operation set every adapter implements
//! - `MountableStorage`: Routes each path to the backend mounted at its
//!   deepest enclosing prefix
//! - `CallAllStrategy` / `FallbackChainStrategy`: Fan one operation out over
//!   an ordered adapter list and combine the outcomes
//!
//! # Example
//!
//! ```rust
//! use vstorage_core::{Backend, Error, VirtualPath};
//!
//! fn read_report(storage: &dyn Backend) -> Result<Option<vstorage_core::Bytes>, Error> {
//!     let path = VirtualPath::new("/reports/2024.csv")?;
//!     storage.get(path.as_str())
//! }
//! ```

pub use bytes::Bytes;

mod backend;
mod error;
pub mod mount;
pub mod mountable;
mod path;
pub mod strategy;
mod virtual_storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use backend::{Backend, BackendRef, ReadStream};
pub use error::Error;
pub use mount::{MountPoint, MountTable};
pub use mountable::MountableStorage;
pub use path::{VirtualPath, SEPARATOR};
pub use strategy::{CallAllStrategy, CallStrategy, FallbackChainStrategy, StrategyKind};
pub use virtual_storage::VirtualStorage;
