//! Storage adapters: concrete [`Backend`](vstorage_core::Backend)
//! implementations that strategies and mount points dispatch to.
//!
//! - [`FileSystemAdapter`]: files under a host directory
//! - [`MemoryAdapter`]: files in a process-local map

pub mod in_memory;
pub mod local_disk;

pub use in_memory::MemoryAdapter;
pub use local_disk::FileSystemAdapter;

use vstorage_core::{Error, VirtualPath};

/// Longest file name, in bytes, an adapter accepts on write.
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Parse an incoming path and reject file names no host filesystem accepts.
pub(crate) fn writable_path(path: &str) -> Result<VirtualPath, Error> {
    let path = VirtualPath::new(path)?;
    match path.file_name() {
        Some(name) if name.len() <= MAX_FILE_NAME_LEN => Ok(path),
        _ => Err(Error::invalid_path(path.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writable_path_limits_name_length() {
        let ok = format!("/dir/{}", "a".repeat(MAX_FILE_NAME_LEN));
        assert!(writable_path(&ok).is_ok());

        let long = format!("/dir/{}", "a".repeat(MAX_FILE_NAME_LEN + 1));
        assert!(matches!(writable_path(&long), Err(Error::InvalidPath { .. })));
    }

    #[test]
    fn root_is_not_writable() {
        assert!(matches!(writable_path("/"), Err(Error::InvalidPath { .. })));
        assert!(writable_path("relative").is_err());
    }
}
