//! The facade a builder hands out: one call strategy behind the
//! [`Backend`] interface.

use std::io::Read;

use bytes::Bytes;

use crate::{Backend, BackendRef, CallStrategy, Error, ReadStream};

/// A storage built from one call strategy and its adapters.
///
/// Every operation is delegated to the strategy.
pub struct VirtualStorage {
    strategy: Box<dyn CallStrategy>,
}

impl VirtualStorage {
    pub fn new(strategy: Box<dyn CallStrategy>) -> Self {
        Self { strategy }
    }

    pub fn call_strategy_name(&self) -> &'static str {
        self.strategy.strategy_name()
    }

    pub fn strategy(&self) -> &dyn CallStrategy {
        self.strategy.as_ref()
    }

    pub fn strategy_mut(&mut self) -> &mut dyn CallStrategy {
        self.strategy.as_mut()
    }

    pub fn adapters(&self) -> &[BackendRef] {
        self.strategy.adapters()
    }
}

impl Backend for VirtualStorage {
    fn name(&self) -> &str {
        "VirtualStorage"
    }

    fn exists(&self, path: &str) -> Result<bool, Error> {
        self.strategy.exists(path)
    }

    fn get(&self, path: &str) -> Result<Option<Bytes>, Error> {
        self.strategy.get(path)
    }

    fn get_stream(&self, path: &str) -> Result<Option<ReadStream>, Error> {
        self.strategy.get_stream(path)
    }

    fn put(&self, path: &str, contents: &[u8]) -> Result<bool, Error> {
        self.strategy.put(path, contents)
    }

    fn put_stream(&self, path: &str, stream: &mut dyn Read) -> Result<bool, Error> {
        self.strategy.put_stream(path, stream)
    }

    fn rename(&self, path: &str, new_path: &str, overwrite: bool) -> Result<bool, Error> {
        self.strategy.rename(path, new_path, overwrite)
    }

    fn copy(&self, path: &str, new_path: &str) -> Result<bool, Error> {
        self.strategy.copy(path, new_path)
    }

    fn delete(&self, path: &str) -> Result<bool, Error> {
        self.strategy.delete(path)
    }
}
