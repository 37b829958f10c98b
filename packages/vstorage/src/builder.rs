//! Assembling a [`VirtualStorage`] from a strategy and adapters.

use vstorage_core::{BackendRef, CallStrategy, Error, StrategyKind, VirtualStorage};

use crate::registry::AdapterRegistry;

/// Adapter used when none was added.
pub const DEFAULT_ADAPTER: &str = "FileSystem";

/// Builder for [`VirtualStorage`].
///
/// Without a strategy the storage uses [`StrategyKind::CallAll`]. Without
/// adapters it gets the [`DEFAULT_ADAPTER`] from the registry.
///
/// # Example
///
/// ```rust
/// use vstorage::{StorageBuilder, StrategyKind};
///
/// let storage = StorageBuilder::new()
///     .with_strategy_kind(StrategyKind::FallbackChain)
///     .add_builtin_adapter("Memory")
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(storage.call_strategy_name(), "FallBackChainStrategy");
/// ```
pub struct StorageBuilder {
    registry: AdapterRegistry,
    strategy: Option<Box<dyn CallStrategy>>,
    adapters: Vec<BackendRef>,
}

impl StorageBuilder {
    pub fn new() -> Self {
        Self {
            registry: AdapterRegistry::builtin(),
            strategy: None,
            adapters: Vec::new(),
        }
    }

    /// Resolve builtin adapter names against `registry` instead.
    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_strategy(mut self, strategy: Box<dyn CallStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_strategy_kind(self, kind: StrategyKind) -> Self {
        self.with_strategy(kind.create())
    }

    pub fn add_adapter(mut self, adapter: BackendRef) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Add a fresh instance of the registered adapter `name`.
    pub fn add_builtin_adapter(self, name: &str) -> Result<Self, Error> {
        let adapter = self.registry.create(name)?;
        Ok(self.add_adapter(adapter))
    }

    pub fn has_loaded_adapters(&self) -> bool {
        !self.adapters.is_empty()
    }

    pub fn build(mut self) -> Result<VirtualStorage, Error> {
        if !self.has_loaded_adapters() {
            self = self.add_builtin_adapter(DEFAULT_ADAPTER)?;
        }
        let mut strategy = self
            .strategy
            .unwrap_or_else(|| StrategyKind::default().create());
        tracing::debug!(
            strategy = strategy.strategy_name(),
            adapters = self.adapters.len(),
            "building storage"
        );
        strategy.set_adapters(self.adapters);
        Ok(VirtualStorage::new(strategy))
    }
}

impl Default for StorageBuilder {
    fn default() -> Self {
        Self::new()
    }
}
