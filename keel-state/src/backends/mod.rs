//! Backend implementations and the registry that constructs them

mod inmem;
mod local;
mod s3;

pub use inmem::{InMemoryBackend, InMemoryStore};
pub use local::{LocalBackend, LocalState};
pub use s3::S3Backend;

use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::Backend;

/// Constructs a fresh, unconfigured backend instance
pub type BackendFactory = Arc<dyn Fn() -> Box<dyn Backend> + Send + Sync>;

/// Maps backend type names to factories
///
/// The registry is an ordinary value: callers build one and hand it to
/// whatever needs to construct backends.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    factories: HashMap<String, BackendFactory>,
}

impl BackendRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in backends (`local`, `s3`, `inmem`)
    ///
    /// Every `inmem` backend created by this registry shares one store.
    pub fn with_builtin() -> Self {
        let store = InMemoryStore::new();
        Self::new()
            .register("local", || Box::new(LocalBackend::new()))
            .register("s3", || Box::new(S3Backend::new()))
            .register("inmem", move || {
                Box::new(InMemoryBackend::with_store(store.clone()))
            })
    }

    /// Register a factory, replacing any factory with the same name
    pub fn register<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Backend> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Look up the factory for a backend type
    pub fn factory_for(&self, name: &str) -> Option<BackendFactory> {
        self.factories.get(name).cloned()
    }

    /// Registered backend type names, sorted
    pub fn backend_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DEFAULT_WORKSPACE;

    #[test]
    fn test_builtin_backend_types() {
        let registry = BackendRegistry::with_builtin();
        assert_eq!(registry.backend_types(), vec!["inmem", "local", "s3"]);
    }

    #[test]
    fn test_unknown_backend() {
        let registry = BackendRegistry::with_builtin();
        assert!(registry.factory_for("azurerm").is_none());
        assert!(registry.factory_for("_local").is_none());
    }

    #[test]
    fn test_factory_builds_backend() {
        let registry = BackendRegistry::with_builtin();
        let factory = registry.factory_for("local").unwrap();
        let backend = factory();
        assert!(backend.config_schema().attributes.contains_key("path"));
    }

    #[tokio::test]
    async fn test_registered_inmem_factory_reads_store() {
        let store = InMemoryStore::new();
        let shared = store.clone();
        let registry = BackendRegistry::new().register("inmem", move || {
            Box::new(InMemoryBackend::with_store(shared.clone()))
        });

        store
            .put(DEFAULT_WORKSPACE, crate::state::StateFile::new())
            .unwrap();

        let factory = registry.factory_for("inmem").unwrap();
        let mut handle = factory().state(DEFAULT_WORKSPACE).await.unwrap();
        handle.refresh().await.unwrap();
        assert!(handle.snapshot().is_some());
    }

    #[test]
    fn test_register_replaces() {
        let registry = BackendRegistry::new()
            .register("custom", || Box::new(LocalBackend::new()))
            .register("custom", || Box::new(InMemoryBackend::new()));
        let backend = registry.factory_for("custom").unwrap()();
        assert!(backend.config_schema().attributes.is_empty());
    }
}
