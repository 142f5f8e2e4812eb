//! In-memory backend
//!
//! States live in an [`InMemoryStore`] shared by every backend created from
//! the same store. Useful for tests and for embedding Keel in another tool.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use keel_core::{ConfigSchema, Diagnostics};

use crate::backend::{
    Backend, BackendConfig, BackendError, BackendResult, StateHandle, validate_workspace_name,
};
use crate::state::StateFile;

/// Workspace name -> state, shared between backend instances
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    states: Arc<RwLock<HashMap<String, StateFile>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a state under a workspace name, replacing any previous one
    pub fn put(&self, name: impl Into<String>, state: StateFile) -> BackendResult<()> {
        let mut states = self
            .states
            .write()
            .map_err(|_| BackendError::Io("in-memory store lock poisoned".to_string()))?;
        states.insert(name.into(), state);
        Ok(())
    }

    pub fn get(&self, name: &str) -> BackendResult<Option<StateFile>> {
        let states = self
            .states
            .read()
            .map_err(|_| BackendError::Io("in-memory store lock poisoned".to_string()))?;
        Ok(states.get(name).cloned())
    }
}

/// Backend reading from an [`InMemoryStore`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    store: InMemoryStore,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new("inmem")
    }

    fn validate_config(&self, _config: &BackendConfig) -> Diagnostics {
        Diagnostics::new()
    }

    async fn configure(&mut self, _config: &BackendConfig) -> Diagnostics {
        Diagnostics::new()
    }

    async fn state(&self, name: &str) -> BackendResult<Box<dyn StateHandle>> {
        validate_workspace_name(name)?;
        Ok(Box::new(InMemoryState {
            store: self.store.clone(),
            name: name.to_string(),
            snapshot: None,
        }))
    }
}

struct InMemoryState {
    store: InMemoryStore,
    name: String,
    snapshot: Option<StateFile>,
}

#[async_trait]
impl StateHandle for InMemoryState {
    async fn refresh(&mut self) -> BackendResult<()> {
        self.snapshot = self.store.get(&self.name)?;
        Ok(())
    }

    fn snapshot(&self) -> Option<&StateFile> {
        self.snapshot.as_ref()
    }
}
