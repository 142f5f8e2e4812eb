use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use keel_core::{AttributeSchema, AttributeType, ConfigSchema, Diagnostics};
use keel_state::backends::InMemoryStore;
use keel_state::{
    Backend, BackendConfig, BackendError, BackendResult, OutputState, StateFile, StateHandle,
};

/// Counts how far a resolution got into a [`ScriptedBackend`]
#[derive(Debug, Clone, Default)]
pub struct Calls {
    validate: Arc<AtomicUsize>,
    configure: Arc<AtomicUsize>,
    state: Arc<AtomicUsize>,
    refresh: Arc<AtomicUsize>,
}

impl Calls {
    pub fn validate(&self) -> usize {
        self.validate.load(Ordering::SeqCst)
    }

    pub fn configure(&self) -> usize {
        self.configure.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> usize {
        self.state.load(Ordering::SeqCst)
    }

    pub fn refresh(&self) -> usize {
        self.refresh.load(Ordering::SeqCst)
    }
}

/// Backend with a fixed schema whose diagnostics and failures are set up front
///
/// Schema: `address` (required String), `retries` (Int).
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    pub calls: Calls,
    pub store: InMemoryStore,
    pub validate_diagnostics: Diagnostics,
    pub configure_diagnostics: Diagnostics,
    pub refresh_error: Option<String>,
    pub configured: Option<BackendConfig>,
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new("scripted")
            .attribute(AttributeSchema::new("address", AttributeType::String).required())
            .attribute(AttributeSchema::new("retries", AttributeType::Int))
    }

    fn validate_config(&self, _config: &BackendConfig) -> Diagnostics {
        self.calls.validate.fetch_add(1, Ordering::SeqCst);
        self.validate_diagnostics.clone()
    }

    async fn configure(&mut self, config: &BackendConfig) -> Diagnostics {
        self.calls.configure.fetch_add(1, Ordering::SeqCst);
        self.configured = Some(config.clone());
        self.configure_diagnostics.clone()
    }

    async fn state(&self, name: &str) -> BackendResult<Box<dyn StateHandle>> {
        self.calls.state.fetch_add(1, Ordering::SeqCst);
        keel_state::validate_workspace_name(name)?;
        Ok(Box::new(ScriptedState {
            calls: self.calls.clone(),
            store: self.store.clone(),
            name: name.to_string(),
            refresh_error: self.refresh_error.clone(),
            snapshot: None,
        }))
    }
}

struct ScriptedState {
    calls: Calls,
    store: InMemoryStore,
    name: String,
    refresh_error: Option<String>,
    snapshot: Option<StateFile>,
}

#[async_trait]
impl StateHandle for ScriptedState {
    async fn refresh(&mut self) -> BackendResult<()> {
        self.calls.refresh.fetch_add(1, Ordering::SeqCst);
        if let Some(ref message) = self.refresh_error {
            return Err(BackendError::Io(message.clone()));
        }
        self.snapshot = self.store.get(&self.name)?;
        Ok(())
    }

    fn snapshot(&self) -> Option<&StateFile> {
        self.snapshot.as_ref()
    }
}

/// A state whose root module holds the given outputs
pub fn state_with_outputs(outputs: serde_json::Value) -> StateFile {
    let mut state = StateFile::new();
    if let serde_json::Value::Object(outputs) = outputs {
        for (name, value) in outputs {
            state = state.with_output(name, OutputState::new(value));
        }
    }
    state
}

/// Build a map of values from a JSON object
pub fn value_map(json: serde_json::Value) -> HashMap<String, keel_core::Value> {
    match keel_core::Value::from(json) {
        keel_core::Value::Map(map) => map,
        other => panic!("expected a JSON object, got {}", other.type_name()),
    }
}
