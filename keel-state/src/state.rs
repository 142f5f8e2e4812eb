//! State file structures as stored by backends

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use keel_core::Value;

/// Path of the root module
pub const ROOT_MODULE: &str = "root";

/// The main state file structure that persists in a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    /// State file format version
    pub version: u32,
    /// Monotonically increasing number for each state modification
    pub serial: u64,
    /// Unique identifier for this state lineage
    pub lineage: String,
    /// Version of Keel that last wrote this state
    #[serde(default)]
    pub keel_version: String,
    /// Modules, the root module among them
    #[serde(default)]
    pub modules: Vec<ModuleState>,
}

impl StateFile {
    /// Current state file format version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a new empty state file
    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            lineage: uuid::Uuid::new_v4().to_string(),
            keel_version: env!("CARGO_PKG_VERSION").to_string(),
            modules: Vec::new(),
        }
    }

    /// True when the state records nothing: no modules, or only modules
    /// without outputs and resources
    pub fn is_empty(&self) -> bool {
        self.modules.iter().all(ModuleState::is_empty)
    }

    pub fn root_module(&self) -> Option<&ModuleState> {
        self.modules.iter().find(|m| m.is_root())
    }

    /// Outputs of the root module
    pub fn root_outputs(&self) -> impl Iterator<Item = (&String, &OutputState)> {
        self.root_module()
            .into_iter()
            .flat_map(|module| module.outputs.iter())
    }

    /// Set a root module output, creating the root module if needed
    pub fn with_output(mut self, name: impl Into<String>, output: OutputState) -> Self {
        let position = match self.modules.iter().position(ModuleState::is_root) {
            Some(position) => position,
            None => {
                self.modules.push(ModuleState::root());
                self.modules.len() - 1
            }
        };
        self.modules[position].outputs.insert(name.into(), output);
        self
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

/// State of a single module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleState {
    /// Module path from the root (e.g., ["root", "network"])
    pub path: Vec<String>,
    #[serde(default)]
    pub outputs: HashMap<String, OutputState>,
    #[serde(default)]
    pub resources: Vec<ResourceState>,
}

impl ModuleState {
    pub fn root() -> Self {
        Self {
            path: vec![ROOT_MODULE.to_string()],
            outputs: HashMap::new(),
            resources: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.path.len() == 1 && self.path[0] == ROOT_MODULE
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty() && self.resources.is_empty()
    }
}

/// A recorded output value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputState {
    /// Output value as JSON; `null` when the output has no value
    #[serde(default)]
    pub value: serde_json::Value,
    /// Type hint recorded by the writer (e.g., "string", "map")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    #[serde(default)]
    pub sensitive: bool,
}

impl OutputState {
    pub fn new(value: serde_json::Value) -> Self {
        Self {
            value,
            output_type: None,
            sensitive: false,
        }
    }

    /// The output value, or `None` if it was recorded as null
    pub fn value(&self) -> Option<Value> {
        if self.value.is_null() {
            None
        } else {
            Some(Value::from(&self.value))
        }
    }
}

/// State of a single managed resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Resource type (e.g., "s3.bucket", "vpc.vpc")
    pub resource_type: String,
    pub name: String,
    /// Provider name (e.g., "aws")
    pub provider: String,
    /// All attributes of the resource as JSON values
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl ResourceState {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            provider: provider.into(),
            attributes: HashMap::new(),
        }
    }
}
