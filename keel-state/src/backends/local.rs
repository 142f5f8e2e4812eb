//! Local file backend for state storage
//!
//! The default workspace is stored in a single JSON file (default:
//! keel.state.json). Every other workspace lives in its own directory under
//! the workspace directory (default: keel.state.d/<name>/keel.state.json).

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use keel_core::{AttributeSchema, AttributeType, ConfigSchema, Diagnostics};

use crate::backend::{
    Backend, BackendConfig, BackendError, BackendResult, DEFAULT_WORKSPACE, StateHandle,
    validate_workspace_name,
};
use crate::state::StateFile;

/// Local file backend for development and simple use cases
pub struct LocalBackend {
    /// Path to the default workspace's state file
    state_path: PathBuf,
    /// Directory holding the other workspaces
    workspace_dir: PathBuf,
}

impl LocalBackend {
    /// Default state file name
    pub const DEFAULT_STATE_FILE: &'static str = "keel.state.json";

    /// Default directory for non-default workspaces
    pub const DEFAULT_WORKSPACE_DIR: &'static str = "keel.state.d";

    /// Create a new LocalBackend with default paths in the current directory
    pub fn new() -> Self {
        Self::with_path(PathBuf::from(Self::DEFAULT_STATE_FILE))
    }

    /// Create a new LocalBackend with a specific state file path
    pub fn with_path(state_path: PathBuf) -> Self {
        Self {
            state_path,
            workspace_dir: PathBuf::from(Self::DEFAULT_WORKSPACE_DIR),
        }
    }

    /// Get the state file path of the default workspace
    pub fn state_path(&self) -> &PathBuf {
        &self.state_path
    }

    /// Path of the state file for a workspace
    pub fn workspace_state_path(&self, name: &str) -> PathBuf {
        if name == DEFAULT_WORKSPACE {
            self.state_path.clone()
        } else {
            self.workspace_dir
                .join(name)
                .join(Self::DEFAULT_STATE_FILE)
        }
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for LocalBackend {
    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new("local")
            .attribute(
                AttributeSchema::new("path", AttributeType::String)
                    .with_default(Self::DEFAULT_STATE_FILE)
                    .with_description("Path to the state file of the default workspace"),
            )
            .attribute(
                AttributeSchema::new("workspace_dir", AttributeType::String)
                    .with_default(Self::DEFAULT_WORKSPACE_DIR)
                    .with_description("Directory holding non-default workspaces"),
            )
    }

    fn validate_config(&self, config: &BackendConfig) -> Diagnostics {
        let mut diags = Diagnostics::new();
        for attribute in ["path", "workspace_dir"] {
            if config.get_string(attribute) == Some("") {
                diags.error(attribute, "must not be empty");
            }
        }
        diags
    }

    async fn configure(&mut self, config: &BackendConfig) -> Diagnostics {
        if let Some(path) = config.get_string("path") {
            self.state_path = PathBuf::from(path);
        }
        if let Some(dir) = config.get_string("workspace_dir") {
            self.workspace_dir = PathBuf::from(dir);
        }
        Diagnostics::new()
    }

    async fn state(&self, name: &str) -> BackendResult<Box<dyn StateHandle>> {
        validate_workspace_name(name)?;
        Ok(Box::new(LocalState::new(self.workspace_state_path(name))))
    }
}

/// A state file on the local filesystem
pub struct LocalState {
    path: PathBuf,
    snapshot: Option<StateFile>,
}

impl LocalState {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            snapshot: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateHandle for LocalState {
    async fn refresh(&mut self) -> BackendResult<()> {
        if !self.path.exists() {
            self.snapshot = None;
            return Ok(());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| BackendError::Io(format!("Failed to read state file: {}", e)))?;

        let state: StateFile = serde_json::from_str(&content).map_err(|e| {
            BackendError::InvalidState(format!("Failed to parse state file: {}", e))
        })?;

        self.snapshot = Some(state);
        Ok(())
    }

    fn snapshot(&self) -> Option<&StateFile> {
        self.snapshot.as_ref()
    }
}
