//! Request and result of a remote state resolution

use std::collections::HashMap;

use keel_core::Value;

/// What to read: a backend reference plus the state selector fields
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteStateRequest {
    /// Backend type name as supplied by the caller (e.g., "s3", "_local")
    pub backend_type: String,
    /// Raw backend configuration, coerced against the backend's schema
    pub config: Value,
    /// Deprecated selector, superseded by `workspace`
    pub environment: Option<String>,
    pub workspace: Option<String>,
    /// Fallback output values
    pub defaults: Option<HashMap<String, Value>>,
}

impl RemoteStateRequest {
    pub fn new(backend_type: impl Into<String>, config: Value) -> Self {
        Self {
            backend_type: backend_type.into(),
            config,
            environment: None,
            workspace: None,
            defaults: None,
        }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    pub fn with_defaults(mut self, defaults: HashMap<String, Value>) -> Self {
        self.defaults = Some(defaults);
        self
    }
}

/// The request echoed back together with the resolved outputs
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteStateResult {
    pub backend_type: String,
    pub config: Value,
    pub environment: Option<String>,
    pub workspace: Option<String>,
    pub defaults: Option<HashMap<String, Value>>,
    /// Defaults overlaid with the non-null root outputs of the state
    pub outputs: HashMap<String, Value>,
}

impl RemoteStateResult {
    pub(crate) fn from_request(
        request: &RemoteStateRequest,
        outputs: HashMap<String, Value>,
    ) -> Self {
        Self {
            backend_type: request.backend_type.clone(),
            config: request.config.clone(),
            environment: request.environment.clone(),
            workspace: request.workspace.clone(),
            defaults: request.defaults.clone(),
            outputs,
        }
    }
}
