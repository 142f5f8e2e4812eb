//! Backend capability traits and error types

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use keel_core::{ConfigSchema, Diagnostics, Value};

use crate::state::StateFile;

/// Name of the workspace used when none is requested
pub const DEFAULT_WORKSPACE: &str = "default";

/// Errors that can occur when interacting with a state backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// `state` was called before a successful `configure`
    #[error("Backend is not configured")]
    NotConfigured,

    /// Configuration error
    #[error("Backend configuration error: {0}")]
    Configuration(String),

    /// The workspace name cannot address a state
    #[error("Invalid workspace name '{0}'")]
    InvalidWorkspace(String),

    /// State file is corrupted or invalid
    #[error("Invalid state file: {0}")]
    InvalidState(String),

    /// Network or I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),
}

impl BackendError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Check that a workspace name can address a state
///
/// Names end up in file paths and object keys, so they must be non-empty,
/// free of path separators, and not `.` or `..`.
pub fn validate_workspace_name(name: &str) -> BackendResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(BackendError::InvalidWorkspace(name.to_string()));
    }
    Ok(())
}

/// Trait for state storage backends
///
/// A backend instance is created fresh by a factory, configured once, and
/// then asked for named states. Backends never write state on behalf of a
/// reader.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Schema the raw configuration is coerced into
    fn config_schema(&self) -> ConfigSchema;

    /// Semantic checks the schema alone cannot express
    fn validate_config(&self, config: &BackendConfig) -> Diagnostics;

    /// Apply a validated configuration
    async fn configure(&mut self, config: &BackendConfig) -> Diagnostics;

    /// Get a handle to the named state
    ///
    /// The handle holds no data until it is refreshed.
    async fn state(&self, name: &str) -> BackendResult<Box<dyn StateHandle>>;
}

/// Handle to a single named state in a backend
#[async_trait]
pub trait StateHandle: Send + Sync {
    /// Reload the state from the backend's storage
    async fn refresh(&mut self) -> BackendResult<()>;

    /// The state as of the last refresh
    ///
    /// Returns `None` if no state exists (never written, or not refreshed)
    fn snapshot(&self) -> Option<&StateFile>;
}

/// Coerced configuration for a state backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend type (e.g., "s3", "local")
    pub backend_type: String,
    /// Backend-specific attributes
    pub attributes: HashMap<String, Value>,
}

impl BackendConfig {
    pub fn new(backend_type: impl Into<String>, attributes: HashMap<String, Value>) -> Self {
        Self {
            backend_type: backend_type.into(),
            attributes,
        }
    }

    /// Get a string attribute value
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.attributes.get(key) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get a boolean attribute value
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.attributes.get(key) {
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Get a boolean attribute with a default value
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let error = BackendError::InvalidWorkspace("a/b".to_string());
        assert_eq!(error.to_string(), "Invalid workspace name 'a/b'");

        let error = BackendError::configuration("missing bucket");
        assert_eq!(
            error.to_string(),
            "Backend configuration error: missing bucket"
        );
    }

    #[test]
    fn test_validate_workspace_name() {
        assert!(validate_workspace_name("default").is_ok());
        assert!(validate_workspace_name("prod-eu_1").is_ok());
        assert!(validate_workspace_name("").is_err());
        assert!(validate_workspace_name("..").is_err());
        assert!(validate_workspace_name("team/prod").is_err());
        assert!(validate_workspace_name("team\\prod").is_err());
    }

    #[test]
    fn test_backend_config_accessors() {
        let mut attributes = HashMap::new();
        attributes.insert("bucket".to_string(), Value::from("state"));
        attributes.insert("encrypt".to_string(), Value::Bool(true));
        attributes.insert("endpoint".to_string(), Value::Null);
        let config = BackendConfig::new("s3", attributes);

        assert_eq!(config.get_string("bucket"), Some("state"));
        assert_eq!(config.get_string("endpoint"), None);
        assert_eq!(config.get_bool("encrypt"), Some(true));
        assert!(!config.get_bool_or("force_path_style", false));
    }
}
