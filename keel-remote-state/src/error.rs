//! Errors that abort a remote state resolution

use thiserror::Error;

use keel_core::{CoercionError, Diagnostics};
use keel_state::BackendError;

/// Errors from resolving a remote state
///
/// Every variant is terminal: no partial result is produced.
#[derive(Debug, Error)]
pub enum RemoteStateError {
    /// The request itself is malformed
    #[error("Invalid remote state request: {0}")]
    InvalidRequest(String),

    /// No backend is registered under the name (as supplied by the caller)
    #[error("Unknown backend type: {0}")]
    UnknownBackendType(String),

    /// The raw configuration does not fit the backend's schema
    #[error("Invalid {backend_type} backend configuration: {source}")]
    InvalidBackendConfig {
        backend_type: String,
        source: CoercionError,
    },

    /// The backend rejected the coerced configuration
    #[error("{backend_type} backend configuration failed validation: {diagnostics}")]
    ConfigValidationFailed {
        backend_type: String,
        diagnostics: Diagnostics,
    },

    /// The backend could not apply the configuration
    #[error("Failed to configure {backend_type} backend: {diagnostics}")]
    ConfigureFailed {
        backend_type: String,
        diagnostics: Diagnostics,
    },

    /// The backend could not provide the named state
    #[error("Error loading the remote state '{workspace}': {source}")]
    StateLoad {
        workspace: String,
        source: BackendError,
    },

    /// Reading the state from the backend's storage failed
    #[error("Error refreshing the remote state '{workspace}': {source}")]
    StateRefresh {
        workspace: String,
        source: BackendError,
    },
}

/// Result type for resolution operations
pub type ResolveResult<T> = Result<T, RemoteStateError>;
