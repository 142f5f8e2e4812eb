//! Keel State
//!
//! Read access to infrastructure state held in pluggable storage backends.
//!
//! # Overview
//!
//! - **StateFile**: The stored state, with modules and their outputs
//! - **Backend**: A trait for storage backends (local files, S3, in-memory)
//! - **StateHandle**: A named state inside a backend, refreshed on demand
//! - **BackendRegistry**: Maps backend type names to factories
//!
//! # Example
//!
//! ```ignore
//! use keel_state::{BackendConfig, BackendRegistry, DEFAULT_WORKSPACE};
//!
//! let registry = BackendRegistry::with_builtin();
//! let factory = registry.factory_for("local").expect("local is built in");
//! let mut backend = factory();
//!
//! let attributes = backend.config_schema().coerce(&raw_config)?;
//! let config = BackendConfig::new("local", attributes);
//! backend.configure(&config).await;
//!
//! let mut state = backend.state(DEFAULT_WORKSPACE).await?;
//! state.refresh().await?;
//! ```

pub mod backend;
pub mod backends;
pub mod state;

// Re-export main types for convenience
pub use backend::{
    Backend, BackendConfig, BackendError, BackendResult, DEFAULT_WORKSPACE, StateHandle,
    validate_workspace_name,
};
pub use backends::{BackendFactory, BackendRegistry};
pub use state::{ModuleState, OutputState, ResourceState, StateFile};
