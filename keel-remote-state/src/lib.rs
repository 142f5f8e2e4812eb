//! Keel Remote State
//!
//! Reads the outputs of a state stored in a remote backend. A resolution runs
//! four stages in order, any of which can abort it:
//!
//! 1. **Backend selection** - map the backend type name to a factory
//! 2. **Configuration** - coerce, validate and apply the raw configuration
//! 3. **Workspace resolution** - pick the named state to read
//! 4. **Output projection** - refresh the state and merge its root outputs
//!    over caller-supplied defaults
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use keel_remote_state::{RemoteStateResolver, RemoteStateRequest};
//! use keel_state::BackendRegistry;
//!
//! let resolver = RemoteStateResolver::new(Arc::new(BackendRegistry::with_builtin()));
//! let request = RemoteStateRequest::new("local", config).with_workspace("staging");
//! let result = resolver.resolve(&request).await?;
//! println!("{:?}", result.outputs);
//! ```

pub mod config;
pub mod data_source;
pub mod error;
pub mod outputs;
pub mod request;
pub mod resolver;
pub mod selector;
pub mod workspace;

#[cfg(test)]
mod test_utils;

pub use data_source::{DATA_SOURCE_NAME, data_source_schema, read_data_source};
pub use error::{RemoteStateError, ResolveResult};
pub use request::{RemoteStateRequest, RemoteStateResult};
pub use resolver::RemoteStateResolver;
