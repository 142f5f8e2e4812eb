//! Keel Core
//!
//! Shared building blocks for reading infrastructure state: a structured value
//! model, configuration schemas that coerce untyped values, and diagnostics.

pub mod diagnostics;
pub mod schema;
pub mod value;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use schema::{AttributeSchema, AttributeType, CoercionError, ConfigSchema, TypeError};
pub use value::Value;
