//! Backend selection by type name

use keel_state::{BackendFactory, BackendRegistry};

use crate::error::{RemoteStateError, ResolveResult};

/// Legacy name of the local backend
pub const LEGACY_LOCAL_BACKEND: &str = "_local";

/// Rewrite legacy backend type names to their current form
///
/// `_local` is kept working permanently as an alias of `local`.
pub fn canonical_backend_type(name: &str) -> &str {
    if name == LEGACY_LOCAL_BACKEND {
        log::info!(r#"Switching old (unsupported) backend "_local" to "local""#);
        "local"
    } else {
        name
    }
}

/// Find the factory for a backend type
///
/// Returns the canonical type name along with the factory. An unknown type is
/// reported under the name the caller supplied.
pub fn select_backend<'a>(
    registry: &BackendRegistry,
    name: &'a str,
) -> ResolveResult<(&'a str, BackendFactory)> {
    if name.is_empty() {
        return Err(RemoteStateError::InvalidRequest(
            "backend type must not be empty".to_string(),
        ));
    }

    let backend_type = canonical_backend_type(name);
    log::debug!("Initializing remote state backend: {}", backend_type);

    let factory = registry
        .factory_for(backend_type)
        .ok_or_else(|| RemoteStateError::UnknownBackendType(name.to_string()))?;
    Ok((backend_type, factory))
}
