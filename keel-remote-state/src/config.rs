//! Coercing, validating and applying a backend configuration

use keel_core::{Diagnostics, Value};
use keel_state::{Backend, BackendConfig};

use crate::error::{RemoteStateError, ResolveResult};

/// Configure a fresh backend from a raw configuration value
///
/// Coercion, validation and configuration run strictly in that order; the
/// first stage reporting an error stops the rest. Warnings are logged and
/// otherwise ignored.
pub async fn configure_backend(
    backend: &mut dyn Backend,
    backend_type: &str,
    raw: &Value,
) -> ResolveResult<()> {
    let attributes = backend.config_schema().coerce(raw).map_err(|source| {
        RemoteStateError::InvalidBackendConfig {
            backend_type: backend_type.to_string(),
            source,
        }
    })?;
    let config = BackendConfig::new(backend_type, attributes);

    let diagnostics = backend.validate_config(&config);
    log_warnings(backend_type, &diagnostics);
    if diagnostics.has_errors() {
        return Err(RemoteStateError::ConfigValidationFailed {
            backend_type: backend_type.to_string(),
            diagnostics,
        });
    }

    let diagnostics = backend.configure(&config).await;
    log_warnings(backend_type, &diagnostics);
    if diagnostics.has_errors() {
        return Err(RemoteStateError::ConfigureFailed {
            backend_type: backend_type.to_string(),
            diagnostics,
        });
    }

    Ok(())
}

fn log_warnings(backend_type: &str, diagnostics: &Diagnostics) {
    for warning in diagnostics.warnings() {
        log::warn!("{} backend: {}", backend_type, warning);
    }
}
