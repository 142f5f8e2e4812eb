//! Remote State Resolver - Read the outputs of a remote state

use std::sync::Arc;

use keel_state::BackendRegistry;

use crate::config::configure_backend;
use crate::error::ResolveResult;
use crate::outputs::load_outputs;
use crate::request::{RemoteStateRequest, RemoteStateResult};
use crate::selector::select_backend;
use crate::workspace::resolve_workspace;

/// Resolves remote state requests against a registry of backends
///
/// Every resolution builds and configures its own backend instance, so one
/// resolver can serve many concurrent requests.
#[derive(Clone)]
pub struct RemoteStateResolver {
    registry: Arc<BackendRegistry>,
}

impl RemoteStateResolver {
    pub fn new(registry: Arc<BackendRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Read the outputs of the state a request points at
    pub async fn resolve(&self, request: &RemoteStateRequest) -> ResolveResult<RemoteStateResult> {
        let (backend_type, factory) = select_backend(&self.registry, &request.backend_type)?;

        let mut backend = factory();
        configure_backend(&mut *backend, backend_type, &request.config).await?;

        let workspace = resolve_workspace(
            request.environment.as_deref(),
            request.workspace.as_deref(),
        );
        log::debug!(
            "Reading workspace '{}' from {} backend",
            workspace,
            backend_type
        );

        let outputs = load_outputs(&*backend, &workspace, request.defaults.as_ref()).await?;

        Ok(RemoteStateResult::from_request(request, outputs))
    }
}
