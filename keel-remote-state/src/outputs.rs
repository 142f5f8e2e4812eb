//! Loading a state and projecting its outputs

use std::collections::HashMap;

use keel_core::Value;
use keel_state::{Backend, StateFile};

use crate::error::{RemoteStateError, ResolveResult};

/// Merge defaults with the root outputs of a state
///
/// Defaults are copied first. Every root output with a non-null value then
/// overwrites or adds its entry; null outputs leave the defaults untouched.
/// An empty or missing state yields the defaults alone.
pub fn project_outputs(
    defaults: Option<&HashMap<String, Value>>,
    snapshot: Option<&StateFile>,
) -> HashMap<String, Value> {
    let mut outputs = HashMap::new();

    if let Some(defaults) = defaults {
        outputs.extend(defaults.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    match snapshot {
        Some(state) if !state.is_empty() => {
            for (name, output) in state.root_outputs() {
                if let Some(value) = output.value() {
                    outputs.insert(name.clone(), value);
                }
            }
        }
        _ => log::debug!("empty remote state"),
    }

    outputs
}

/// Refresh the named state from the backend and project its outputs
pub async fn load_outputs(
    backend: &dyn Backend,
    workspace: &str,
    defaults: Option<&HashMap<String, Value>>,
) -> ResolveResult<HashMap<String, Value>> {
    let mut state = backend
        .state(workspace)
        .await
        .map_err(|source| RemoteStateError::StateLoad {
            workspace: workspace.to_string(),
            source,
        })?;

    state
        .refresh()
        .await
        .map_err(|source| RemoteStateError::StateRefresh {
            workspace: workspace.to_string(),
            source,
        })?;

    Ok(project_outputs(defaults, state.snapshot()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ScriptedBackend, state_with_outputs, value_map};
    use keel_state::{DEFAULT_WORKSPACE, ModuleState, OutputState};
    use serde_json::json;

    #[test]
    fn test_remote_outputs_overwrite_defaults() {
        let defaults = value_map(json!({"a": 1, "b": 2}));
        let state = state_with_outputs(json!({"b": 20, "c": 30}));

        let outputs = project_outputs(Some(&defaults), Some(&state));
        assert_eq!(outputs, value_map(json!({"a": 1, "b": 20, "c": 30})));
    }

    #[test]
    fn test_empty_state_yields_defaults() {
        let defaults = value_map(json!({"a": 1}));

        let outputs = project_outputs(Some(&defaults), Some(&StateFile::new()));
        assert_eq!(outputs, defaults);

        let outputs = project_outputs(Some(&defaults), None);
        assert_eq!(outputs, defaults);
    }

    #[test]
    fn test_no_defaults_and_no_state_is_empty() {
        assert!(project_outputs(None, None).is_empty());
    }

    #[test]
    fn test_null_outputs_are_dropped() {
        let defaults = value_map(json!({"a": "fallback"}));
        let state = state_with_outputs(json!({"a": null, "b": null, "c": "set"}));

        let outputs = project_outputs(Some(&defaults), Some(&state));
        assert_eq!(outputs, value_map(json!({"a": "fallback", "c": "set"})));
    }

    #[test]
    fn test_child_module_outputs_are_ignored() {
        let mut child = ModuleState::root();
        child.path.push("network".to_string());
        child
            .outputs
            .insert("vpc_id".to_string(), OutputState::new(json!("vpc-1")));
        let mut state = StateFile::new();
        state.modules.push(child);

        let outputs = project_outputs(None, Some(&state));
        assert!(outputs.is_empty());
    }

    #[tokio::test]
    async fn test_load_outputs_reads_named_state() {
        let backend = ScriptedBackend::default();
        backend
            .store
            .put("prod", state_with_outputs(json!({"url": "https://prod"})))
            .unwrap();

        let outputs = load_outputs(&backend, "prod", None).await.unwrap();
        assert_eq!(outputs, value_map(json!({"url": "https://prod"})));

        let outputs = load_outputs(&backend, DEFAULT_WORKSPACE, None).await.unwrap();
        assert!(outputs.is_empty());
    }

    #[tokio::test]
    async fn test_load_outputs_state_error() {
        let backend = ScriptedBackend::default();
        let calls = backend.calls.clone();

        let result = load_outputs(&backend, "team/prod", None).await;
        match result {
            Err(RemoteStateError::StateLoad { workspace, .. }) => {
                assert_eq!(workspace, "team/prod")
            }
            other => panic!("Expected StateLoad error, got {:?}", other),
        }
        assert_eq!(calls.refresh(), 0);
    }

    #[tokio::test]
    async fn test_load_outputs_refresh_error() {
        let backend = ScriptedBackend {
            refresh_error: Some("connection reset".to_string()),
            ..Default::default()
        };

        let defaults = value_map(json!({"a": 1}));
        let result = load_outputs(&backend, DEFAULT_WORKSPACE, Some(&defaults)).await;
        assert!(matches!(
            result,
            Err(RemoteStateError::StateRefresh { .. })
        ));
    }
}
