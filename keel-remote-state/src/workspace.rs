//! Choosing which named state to read

use keel_state::DEFAULT_WORKSPACE;

/// Resolve the workspace name from the two selector fields
///
/// `environment` is the deprecated field and only applies when `workspace`
/// is absent or names the default workspace. With neither field set the
/// default workspace is read.
pub fn resolve_workspace(environment: Option<&str>, workspace: Option<&str>) -> String {
    let mut name = environment;

    if let Some(workspace) = workspace
        && workspace != DEFAULT_WORKSPACE
    {
        name = Some(workspace);
    }

    name.unwrap_or(DEFAULT_WORKSPACE).to_string()
}
