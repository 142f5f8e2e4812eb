//! S3 backend for state storage

use async_trait::async_trait;
use aws_sdk_s3::Client;

use keel_core::{AttributeSchema, AttributeType, ConfigSchema, Diagnostic, Diagnostics};

use crate::backend::{
    Backend, BackendConfig, BackendError, BackendResult, DEFAULT_WORKSPACE, StateHandle,
    validate_workspace_name,
};
use crate::state::StateFile;

/// S3-based state backend
#[derive(Default)]
pub struct S3Backend {
    /// S3 client, available once configured
    client: Option<Client>,
    /// Bucket name
    bucket: String,
    /// Object key for the default workspace's state
    key: String,
    /// Prefix for the keys of non-default workspaces
    workspace_key_prefix: String,
}

impl S3Backend {
    /// Default prefix for non-default workspaces
    pub const DEFAULT_WORKSPACE_KEY_PREFIX: &'static str = "env:";

    pub fn new() -> Self {
        Self::default()
    }

    /// Object key holding the state of a workspace
    pub fn state_key(&self, name: &str) -> String {
        if name == DEFAULT_WORKSPACE {
            self.key.clone()
        } else {
            [self.workspace_key_prefix.as_str(), name, self.key.as_str()]
                .into_iter()
                .filter(|segment| !segment.is_empty())
                .collect::<Vec<_>>()
                .join("/")
        }
    }

    /// Get the bucket name
    pub fn bucket_name(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl Backend for S3Backend {
    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new("s3")
            .attribute(
                AttributeSchema::new("bucket", AttributeType::String)
                    .required()
                    .with_description("Name of the bucket holding the state"),
            )
            .attribute(
                AttributeSchema::new("key", AttributeType::String)
                    .required()
                    .with_description("Object key of the default workspace's state"),
            )
            .attribute(AttributeSchema::new("region", AttributeType::String).required())
            .attribute(
                AttributeSchema::new("workspace_key_prefix", AttributeType::String)
                    .with_default(Self::DEFAULT_WORKSPACE_KEY_PREFIX),
            )
            .attribute(
                AttributeSchema::new("endpoint", AttributeType::String)
                    .with_description("Custom endpoint for S3-compatible storage"),
            )
            .attribute(
                AttributeSchema::new("force_path_style", AttributeType::Bool).with_default(false),
            )
    }

    fn validate_config(&self, config: &BackendConfig) -> Diagnostics {
        let mut diags = Diagnostics::new();

        if config.get_string("bucket") == Some("") {
            diags.error("bucket", "must not be empty");
        }

        if let Some(key) = config.get_string("key") {
            if key.is_empty() {
                diags.error("key", "must not be empty");
            } else if key.starts_with('/') || key.ends_with('/') {
                diags.error("key", "must not start or end with '/'");
            }
        }

        if let Some(prefix) = config.get_string("workspace_key_prefix")
            && (prefix.starts_with('/') || prefix.ends_with('/'))
        {
            diags.error("workspace_key_prefix", "must not start or end with '/'");
        }

        if config.get_string("endpoint").is_some() && !config.get_bool_or("force_path_style", false)
        {
            diags.warning(
                "force_path_style",
                "custom endpoints usually require force_path_style = true",
            );
        }

        diags
    }

    async fn configure(&mut self, config: &BackendConfig) -> Diagnostics {
        let mut diags = Diagnostics::new();

        let (Some(bucket), Some(key), Some(region)) = (
            config.get_string("bucket"),
            config.get_string("key"),
            config.get_string("region"),
        ) else {
            diags.push(Diagnostic::error("bucket, key and region are required"));
            return diags;
        };

        self.bucket = bucket.to_string();
        self.key = key.to_string();
        self.workspace_key_prefix = config
            .get_string("workspace_key_prefix")
            .unwrap_or(Self::DEFAULT_WORKSPACE_KEY_PREFIX)
            .to_string();

        // Load AWS config with the specified region
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(region.to_string()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&aws_config)
            .force_path_style(config.get_bool_or("force_path_style", false));
        if let Some(endpoint) = config.get_string("endpoint") {
            builder = builder.endpoint_url(endpoint);
        }

        self.client = Some(Client::from_conf(builder.build()));
        diags
    }

    async fn state(&self, name: &str) -> BackendResult<Box<dyn StateHandle>> {
        validate_workspace_name(name)?;
        let client = self.client.clone().ok_or(BackendError::NotConfigured)?;

        Ok(Box::new(S3State {
            client,
            bucket: self.bucket.clone(),
            key: self.state_key(name),
            snapshot: None,
        }))
    }
}

/// A state object in an S3 bucket
struct S3State {
    client: Client,
    bucket: String,
    key: String,
    snapshot: Option<StateFile>,
}

#[async_trait]
impl StateHandle for S3State {
    async fn refresh(&mut self) -> BackendResult<()> {
        log::debug!("Reading state from s3://{}/{}", self.bucket, self.key);

        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let body = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| BackendError::Io(e.to_string()))?;
                let bytes = body.into_bytes();
                let state: StateFile = serde_json::from_slice(&bytes)
                    .map_err(|e| BackendError::InvalidState(e.to_string()))?;
                self.snapshot = Some(state);
                Ok(())
            }
            Err(err) => {
                if is_not_found_error(&err) {
                    self.snapshot = None;
                    Ok(())
                } else {
                    Err(BackendError::Aws(err.to_string()))
                }
            }
        }
    }

    fn snapshot(&self) -> Option<&StateFile> {
        self.snapshot.as_ref()
    }
}

/// Check if an S3 error is a "not found" error
fn is_not_found_error<E: std::fmt::Debug>(err: &aws_sdk_s3::error::SdkError<E>) -> bool {
    // Check the raw HTTP response status
    if let Some(raw) = err.raw_response() {
        return raw.status().as_u16() == 404;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::Value;
    use serde_json::json;

    fn backend(key: &str, prefix: &str) -> S3Backend {
        S3Backend {
            client: None,
            bucket: "state".to_string(),
            key: key.to_string(),
            workspace_key_prefix: prefix.to_string(),
        }
    }

    fn coerced(backend: &S3Backend, raw: serde_json::Value) -> BackendConfig {
        let attributes = backend.config_schema().coerce(&Value::from(raw)).unwrap();
        BackendConfig::new("s3", attributes)
    }

    #[test]
    fn test_state_key() {
        let backend = backend("network/keel.state.json", "env:");
        assert_eq!(backend.state_key(DEFAULT_WORKSPACE), "network/keel.state.json");
        assert_eq!(
            backend.state_key("prod"),
            "env:/prod/network/keel.state.json"
        );
    }

    #[test]
    fn test_state_key_without_prefix() {
        let backend = backend("a.json", "");
        assert_eq!(backend.state_key("prod"), "prod/a.json");
        assert_eq!(backend.state_key(DEFAULT_WORKSPACE), "a.json");

        let config = coerced(
            &backend,
            json!({
                "bucket": "state",
                "key": "a.json",
                "region": "eu-west-1",
                "workspace_key_prefix": ""
            }),
        );
        assert!(!backend.validate_config(&config).has_errors());
    }

    #[test]
    fn test_schema_requires_location() {
        let err = S3Backend::new()
            .config_schema()
            .coerce(&Value::from(json!({"bucket": "state"})))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Required attribute 'key' is missing; Required attribute 'region' is missing"
        );
    }

    #[test]
    fn test_schema_defaults() {
        let backend = S3Backend::new();
        let config = coerced(
            &backend,
            json!({"bucket": "state", "key": "a.json", "region": "eu-west-1"}),
        );
        assert_eq!(config.get_string("workspace_key_prefix"), Some("env:"));
        assert_eq!(config.get_bool("force_path_style"), Some(false));
        assert_eq!(config.get_string("endpoint"), None);
    }

    #[test]
    fn test_validate_config_key_slashes() {
        let backend = S3Backend::new();
        let config = coerced(
            &backend,
            json!({"bucket": "state", "key": "/a.json", "region": "eu-west-1"}),
        );
        let diags = backend.validate_config(&config);
        assert!(diags.has_errors());
        assert_eq!(diags.to_string(), "key: must not start or end with '/'");
    }

    #[test]
    fn test_validate_config_endpoint_warning() {
        let backend = S3Backend::new();
        let config = coerced(
            &backend,
            json!({
                "bucket": "state",
                "key": "a.json",
                "region": "us-east-1",
                "endpoint": "http://localhost:9000"
            }),
        );
        let diags = backend.validate_config(&config);
        assert!(!diags.has_errors());
        assert_eq!(diags.warnings().count(), 1);
    }

    #[tokio::test]
    async fn test_state_requires_configure() {
        let backend = S3Backend::new();
        let result = backend.state(DEFAULT_WORKSPACE).await;
        assert!(matches!(result, Err(BackendError::NotConfigured)));
    }
}
