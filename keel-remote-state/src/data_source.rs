//! The remote state data source: schema plus value encoding of requests and results

use std::collections::HashMap;

use keel_core::{AttributeSchema, AttributeType, ConfigSchema, Value};

use crate::error::{RemoteStateError, ResolveResult};
use crate::request::{RemoteStateRequest, RemoteStateResult};
use crate::resolver::RemoteStateResolver;

/// Name under which the data source is exposed
pub const DATA_SOURCE_NAME: &str = "keel_remote_state";

/// Schema of the data source's arguments and attributes
pub fn data_source_schema() -> ConfigSchema {
    ConfigSchema::new(DATA_SOURCE_NAME)
        .attribute(
            AttributeSchema::new("backend", AttributeType::String)
                .required()
                .with_description("Type of the backend holding the state"),
        )
        .attribute(
            AttributeSchema::new("config", AttributeType::Dynamic)
                .with_description("Backend-specific configuration"),
        )
        .attribute(
            AttributeSchema::new("defaults", AttributeType::Map(Box::new(AttributeType::Dynamic)))
                .with_description("Fallback values for outputs missing from the state"),
        )
        .attribute(
            AttributeSchema::new("environment", AttributeType::String)
                .with_description("Deprecated, use workspace"),
        )
        .attribute(AttributeSchema::new("workspace", AttributeType::String))
        .attribute(AttributeSchema::new("outputs", AttributeType::Dynamic).computed())
}

impl RemoteStateRequest {
    /// Decode a request from an untyped data source configuration
    pub fn from_value(value: &Value) -> ResolveResult<Self> {
        let mut attributes = data_source_schema()
            .coerce(value)
            .map_err(|e| RemoteStateError::InvalidRequest(e.to_string()))?;

        let backend_type = match attributes.remove("backend") {
            Some(Value::String(s)) => s,
            _ => {
                return Err(RemoteStateError::InvalidRequest(
                    "backend must be a string".to_string(),
                ));
            }
        };

        Ok(Self {
            backend_type,
            config: attributes.remove("config").unwrap_or(Value::Null),
            environment: take_string(&mut attributes, "environment"),
            workspace: take_string(&mut attributes, "workspace"),
            defaults: match attributes.remove("defaults") {
                Some(Value::Map(map)) => Some(map),
                _ => None,
            },
        })
    }
}

fn take_string(attributes: &mut HashMap<String, Value>, name: &str) -> Option<String> {
    match attributes.remove(name) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

impl RemoteStateResult {
    /// Encode the result as a data source state value
    ///
    /// Optional arguments appear only when the request supplied them.
    pub fn to_value(&self) -> Value {
        let mut map = HashMap::new();
        map.insert("backend".to_string(), Value::from(self.backend_type.as_str()));
        map.insert("config".to_string(), self.config.clone());
        if let Some(ref environment) = self.environment {
            map.insert("environment".to_string(), Value::from(environment.as_str()));
        }
        if let Some(ref workspace) = self.workspace {
            map.insert("workspace".to_string(), Value::from(workspace.as_str()));
        }
        if let Some(ref defaults) = self.defaults {
            map.insert("defaults".to_string(), Value::Map(defaults.clone()));
        }
        map.insert("outputs".to_string(), Value::Map(self.outputs.clone()));
        Value::Map(map)
    }
}

/// Read the data source: decode the configuration, resolve, encode the result
pub async fn read_data_source(
    resolver: &RemoteStateResolver,
    config: &Value,
) -> ResolveResult<Value> {
    let request = RemoteStateRequest::from_value(config)?;
    let result = resolver.resolve(&request).await?;
    Ok(result.to_value())
}
