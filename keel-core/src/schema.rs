//! Schema - Describe and coerce configuration values
//!
//! Backends declare the shape of their configuration as a [`ConfigSchema`].
//! Callers hand over loosely-typed values; coercion converts them into the
//! declared shape or reports every mismatch it finds.

use std::collections::HashMap;
use std::fmt;

use crate::value::Value;

/// Attribute type
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    /// String
    String,
    /// Whole number
    Int,
    /// Whole or real number
    Number,
    /// Boolean
    Bool,
    /// List
    List(Box<AttributeType>),
    /// Map with string keys
    Map(Box<AttributeType>),
    /// Any value, left untouched
    Dynamic,
}

impl AttributeType {
    /// Convert a value into this type
    ///
    /// `Null` is accepted by every type; whether an attribute may be null is
    /// decided by the owning [`ConfigSchema`].
    pub fn coerce(&self, value: &Value) -> Result<Value, TypeError> {
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (AttributeType::Dynamic, v) => Ok(v.clone()),

            (AttributeType::String, Value::String(_)) => Ok(value.clone()),
            (AttributeType::String, Value::Int(n)) => Ok(Value::String(n.to_string())),
            (AttributeType::String, Value::Float(f)) => Ok(Value::String(f.to_string())),
            (AttributeType::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),

            (AttributeType::Int, Value::Int(_)) => Ok(value.clone()),
            (AttributeType::Int, Value::Float(f)) => float_to_int(*f).ok_or_else(|| {
                TypeError::ConversionFailed {
                    value: f.to_string(),
                    expected: self.type_name(),
                }
            }),
            (AttributeType::Int, Value::String(s)) => {
                s.parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| TypeError::ConversionFailed {
                        value: s.clone(),
                        expected: self.type_name(),
                    })
            }

            (AttributeType::Number, Value::Int(_) | Value::Float(_)) => Ok(value.clone()),
            (AttributeType::Number, Value::String(s)) => parse_number(s).ok_or_else(|| {
                TypeError::ConversionFailed {
                    value: s.clone(),
                    expected: self.type_name(),
                }
            }),

            (AttributeType::Bool, Value::Bool(_)) => Ok(value.clone()),
            (AttributeType::Bool, Value::String(s)) => match s.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(TypeError::ConversionFailed {
                    value: s.clone(),
                    expected: self.type_name(),
                }),
            },

            (AttributeType::List(inner), Value::List(items)) => {
                let mut coerced = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let item = inner.coerce(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                    coerced.push(item);
                }
                Ok(Value::List(coerced))
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();

                let mut coerced = HashMap::with_capacity(map.len());
                for k in keys {
                    let v = inner.coerce(&map[k]).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                    coerced.insert(k.clone(), v);
                }
                Ok(Value::Map(coerced))
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Number => "Number".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Dynamic => "Dynamic".to_string(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

// i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive
fn float_to_int(f: f64) -> Option<Value> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(Value::Int(f as i64))
    } else {
        None
    }
}

fn parse_number(s: &str) -> Option<Value> {
    if let Ok(n) = s.parse::<i64>() {
        return Some(Value::Int(n));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Float)
}

/// Type error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Cannot convert '{value}' to {expected}")]
    ConversionFailed { value: String, expected: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    ComputedAttribute { name: String },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

/// All errors found while coercing a value against a [`ConfigSchema`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
pub struct CoercionError {
    pub errors: Vec<TypeError>,
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Set by the owner of the schema, never by callers
    pub computed: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            default: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

/// Schema for an object-shaped configuration value
#[derive(Debug, Clone)]
pub struct ConfigSchema {
    pub name: String,
    pub attributes: HashMap<String, AttributeSchema>,
}

impl ConfigSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    /// Coerce a raw value into this schema's shape
    ///
    /// `Null` is treated as an empty object. The result holds an entry for
    /// every declared attribute: absent optional attributes take their default,
    /// or `Null` when they have none.
    pub fn coerce(&self, value: &Value) -> Result<HashMap<String, Value>, CoercionError> {
        let empty = HashMap::new();
        let supplied = match value {
            Value::Null => &empty,
            Value::Map(map) => map,
            other => {
                return Err(CoercionError {
                    errors: vec![TypeError::TypeMismatch {
                        expected: "Object".to_string(),
                        got: other.type_name(),
                    }],
                });
            }
        };

        let mut errors = Vec::new();

        // Sorted so that error messages are stable
        let mut unknown: Vec<&String> = supplied
            .keys()
            .filter(|k| !self.attributes.contains_key(*k))
            .collect();
        unknown.sort();
        for name in unknown {
            errors.push(TypeError::UnknownAttribute { name: name.clone() });
        }

        let mut names: Vec<&String> = self.attributes.keys().collect();
        names.sort();

        let mut coerced = HashMap::with_capacity(self.attributes.len());
        for name in names {
            let schema = &self.attributes[name];
            match supplied.get(name).filter(|v| !v.is_null()) {
                Some(_) if schema.computed => {
                    errors.push(TypeError::ComputedAttribute { name: name.clone() });
                }
                Some(v) => match schema.attr_type.coerce(v) {
                    Ok(v) => {
                        coerced.insert(name.clone(), v);
                    }
                    Err(e) => errors.push(TypeError::AttributeError {
                        name: name.clone(),
                        inner: Box::new(e),
                    }),
                },
                None if schema.required && schema.default.is_none() => {
                    errors.push(TypeError::MissingRequired { name: name.clone() });
                }
                None => {
                    let value = schema.default.clone().unwrap_or(Value::Null);
                    coerced.insert(name.clone(), value);
                }
            }
        }

        if errors.is_empty() {
            Ok(coerced)
        } else {
            Err(CoercionError { errors })
        }
    }
}
