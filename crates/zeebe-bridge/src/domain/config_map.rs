//! Typed read-only view over a job's combined header and variable key space
//!
//! Built once per job: custom headers first, then variables (variables win on
//! collision), then the synthetic `jobKey` and `workflowInstanceKey` keys.
//!
//! Accessors never fail. A missing key or a type mismatch yields the zero
//! value (`""`, `0`, `None`), so use [`ConfigurationMap::has`] when zero is a
//! meaningful value.

use super::job::Job;
use crate::error::ConfigBuildError;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Synthetic key holding the job key.
pub const JOB_KEY: &str = "jobKey";

/// Synthetic key holding the workflow instance key.
pub const WORKFLOW_INSTANCE_KEY: &str = "workflowInstanceKey";

/// A dynamically typed configuration value.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    NestedMap(Map<String, Value>),
    Other(Value),
}

impl From<Value> for ConfigValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::String(s),
            Value::Object(map) => Self::NestedMap(map),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Other(Value::Number(n)),
            },
            other => Self::Other(other),
        }
    }
}

impl ConfigValue {
    /// Coerce to a string slice; non-strings read as `""`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::String(s) => s,
            _ => "",
        }
    }

    /// Coerce to an integer.
    ///
    /// Decimal strings are parsed, floats truncated, anything else is `0`.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Integer(i) => *i,
            Self::String(s) => s.trim().parse().unwrap_or(0),
            Self::Other(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// Coerce to a nested map; non-objects read as `None`.
    #[must_use]
    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::NestedMap(map) => Some(map),
            _ => None,
        }
    }
}

/// Merged header/variable view of one job.
#[derive(Clone, Debug)]
pub struct ConfigurationMap {
    config: HashMap<String, ConfigValue>,
    variables: Map<String, Value>,
}

impl ConfigurationMap {
    /// Build the map from a job.
    ///
    /// Fails only when the headers or variables blob is not a JSON object.
    pub fn build(job: &Job) -> Result<Self, ConfigBuildError> {
        let headers = job.custom_headers_as_map()?;
        let variables = job.variables_as_map()?;

        let mut config: HashMap<String, ConfigValue> =
            HashMap::with_capacity(headers.len() + variables.len() + 2);

        for (key, value) in headers {
            config.insert(key, value.into());
        }
        for (key, value) in &variables {
            config.insert(key.clone(), value.clone().into());
        }

        config.insert(JOB_KEY.to_string(), ConfigValue::Integer(job.key));
        config.insert(
            WORKFLOW_INSTANCE_KEY.to_string(),
            ConfigValue::Integer(job.workflow_instance_key),
        );

        Ok(Self { config, variables })
    }

    /// Whether the key is present.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.config.contains_key(key)
    }

    /// Raw value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.config.get(key)
    }

    /// String value, or `""` on absence or mismatch.
    #[must_use]
    pub fn get_string(&self, key: &str) -> &str {
        self.get(key).map_or("", ConfigValue::as_str)
    }

    /// Integer value, or `0` on absence or mismatch.
    #[must_use]
    pub fn get_int64(&self, key: &str) -> i64 {
        self.get(key).map_or(0, ConfigValue::as_i64)
    }

    /// Nested map value, or `None` on absence or mismatch.
    #[must_use]
    pub fn get_nested_map(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(ConfigValue::as_map)
    }

    /// A value from the variables document only, ignoring headers.
    #[must_use]
    pub fn variable(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    /// Number of keys, synthetic ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.config.len()
    }

    /// Always `false`: the synthetic keys are always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.config.is_empty()
    }
}
