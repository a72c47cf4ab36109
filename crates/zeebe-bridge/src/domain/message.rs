//! Outbound engine message.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the variable holding restored bus metadata.
pub const METADATA_VARIABLE: &str = "metadata";

/// Name of the variable holding the bus payload.
pub const PAYLOAD_VARIABLE: &str = "payload";

/// A message as published to the engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZeebeMessage {
    /// The name of the message; required by the engine.
    pub name: String,
    /// The correlation key of the message.
    pub correlation_key: String,
    /// How long the message is buffered on the broker, in milliseconds.
    pub time_to_live: i64,
    /// Unique id; the engine accepts a given id only once during its lifetime.
    pub message_id: Option<String>,
    /// Variables as a JSON document whose root is an object,
    /// e.g. `{"metadata": {...}, "payload": ...}`.
    pub variables: String,
}

/// JSON type name, for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
