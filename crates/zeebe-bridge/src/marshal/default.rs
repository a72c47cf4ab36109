//! Default marshaller
//!
//! Outbound, the three reserved metadata keys become first-class message
//! fields and every other metadata entry rides along in the `metadata`
//! variable. A payload that is not JSON (including an empty one) is sent as
//! JSON `null`.

use super::{Marshaller, Unmarshaller};
use crate::domain::{
    message_name, set_message_name, set_time_to_live, time_to_live, ConfigurationMap, Job,
    ZeebeMessage, MESSAGE_NAME_METADATA_KEY, METADATA_VARIABLE, PAYLOAD_VARIABLE,
    TIME_TO_LIVE_METADATA_KEY,
};
use crate::domain::message::json_type_name;
use crate::error::MarshalError;
use serde_json::{Map, Value};
use shared_bus::{
    message_correlation_id, new_uuid, set_correlation_id, Message, CORRELATION_ID_METADATA_KEY,
};
use tracing::warn;

/// Keys that map onto message fields and are not copied into `metadata`.
const RESERVED_KEYS: [&str; 3] = [
    MESSAGE_NAME_METADATA_KEY,
    TIME_TO_LIVE_METADATA_KEY,
    CORRELATION_ID_METADATA_KEY,
];

/// The built-in [`Marshaller`] and [`Unmarshaller`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultMarshaller;

impl Marshaller for DefaultMarshaller {
    fn marshal(&self, topic: &str, msg: &Message) -> Result<ZeebeMessage, MarshalError> {
        let metadata: Map<String, Value> = msg
            .metadata
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();

        let payload = match serde_json::from_slice::<Value>(&msg.payload) {
            Ok(value) => value,
            Err(e) => {
                if !msg.payload.is_empty() {
                    warn!(
                        topic = topic,
                        message_uuid = %msg.uuid,
                        error = %e,
                        "Payload is not JSON, sending null"
                    );
                }
                Value::Null
            }
        };

        let mut document = Map::with_capacity(2);
        document.insert(METADATA_VARIABLE.to_string(), Value::Object(metadata));
        document.insert(PAYLOAD_VARIABLE.to_string(), payload);

        let variables = serde_json::to_string(&Value::Object(document)).map_err(|source| {
            MarshalError::Encode {
                what: "variables",
                source,
            }
        })?;

        Ok(ZeebeMessage {
            name: message_name(msg).to_string(),
            correlation_key: message_correlation_id(msg).to_string(),
            time_to_live: time_to_live(msg),
            message_id: Some(msg.uuid.clone()),
            variables,
        })
    }
}

impl Unmarshaller for DefaultMarshaller {
    fn unmarshal(&self, job: &Job) -> Result<Option<Message>, MarshalError> {
        let config = ConfigurationMap::build(job)?;

        let payload = match config.variable(PAYLOAD_VARIABLE) {
            Some(value) => serde_json::to_vec(value).map_err(|source| MarshalError::Encode {
                what: "payload",
                source,
            })?,
            None => Vec::new(),
        };

        let mut msg = Message::new(new_uuid(), payload);

        let name = config.get_string(MESSAGE_NAME_METADATA_KEY);
        if !name.is_empty() {
            set_message_name(name, &mut msg);
        }

        let correlation_id = config.get_string(CORRELATION_ID_METADATA_KEY);
        if !correlation_id.is_empty() {
            set_correlation_id(correlation_id, &mut msg);
        }

        let ttl = config.get_int64(TIME_TO_LIVE_METADATA_KEY);
        if ttl != 0 {
            set_time_to_live(ttl, &mut msg);
        }

        if let Some(metadata) = config.get_nested_map(METADATA_VARIABLE) {
            for (key, value) in metadata {
                let Value::String(value) = value else {
                    return Err(MarshalError::NonStringMetadata {
                        key: key.clone(),
                        found: json_type_name(value),
                    });
                };
                msg.metadata.set(key.clone(), value.clone());
            }
        }

        Ok(Some(msg))
    }
}
