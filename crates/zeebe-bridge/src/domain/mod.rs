//! Domain Layer
//!
//! Pure value types and rules, no I/O.

pub mod config_map;
pub mod job;
pub mod message;
pub mod metadata;

pub use config_map::{ConfigValue, ConfigurationMap, JOB_KEY, WORKFLOW_INSTANCE_KEY};
pub use job::Job;
pub use message::{ZeebeMessage, METADATA_VARIABLE, PAYLOAD_VARIABLE};
pub use metadata::{
    message_name, parse_time_to_live, set_message_name, set_time_to_live, time_to_live,
    MESSAGE_NAME_METADATA_KEY, TIME_TO_LIVE_METADATA_KEY,
};
