//! Reserved metadata keys and their idempotent setters
//!
//! A setter never overwrites a value that is already set (non-empty name,
//! non-zero time-to-live), so values set upstream survive unmarshalling.

use shared_bus::Message;

/// Metadata key holding the engine message name.
pub const MESSAGE_NAME_METADATA_KEY: &str = "message_name";

/// Metadata key holding the time-to-live in milliseconds, as a decimal string.
pub const TIME_TO_LIVE_METADATA_KEY: &str = "message_ttl";

/// Set the message name unless one is already present.
pub fn set_message_name(name: &str, msg: &mut Message) {
    if !message_name(msg).is_empty() {
        return;
    }
    msg.metadata.set(MESSAGE_NAME_METADATA_KEY, name);
}

/// The message name, or `""`.
#[must_use]
pub fn message_name(msg: &Message) -> &str {
    msg.metadata.get(MESSAGE_NAME_METADATA_KEY)
}

/// Set the time-to-live unless a non-zero one is already present.
pub fn set_time_to_live(ttl_ms: i64, msg: &mut Message) {
    if time_to_live(msg) != 0 {
        return;
    }
    msg.metadata.set(TIME_TO_LIVE_METADATA_KEY, ttl_ms.to_string());
}

/// The time-to-live in milliseconds, or `0` when absent or unparsable.
#[must_use]
pub fn time_to_live(msg: &Message) -> i64 {
    parse_time_to_live(msg.metadata.get(TIME_TO_LIVE_METADATA_KEY))
}

/// Forgiving decimal parser: empty or invalid input is `0`.
#[must_use]
pub fn parse_time_to_live(value: &str) -> i64 {
    if value.is_empty() {
        return 0;
    }
    value.parse().unwrap_or(0)
}
