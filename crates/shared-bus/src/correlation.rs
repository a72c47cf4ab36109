//! # Correlation ID
//!
//! The correlation id lives in message metadata under [`CORRELATION_ID_METADATA_KEY`].
//! Routers copy it from consumed messages onto produced ones; the setter never
//! overwrites a value that is already present.

use crate::message::Message;

/// Metadata key holding the correlation id.
pub const CORRELATION_ID_METADATA_KEY: &str = "correlation_id";

/// Set the correlation id unless the message already carries a non-empty one.
pub fn set_correlation_id(id: &str, msg: &mut Message) {
    if !message_correlation_id(msg).is_empty() {
        return;
    }
    msg.metadata.set(CORRELATION_ID_METADATA_KEY, id);
}

/// Read the correlation id, or `""` when absent.
#[must_use]
pub fn message_correlation_id(msg: &Message) -> &str {
    msg.metadata.get(CORRELATION_ID_METADATA_KEY)
}

/// Carry the correlation id of `consumed` over to every produced message.
///
/// Consumed messages without a correlation id get a fresh one first.
pub fn propagate_correlation_id(consumed: &mut Message, produced: &mut [Message]) {
    if message_correlation_id(consumed).is_empty() {
        let id = crate::message::new_uuid();
        set_correlation_id(&id, consumed);
    }
    let id = message_correlation_id(consumed).to_string();
    for msg in produced {
        set_correlation_id(&id, msg);
    }
}
