//! Marshalling Layer
//!
//! Stateless converters between bus messages and the engine's shapes.
//!
//! - [`Marshaller`]: bus message → [`ZeebeMessage`] (outbound)
//! - [`Unmarshaller`]: [`Job`] → bus message (inbound)
//!
//! The variables document produced outbound is always
//! `{"metadata": {..non-reserved metadata..}, "payload": <payload JSON>}`,
//! and the inbound side reads the same two variables back.

mod default;

pub use default::DefaultMarshaller;

use crate::domain::{Job, ZeebeMessage};
use crate::error::MarshalError;
use shared_bus::Message;

/// Converts a bus message into an engine message.
pub trait Marshaller: Send + Sync {
    /// Marshal `msg`, published on `topic`.
    fn marshal(&self, topic: &str, msg: &Message) -> Result<ZeebeMessage, MarshalError>;
}

/// Converts an activated job into a bus message.
pub trait Unmarshaller: Send + Sync {
    /// Unmarshal a job. `Ok(None)` means the job produces no message.
    fn unmarshal(&self, job: &Job) -> Result<Option<Message>, MarshalError>;
}
