//! # Publisher
//!
//! Defines the publishing side of the bus.

use crate::message::Message;
use async_trait::async_trait;

/// Trait for publishing messages to a topic.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Error returned by the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Publish messages to `topic`, in order.
    ///
    /// Implementations may stop at the first failure; callers re-publish the
    /// messages that were not sent.
    async fn publish(&self, topic: &str, messages: &[Message]) -> Result<(), Self::Error>;

    /// Stop accepting messages. Repeated calls are no-ops.
    async fn close(&self) -> Result<(), Self::Error>;
}
