//! # Shared Bus - Message Primitives for the Bridge
//!
//! The bus-side collaborator of the workflow-engine bridge: the message type,
//! its acknowledgment cell and execution context, correlation id helpers, and
//! the publisher/subscriber traits backends implement.
//!
//! ```text
//! ┌──────────────┐   publish()    ┌──────────────┐
//! │   Producer   │ ─────────────▶ │  Publisher   │
//! └──────────────┘                └──────────────┘
//!
//! ┌──────────────┐  subscribe()   ┌──────────────┐
//! │   Consumer   │ ◀───────────── │  Subscriber  │
//! │              │ ── ack/nack ─▶ │              │
//! └──────────────┘                └──────────────┘
//! ```
//!
//! Every delivered message must be resolved exactly once with `ack()` or
//! `nack()`; the producing side waits on that resolution.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod context;
pub mod correlation;
pub mod message;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use context::{Context, ContextError};
pub use correlation::{
    message_correlation_id, propagate_correlation_id, set_correlation_id,
    CORRELATION_ID_METADATA_KEY,
};
pub use message::{new_uuid, AckOutcome, AckState, AckWatcher, Message, Metadata};
pub use publisher::Publisher;
pub use subscriber::{Delivery, HandoffReceiver, Subscriber, Subscription};
