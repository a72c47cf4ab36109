//! # Zeebe Bridge
//!
//! Bridges a publish/subscribe message bus and a workflow engine's job
//! protocol.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure value types, no I/O
//!   - `Job`: An activated job as reported by the engine
//!   - `ZeebeMessage`: A message ready to publish to the engine
//!   - `ConfigurationMap`: Per-job merge of custom headers and variables
//!   - Idempotent setters for the reserved metadata keys
//!
//! - **Marshalling Layer** (`marshal/`): Bus message ⇄ engine shapes
//!   - `Marshaller` / `Unmarshaller`: Conversion traits
//!   - `DefaultMarshaller`: The `{"metadata": .., "payload": ..}` convention
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `JobHandler`: Driving port, called once per leased job
//!   - `ZeebeClient` / `JobClient`: Driven port, the engine client
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `Publisher`: Outbound bridge
//!   - `Subscriber`: Inbound bridge, resolves jobs from ack/nack
//!   - `JobWorker`: Semaphore-gated job worker pool
//!
//! ## Inbound Flow
//!
//! ```text
//! engine ──activate──▶ JobWorker ──▶ Unmarshaller ──▶ Subscription ──▶ consumer
//!    ▲                                                                   │
//!    └───────────── complete / fail ◀──────────── ack / nack ◀───────────┘
//! ```
//!
//! ## Reserved Metadata
//!
//! | Key              | Engine field     |
//! |------------------|------------------|
//! | `message_name`   | message name     |
//! | `message_ttl`    | time-to-live, ms |
//! | `correlation_id` | correlation key  |
//!
//! ## Usage Example
//!
//! ```ignore
//! use zeebe_bridge::{DefaultMarshaller, Subscriber, SubscriberConfig};
//!
//! let subscriber = Subscriber::new(
//!     SubscriberConfig::new()
//!         .with_client(client.clone())
//!         .with_unmarshaller(Arc::new(DefaultMarshaller)),
//! )?;
//!
//! let mut orders = subscriber.subscribe("order-placed").await?;
//! while let Some(msg) = orders.recv().await {
//!     process(&msg).await;
//!     msg.ack();
//! }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod domain;
pub mod error;
pub mod marshal;
pub mod metrics;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::BridgeSettings;
pub use domain::{
    message_name, parse_time_to_live, set_message_name, set_time_to_live, time_to_live,
    ConfigValue, ConfigurationMap, Job, ZeebeMessage, JOB_KEY, MESSAGE_NAME_METADATA_KEY,
    METADATA_VARIABLE, PAYLOAD_VARIABLE, TIME_TO_LIVE_METADATA_KEY, WORKFLOW_INSTANCE_KEY,
};
pub use error::{
    ConfigBuildError, MarshalError, PublishError, SubscribeError, TransportError,
    ValidationError,
};
pub use marshal::{DefaultMarshaller, Marshaller, Unmarshaller};
pub use metrics::{BridgeMetrics, MetricsSnapshot};
pub use ports::{
    ActivateJobsCommand, CompleteJobCommand, FailJobCommand, JobClient, JobHandler,
    PublishMessageCommand, PublishMessageResponse, ZeebeClient,
};
pub use service::{
    JobWorker, JobWorkerBuilder, Publisher, PublisherConfig, Subscriber, SubscriberConfig,
};

// Bus primitives used throughout the public API.
pub use shared_bus::{
    set_correlation_id, Message, Metadata, Subscription, CORRELATION_ID_METADATA_KEY,
};
