//! Service Layer
//!
//! The two bridges and the job worker pool that drives the inbound one.

pub mod publisher;
pub mod subscriber;
pub mod worker;

pub use publisher::{Publisher, PublisherConfig};
pub use subscriber::{Subscriber, SubscriberConfig};
pub use worker::{JobWorker, JobWorkerBuilder};
