//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - what the worker pool calls per job
//! - Driven Ports (outbound) - the engine client

pub mod inbound;
pub mod outbound;

pub use inbound::JobHandler;
pub use outbound::{
    ActivateJobsCommand, CompleteJobCommand, FailJobCommand, JobClient, PublishMessageCommand,
    PublishMessageResponse, ZeebeClient,
};
