//! Outbound Ports (Driven Ports)
//!
//! The engine client the bridge drives. Transport, gateway dialing and TLS
//! live behind these traits; implementations must be safe to share between
//! concurrently running job handlers.

use crate::domain::message::json_type_name;
use crate::domain::Job;
use crate::error::{MarshalError, TransportError};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Publish a message so the engine can correlate it to a waiting workflow instance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublishMessageCommand {
    /// Message name
    pub name: String,
    /// Correlation key
    pub correlation_key: String,
    /// Idempotency id
    pub message_id: Option<String>,
    /// Buffer duration on the broker
    pub time_to_live: Duration,
    /// Variables document, root is always an object
    pub variables: String,
}

impl PublishMessageCommand {
    /// Start a command for the named message.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: "{}".to_string(),
            ..Self::default()
        }
    }

    /// Set the correlation key.
    #[must_use]
    pub fn correlation_key(mut self, key: impl Into<String>) -> Self {
        self.correlation_key = key.into();
        self
    }

    /// Set the idempotency id.
    #[must_use]
    pub fn message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Set the time-to-live.
    #[must_use]
    pub fn time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = ttl;
        self
    }

    /// Set the variables from a JSON document.
    ///
    /// Fails unless the document parses and its root is an object.
    pub fn variables_from_str(mut self, variables: &str) -> Result<Self, MarshalError> {
        let parsed: Value =
            serde_json::from_str(variables).map_err(|source| MarshalError::Encode {
                what: "variables",
                source,
            })?;
        if !parsed.is_object() {
            return Err(MarshalError::VariablesNotObject {
                found: json_type_name(&parsed),
            });
        }
        self.variables = variables.to_string();
        Ok(self)
    }
}

/// Engine response to a publish command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublishMessageResponse {
    /// Server-assigned message key
    pub key: i64,
}

/// Lease up to `max_jobs_to_activate` jobs of one type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivateJobsCommand {
    /// Task type to lease
    pub job_type: String,
    /// Worker name reported to the engine
    pub worker_name: String,
    /// Lease duration; the engine re-offers the job after it passes
    pub timeout: Duration,
    /// Upper bound on returned jobs
    pub max_jobs_to_activate: usize,
    /// How long the gateway may hold the request open
    pub request_timeout: Duration,
}

/// Mark a job as successfully handled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompleteJobCommand {
    /// Job to complete
    pub job_key: i64,
}

impl CompleteJobCommand {
    pub fn new(job_key: i64) -> Self {
        Self { job_key }
    }
}

/// Mark a job as failed with the given remaining retries.
///
/// With `retries == 0` the engine raises an incident instead of re-offering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailJobCommand {
    /// Job to fail
    pub job_key: i64,
    /// Remaining retries
    pub retries: i32,
    /// Human-readable reason
    pub error_message: String,
}

impl FailJobCommand {
    pub fn new(job_key: i64, retries: i32, error_message: impl Into<String>) -> Self {
        Self {
            job_key,
            retries,
            error_message: error_message.into(),
        }
    }
}

/// Commands available to a job handler.
#[async_trait]
pub trait JobClient: Send + Sync {
    /// Complete a job.
    async fn complete_job(&self, command: CompleteJobCommand) -> Result<(), TransportError>;

    /// Fail a job.
    async fn fail_job(&self, command: FailJobCommand) -> Result<(), TransportError>;
}

/// The full engine client.
#[async_trait]
pub trait ZeebeClient: JobClient {
    /// Publish a message.
    async fn publish_message(
        &self,
        command: PublishMessageCommand,
    ) -> Result<PublishMessageResponse, TransportError>;

    /// Lease jobs. An empty result means nothing was available.
    async fn activate_jobs(&self, command: ActivateJobsCommand) -> Result<Vec<Job>, TransportError>;
}
