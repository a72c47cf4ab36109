//! Test utilities for the bridge.
//!
//! An in-memory engine that leases queued jobs, records every command it
//! receives, and can be told to misbehave. Enable with the `test-utils`
//! feature flag.
//!
//! # Example
//!
//! ```ignore
//! use zeebe_bridge::test_utils::InMemoryZeebe;
//!
//! let engine = Arc::new(InMemoryZeebe::new());
//! engine.route_messages_to("order-placed");
//! publisher.publish("orders", &[msg]).await?;
//! assert_eq!(engine.pending_jobs("order-placed"), 1);
//! ```

use crate::domain::{Job, MESSAGE_NAME_METADATA_KEY, TIME_TO_LIVE_METADATA_KEY};
use crate::error::TransportError;
use crate::ports::outbound::{
    ActivateJobsCommand, CompleteJobCommand, FailJobCommand, JobClient, PublishMessageCommand,
    PublishMessageResponse, ZeebeClient,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use shared_bus::CORRELATION_ID_METADATA_KEY;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Notify;

const FIRST_KEY: i64 = 2_251_799_813_685_249;

#[derive(Debug, Default)]
struct EngineState {
    queues: HashMap<String, VecDeque<Job>>,
    published: Vec<PublishMessageCommand>,
    seen_message_ids: HashSet<String>,
    completed: Vec<CompleteJobCommand>,
    failed: Vec<FailJobCommand>,
    activation_requests: Vec<ActivateJobsCommand>,
    route_to: Option<String>,
    next_key: i64,
    unavailable: bool,
    reject_job_commands: bool,
}

impl EngineState {
    fn next_key(&mut self) -> i64 {
        if self.next_key == 0 {
            self.next_key = FIRST_KEY;
        }
        let key = self.next_key;
        self.next_key += 1;
        key
    }
}

/// An engine double backed by in-memory queues.
#[derive(Debug, Default)]
pub struct InMemoryZeebe {
    state: Mutex<EngineState>,
    resolved: Notify,
}

impl InMemoryZeebe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a job. A zero key is replaced by a fresh one.
    pub fn enqueue_job(&self, mut job: Job) -> i64 {
        let mut state = self.state.lock();
        if job.key == 0 {
            job.key = state.next_key();
        }
        let key = job.key;
        state
            .queues
            .entry(job.job_type.clone())
            .or_default()
            .push_back(job);
        key
    }

    /// Turn every accepted published message into a job of `job_type`.
    pub fn route_messages_to(&self, job_type: impl Into<String>) {
        self.state.lock().route_to = Some(job_type.into());
    }

    /// Make every command fail with [`TransportError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Make complete/fail commands fail with [`TransportError::JobNotFound`].
    pub fn reject_job_commands(&self, reject: bool) {
        self.state.lock().reject_job_commands = reject;
    }

    pub fn published(&self) -> Vec<PublishMessageCommand> {
        self.state.lock().published.clone()
    }

    pub fn completed(&self) -> Vec<CompleteJobCommand> {
        self.state.lock().completed.clone()
    }

    pub fn failed(&self) -> Vec<FailJobCommand> {
        self.state.lock().failed.clone()
    }

    pub fn activation_requests(&self) -> Vec<ActivateJobsCommand> {
        self.state.lock().activation_requests.clone()
    }

    /// Jobs of `job_type` still waiting to be leased.
    pub fn pending_jobs(&self, job_type: &str) -> usize {
        self.state
            .lock()
            .queues
            .get(job_type)
            .map_or(0, VecDeque::len)
    }

    /// Number of complete and fail commands accepted so far.
    pub fn resolved_count(&self) -> usize {
        let state = self.state.lock();
        state.completed.len() + state.failed.len()
    }

    /// Wait until at least `count` jobs were completed or failed.
    ///
    /// Returns `false` if that did not happen within `timeout`.
    pub async fn wait_for_resolved(&self, count: usize, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.resolved.notified();
                if self.resolved_count() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }

    fn check_available(&self) -> Result<(), TransportError> {
        if self.state.lock().unavailable {
            return Err(TransportError::Unavailable(
                "in-memory engine is down".to_string(),
            ));
        }
        Ok(())
    }
}

/// Build the job the engine hands out once `command` is correlated to a
/// service task of `job_type`.
///
/// Name, time-to-live and correlation key travel as custom headers; the
/// variables are the published variables.
pub fn job_for_published(command: &PublishMessageCommand, job_type: &str) -> Job {
    let mut headers = Map::new();
    headers.insert(
        MESSAGE_NAME_METADATA_KEY.to_string(),
        Value::String(command.name.clone()),
    );
    headers.insert(
        TIME_TO_LIVE_METADATA_KEY.to_string(),
        Value::String(command.time_to_live.as_millis().to_string()),
    );
    if !command.correlation_key.is_empty() {
        headers.insert(
            CORRELATION_ID_METADATA_KEY.to_string(),
            Value::String(command.correlation_key.clone()),
        );
    }

    Job {
        job_type: job_type.to_string(),
        workflow_instance_key: rand::random::<u32>().into(),
        bpmn_process_id: "test-workflow".to_string(),
        workflow_definition_version: 1,
        element_id: "test-element".to_string(),
        custom_headers: Value::Object(headers).to_string(),
        retries: 3,
        variables: command.variables.clone(),
        ..Job::default()
    }
}

/// A ready-to-queue job with the given type, retries and variables.
pub fn job_with_variables(job_type: &str, retries: i32, variables: &str) -> Job {
    Job {
        job_type: job_type.to_string(),
        workflow_instance_key: rand::random::<u32>().into(),
        custom_headers: "{}".to_string(),
        retries,
        variables: variables.to_string(),
        ..Job::default()
    }
}

fn epoch_millis_after(timeout: Duration) -> i64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    i64::try_from((now + timeout).as_millis()).unwrap_or(i64::MAX)
}

#[async_trait]
impl JobClient for InMemoryZeebe {
    async fn complete_job(&self, command: CompleteJobCommand) -> Result<(), TransportError> {
        self.check_available()?;
        {
            let mut state = self.state.lock();
            if state.reject_job_commands {
                return Err(TransportError::JobNotFound(command.job_key));
            }
            state.completed.push(command);
        }
        self.resolved.notify_waiters();
        Ok(())
    }

    async fn fail_job(&self, command: FailJobCommand) -> Result<(), TransportError> {
        self.check_available()?;
        {
            let mut state = self.state.lock();
            if state.reject_job_commands {
                return Err(TransportError::JobNotFound(command.job_key));
            }
            state.failed.push(command);
        }
        self.resolved.notify_waiters();
        Ok(())
    }
}

#[async_trait]
impl ZeebeClient for InMemoryZeebe {
    async fn publish_message(
        &self,
        command: PublishMessageCommand,
    ) -> Result<PublishMessageResponse, TransportError> {
        self.check_available()?;
        if command.name.is_empty() {
            return Err(TransportError::Rejected(
                "message name must not be empty".to_string(),
            ));
        }

        let mut state = self.state.lock();
        let key = state.next_key();

        // A repeated id is accepted but not buffered again.
        if let Some(id) = &command.message_id {
            if !state.seen_message_ids.insert(id.clone()) {
                return Ok(PublishMessageResponse { key });
            }
        }

        if let Some(job_type) = state.route_to.clone() {
            let mut job = job_for_published(&command, &job_type);
            job.key = state.next_key();
            state.queues.entry(job_type).or_default().push_back(job);
        }
        state.published.push(command);

        Ok(PublishMessageResponse { key })
    }

    async fn activate_jobs(&self, command: ActivateJobsCommand) -> Result<Vec<Job>, TransportError> {
        self.check_available()?;

        let mut state = self.state.lock();
        let deadline = epoch_millis_after(command.timeout);
        let queue = state.queues.entry(command.job_type.clone()).or_default();
        let take = command.max_jobs_to_activate.min(queue.len());
        let jobs = queue
            .drain(..take)
            .map(|mut job| {
                job.worker = command.worker_name.clone();
                job.deadline = deadline;
                job
            })
            .collect();
        state.activation_requests.push(command);

        Ok(jobs)
    }
}
