//! Inbound bridge
//!
//! Every subscribed topic is a job type. Each leased job becomes one bus
//! message, and the consumer's ack or nack decides how the job ends:
//!
//! | Outcome                              | Engine command                  |
//! |--------------------------------------|---------------------------------|
//! | ack                                  | complete                        |
//! | nack, dropped unacked, ack timed out | fail, `retries - 1` (min 0)     |
//! | unmarshal error or no message        | fail, 0 retries                 |
//! | subscriber closed while waiting      | fail, retries unchanged         |
//!
//! Handing a message to the consumer is a rendezvous: a handler counts the
//! message as delivered only once the consumer has received it. An offer that
//! expires or is cancelled before then is withdrawn, so the consumer never
//! sees a message for a job that was already failed or released. A slow
//! consumer therefore holds every handler permit and leasing stops until it
//! catches up.

use crate::config::BridgeSettings;
use crate::domain::Job;
use crate::error::{SubscribeError, ValidationError};
use crate::marshal::Unmarshaller;
use crate::metrics::BridgeMetrics;
use crate::ports::{CompleteJobCommand, FailJobCommand, JobClient, JobHandler, ZeebeClient};
use crate::service::worker::{JobWorker, JobWorkerBuilder};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_bus::{
    AckOutcome, Context, ContextError, Delivery, HandoffReceiver, Subscriber as BusSubscriber,
    Subscription,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Collaborators and settings for a [`Subscriber`].
#[derive(Clone, Default)]
pub struct SubscriberConfig {
    pub client: Option<Arc<dyn ZeebeClient>>,
    pub unmarshaller: Option<Arc<dyn Unmarshaller>>,
    pub settings: BridgeSettings,
}

impl SubscriberConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style method to set the engine client
    pub fn with_client(mut self, client: Arc<dyn ZeebeClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Builder-style method to set the unmarshaller
    pub fn with_unmarshaller(mut self, unmarshaller: Arc<dyn Unmarshaller>) -> Self {
        self.unmarshaller = Some(unmarshaller);
        self
    }

    /// Builder-style method to replace all settings
    pub fn with_settings(mut self, settings: BridgeSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Builder-style method to set the worker name
    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.settings.worker_name = name.into();
        self
    }

    /// Builder-style method to set the per-job timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.settings = self.settings.with_job_timeout(timeout);
        self
    }

    /// Default the worker name and per-job timeout when unset.
    pub fn set_defaults(&mut self) {
        self.settings.set_defaults();
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.client.is_none() {
            return Err(ValidationError::MissingClient);
        }
        if self.unmarshaller.is_none() {
            return Err(ValidationError::MissingUnmarshaller);
        }
        self.settings.validate()
    }
}

/// Subscribes to job types and delivers each job as a bus message.
pub struct Subscriber {
    client: Arc<dyn ZeebeClient>,
    unmarshaller: Arc<dyn Unmarshaller>,
    settings: BridgeSettings,
    workers: Mutex<Vec<JobWorker>>,
    /// Flips to `true` on close; every delivery context derives from it.
    lifecycle: watch::Sender<bool>,
    closed: AtomicBool,
    metrics: Arc<BridgeMetrics>,
}

impl Subscriber {
    pub fn new(config: SubscriberConfig) -> Result<Self, ValidationError> {
        Self::with_metrics(config, Arc::new(BridgeMetrics::new()))
    }

    /// Create a subscriber that records into shared counters.
    pub fn with_metrics(
        mut config: SubscriberConfig,
        metrics: Arc<BridgeMetrics>,
    ) -> Result<Self, ValidationError> {
        config.set_defaults();
        config.validate()?;
        let client = config.client.ok_or(ValidationError::MissingClient)?;
        let unmarshaller = config
            .unmarshaller
            .ok_or(ValidationError::MissingUnmarshaller)?;

        let (lifecycle, _) = watch::channel(false);
        Ok(Self {
            client,
            unmarshaller,
            settings: config.settings,
            workers: Mutex::new(Vec::new()),
            lifecycle,
            closed: AtomicBool::new(false),
            metrics,
        })
    }

    pub fn metrics(&self) -> &Arc<BridgeMetrics> {
        &self.metrics
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Open a job worker for `topic` and return its delivery stream.
    ///
    /// Subscribing to the same topic twice opens two workers that compete
    /// for the same jobs.
    pub async fn subscribe(&self, topic: &str) -> Result<Subscription, SubscribeError> {
        if self.is_closed() {
            return Err(SubscribeError::Closed);
        }

        let (sender, receiver) = mpsc::channel(1);
        let handler = DeliveryHandler {
            topic: topic.to_string(),
            unmarshaller: self.unmarshaller.clone(),
            sender,
            lifecycle: self.lifecycle.subscribe(),
            job_timeout: self.settings.job_timeout(),
            metrics: self.metrics.clone(),
        };

        let worker = JobWorkerBuilder::new(self.client.clone())
            .job_type(topic)
            .handler(Arc::new(handler))
            .settings(&self.settings)
            .metrics(self.metrics.clone())
            .open()?;

        {
            let mut workers = self.workers.lock();
            // Lost a race with close().
            if self.is_closed() {
                worker.close();
                return Err(SubscribeError::Closed);
            }
            workers.push(worker);
        }

        info!(topic = topic, worker = %self.settings.worker_name, "Subscribed");
        Ok(Subscription::new(topic, receiver))
    }

    /// Stop every worker and wait until in-flight jobs are completed or failed.
    ///
    /// Handlers still waiting for a consumer hand their job back with the
    /// retry counter unchanged. Idempotent.
    pub async fn close(&self) {
        let workers = {
            let mut workers = self.workers.lock();
            if self.closed.swap(true, Ordering::SeqCst) {
                return;
            }
            std::mem::take(&mut *workers)
        };

        self.lifecycle.send_replace(true);
        for worker in &workers {
            worker.close();
        }
        for worker in workers {
            worker.await_close().await;
        }
        info!("Subscriber closed");
    }
}

#[async_trait]
impl BusSubscriber for Subscriber {
    type Error = SubscribeError;

    async fn subscribe(&self, topic: &str) -> Result<Subscription, SubscribeError> {
        Subscriber::subscribe(self, topic).await
    }

    async fn close(&self) -> Result<(), SubscribeError> {
        Subscriber::close(self).await;
        Ok(())
    }
}

/// How a job ends.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    Complete,
    /// Fail with one retry fewer.
    Retry(String),
    /// Fail with no retries left.
    DeadLetter(String),
    /// Fail with the retry counter unchanged.
    Release(String),
}

/// Per-topic job handler: unmarshal, deliver, await the ack, resolve.
struct DeliveryHandler {
    topic: String,
    unmarshaller: Arc<dyn Unmarshaller>,
    sender: mpsc::Sender<Delivery>,
    lifecycle: watch::Receiver<bool>,
    job_timeout: Duration,
    metrics: Arc<BridgeMetrics>,
}

#[async_trait]
impl JobHandler for DeliveryHandler {
    async fn handle(&self, client: &dyn JobClient, job: Job) {
        let resolution = self.deliver(&job).await;
        self.resolve(client, &job, resolution).await;
    }
}

impl DeliveryHandler {
    async fn deliver(&self, job: &Job) -> Resolution {
        let mut msg = match self.unmarshaller.unmarshal(job) {
            Ok(Some(msg)) => msg,
            Ok(None) => {
                return Resolution::DeadLetter("job produced no message".to_string());
            }
            Err(e) => {
                error!(topic = %self.topic, job_key = job.key, error = %e, "Cannot unmarshal job");
                return Resolution::DeadLetter(format!("cannot unmarshal job: {e}"));
            }
        };

        let context = Context::with_cancel(self.lifecycle.clone()).with_timeout(self.job_timeout);
        msg.set_context(context.clone());
        let mut watcher = msg.ack_watcher();
        let message_uuid = msg.uuid.clone();

        let (delivery, mut handoff) = Delivery::offer(msg);
        let handed_off = tokio::select! {
            biased;
            reason = context.done() => Err(reason),
            taken = self.hand_off(delivery, &mut handoff) => Ok(taken),
        };
        match handed_off {
            Ok(true) => {}
            Ok(false) => return Resolution::Release("subscription dropped".to_string()),
            Err(reason) => {
                // Withdraw the offer. A consumer that took it first keeps it.
                handoff.close();
                if handoff.try_recv().is_err() {
                    return self.expired(reason, "waiting for a consumer");
                }
            }
        }

        self.metrics.record_message_delivered();
        debug!(
            topic = %self.topic,
            job_key = job.key,
            message_uuid = %message_uuid,
            "Delivered message"
        );

        let outcome = tokio::select! {
            biased;
            outcome = watcher.wait() => Ok(outcome),
            reason = context.done() => Err(reason),
        };
        match outcome {
            Ok(AckOutcome::Acked) => Resolution::Complete,
            Ok(AckOutcome::Nacked) => Resolution::Retry(format!("message {message_uuid} nacked")),
            Ok(AckOutcome::Dropped) => {
                Resolution::Retry(format!("message {message_uuid} dropped without ack"))
            }
            Err(reason) => self.expired(reason, "waiting for an ack"),
        }
    }

    /// Offer `delivery` and wait until a consumer takes it. `false` when the
    /// subscription went away first.
    async fn hand_off(&self, delivery: Delivery, handoff: &mut HandoffReceiver) -> bool {
        if self.sender.send(delivery).await.is_err() {
            return false;
        }
        handoff.await.is_ok()
    }

    fn expired(&self, reason: ContextError, waiting_for: &str) -> Resolution {
        match reason {
            ContextError::DeadlineExceeded => Resolution::Retry(format!(
                "timed out after {:?} {waiting_for}",
                self.job_timeout
            )),
            ContextError::Cancelled => Resolution::Release(format!("subscriber closed {waiting_for}")),
        }
    }

    async fn resolve(&self, client: &dyn JobClient, job: &Job, resolution: Resolution) {
        let result = match &resolution {
            Resolution::Complete => client.complete_job(CompleteJobCommand::new(job.key)).await,
            Resolution::Retry(reason) => {
                let retries = job.retries.saturating_sub(1).max(0);
                client
                    .fail_job(FailJobCommand::new(job.key, retries, reason.as_str()))
                    .await
            }
            Resolution::DeadLetter(reason) => {
                client
                    .fail_job(FailJobCommand::new(job.key, 0, reason.as_str()))
                    .await
            }
            Resolution::Release(reason) => {
                client
                    .fail_job(FailJobCommand::new(job.key, job.retries, reason.as_str()))
                    .await
            }
        };

        if let Err(e) = result {
            self.metrics.record_job_command_error();
            error!(
                topic = %self.topic,
                job_key = job.key,
                resolution = ?resolution,
                error = %e,
                "Engine did not accept job resolution"
            );
            return;
        }

        match resolution {
            Resolution::Complete => {
                self.metrics.record_job_completed();
                debug!(topic = %self.topic, job_key = job.key, "Job completed");
            }
            Resolution::Retry(reason) => {
                self.metrics.record_job_failed();
                debug!(topic = %self.topic, job_key = job.key, reason = %reason, "Job failed");
            }
            Resolution::DeadLetter(reason) => {
                self.metrics.record_job_dead_lettered();
                warn!(topic = %self.topic, job_key = job.key, reason = %reason, "Job failed without retries");
            }
            Resolution::Release(reason) => {
                self.metrics.record_job_released();
                debug!(topic = %self.topic, job_key = job.key, reason = %reason, "Job released");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MESSAGE_NAME_METADATA_KEY;
    use crate::error::MarshalError;
    use crate::marshal::DefaultMarshaller;
    use crate::test_utils::{job_with_variables, InMemoryZeebe};
    use shared_bus::Message;
    use tokio::time::{sleep, timeout};

    const TOPIC: &str = "svc";

    fn config(engine: &Arc<InMemoryZeebe>) -> SubscriberConfig {
        SubscriberConfig::new()
            .with_client(engine.clone())
            .with_unmarshaller(Arc::new(DefaultMarshaller))
            .with_settings(BridgeSettings::default().with_poll_interval(Duration::from_millis(5)))
    }

    async fn next_message(sub: &mut Subscription) -> Message {
        timeout(Duration::from_secs(2), sub.recv())
            .await
            .expect("timeout")
            .expect("message")
    }

    async fn resolved(engine: &InMemoryZeebe, count: usize) {
        assert!(
            engine.wait_for_resolved(count, Duration::from_secs(2)).await,
            "jobs not resolved"
        );
    }

    /// Wait until every queued job is leased and its handler is offering it.
    async fn all_offered(engine: &InMemoryZeebe) {
        timeout(Duration::from_secs(2), async {
            while engine.pending_jobs(TOPIC) > 0 {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("jobs not leased");
        sleep(Duration::from_millis(50)).await;
    }

    struct NoMessage;

    impl Unmarshaller for NoMessage {
        fn unmarshal(&self, _job: &Job) -> Result<Option<Message>, MarshalError> {
            Ok(None)
        }
    }

    #[test]
    fn test_new_requires_collaborators() {
        let err = Subscriber::new(SubscriberConfig::new()).err();
        assert_eq!(err, Some(ValidationError::MissingClient));

        let err = Subscriber::new(
            SubscriberConfig::new().with_client(Arc::new(InMemoryZeebe::new())),
        )
        .err();
        assert_eq!(err, Some(ValidationError::MissingUnmarshaller));
    }

    #[test]
    fn test_new_defaults_worker_name() {
        let engine = Arc::new(InMemoryZeebe::new());
        let subscriber = Subscriber::new(config(&engine).with_worker_name("")).expect("valid");
        assert_eq!(subscriber.settings.worker_name, "default");
    }

    #[tokio::test]
    async fn test_ack_completes_job() {
        let engine = Arc::new(InMemoryZeebe::new());
        let key = engine.enqueue_job(job_with_variables(
            TOPIC,
            3,
            r#"{"metadata":{"tenant":"acme"},"payload":{"n":1}}"#,
        ));
        let subscriber = Subscriber::new(config(&engine)).expect("valid");
        let mut sub = subscriber.subscribe(TOPIC).await.expect("subscribe");

        let msg = next_message(&mut sub).await;
        assert_eq!(msg.payload, br#"{"n":1}"#.to_vec());
        assert_eq!(msg.metadata.get("tenant"), "acme");
        assert!(msg.ack());

        resolved(&engine, 1).await;
        assert_eq!(engine.completed(), vec![CompleteJobCommand::new(key)]);
        assert!(engine.failed().is_empty());

        subscriber.close().await;
        assert_eq!(subscriber.metrics().snapshot().jobs_completed, 1);
    }

    #[tokio::test]
    async fn test_nack_fails_with_one_retry_fewer() {
        let engine = Arc::new(InMemoryZeebe::new());
        let key = engine.enqueue_job(job_with_variables(TOPIC, 3, r#"{"payload":1}"#));
        let subscriber = Subscriber::new(config(&engine)).expect("valid");
        let mut sub = subscriber.subscribe(TOPIC).await.expect("subscribe");

        next_message(&mut sub).await.nack();

        resolved(&engine, 1).await;
        let failed = engine.failed();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].job_key, key);
        assert_eq!(failed[0].retries, 2);

        subscriber.close().await;
    }

    #[tokio::test]
    async fn test_nack_with_no_retries_left_stays_at_zero() {
        let engine = Arc::new(InMemoryZeebe::new());
        engine.enqueue_job(job_with_variables(TOPIC, 0, r#"{"payload":1}"#));
        let subscriber = Subscriber::new(config(&engine)).expect("valid");
        let mut sub = subscriber.subscribe(TOPIC).await.expect("subscribe");

        next_message(&mut sub).await.nack();

        resolved(&engine, 1).await;
        assert_eq!(engine.failed()[0].retries, 0);
        subscriber.close().await;
    }

    #[tokio::test]
    async fn test_dropped_message_counts_as_nack() {
        let engine = Arc::new(InMemoryZeebe::new());
        engine.enqueue_job(job_with_variables(TOPIC, 2, r#"{"payload":1}"#));
        let subscriber = Subscriber::new(config(&engine)).expect("valid");
        let mut sub = subscriber.subscribe(TOPIC).await.expect("subscribe");

        drop(next_message(&mut sub).await);

        resolved(&engine, 1).await;
        assert_eq!(engine.failed()[0].retries, 1);
        subscriber.close().await;
    }

    #[tokio::test]
    async fn test_unmarshal_failure_fails_without_retries() {
        let engine = Arc::new(InMemoryZeebe::new());
        let key = engine.enqueue_job(job_with_variables(TOPIC, 3, r#"{"payload": "#));
        let subscriber = Subscriber::new(config(&engine)).expect("valid");
        let mut sub = subscriber.subscribe(TOPIC).await.expect("subscribe");

        resolved(&engine, 1).await;
        let failed = engine.failed();
        assert_eq!(failed[0].job_key, key);
        assert_eq!(failed[0].retries, 0);
        assert!(sub.try_recv().is_none());

        subscriber.close().await;
        assert_eq!(subscriber.metrics().snapshot().jobs_dead_lettered, 1);
    }

    #[tokio::test]
    async fn test_no_message_fails_without_retries() {
        let engine = Arc::new(InMemoryZeebe::new());
        engine.enqueue_job(job_with_variables(TOPIC, 3, "{}"));
        let subscriber = Subscriber::new(config(&engine).with_unmarshaller(Arc::new(NoMessage)))
            .expect("valid");
        let _sub = subscriber.subscribe(TOPIC).await.expect("subscribe");

        resolved(&engine, 1).await;
        assert_eq!(engine.failed()[0].retries, 0);
        subscriber.close().await;
    }

    #[tokio::test]
    async fn test_ack_timeout_fails_with_one_retry_fewer() {
        let engine = Arc::new(InMemoryZeebe::new());
        engine.enqueue_job(job_with_variables(TOPIC, 3, r#"{"payload":1}"#));
        let subscriber = Subscriber::new(config(&engine).with_timeout(Duration::from_millis(50)))
            .expect("valid");
        let mut sub = subscriber.subscribe(TOPIC).await.expect("subscribe");

        let msg = next_message(&mut sub).await;
        resolved(&engine, 1).await;

        let failed = engine.failed();
        assert_eq!(failed[0].retries, 2);
        assert!(failed[0].error_message.contains("timed out"));
        // Too late: the job is already failed.
        msg.ack();

        subscriber.close().await;
        assert!(engine.completed().is_empty());
    }

    #[tokio::test]
    async fn test_close_releases_waiting_jobs_and_drains() {
        let engine = Arc::new(InMemoryZeebe::new());
        engine.enqueue_job(job_with_variables(TOPIC, 3, r#"{"payload":1}"#));
        let subscriber = Subscriber::new(config(&engine)).expect("valid");
        let mut sub = subscriber.subscribe(TOPIC).await.expect("subscribe");

        let msg = next_message(&mut sub).await;
        subscriber.close().await;

        // close() returned, so the waiting handler has already resolved its job.
        let failed = engine.failed();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].retries, 3);
        assert_eq!(msg.context().err(), Some(ContextError::Cancelled));

        let ended = timeout(Duration::from_secs(2), sub.recv()).await.expect("timeout");
        assert!(ended.is_none());
        assert_eq!(subscriber.metrics().snapshot().jobs_released, 1);
    }

    #[tokio::test]
    async fn test_dropped_subscription_releases_unreceived_job() {
        let engine = Arc::new(InMemoryZeebe::new());
        let key = engine.enqueue_job(job_with_variables(TOPIC, 3, r#"{"payload":1}"#));
        let subscriber = Subscriber::new(config(&engine)).expect("valid");
        let sub = subscriber.subscribe(TOPIC).await.expect("subscribe");

        all_offered(&engine).await;
        drop(sub);

        resolved(&engine, 1).await;
        let failed = engine.failed();
        assert_eq!(failed[0].job_key, key);
        assert_eq!(failed[0].retries, 3);

        subscriber.close().await;
        let snapshot = subscriber.metrics().snapshot();
        assert_eq!(snapshot.messages_delivered, 0);
        assert_eq!(snapshot.jobs_released, 1);
    }

    #[tokio::test]
    async fn test_close_withdraws_unreceived_messages() {
        let engine = Arc::new(InMemoryZeebe::new());
        engine.enqueue_job(job_with_variables(TOPIC, 3, r#"{"payload":1}"#));
        engine.enqueue_job(job_with_variables(TOPIC, 3, r#"{"payload":2}"#));
        let subscriber = Subscriber::new(config(&engine)).expect("valid");
        let mut sub = subscriber.subscribe(TOPIC).await.expect("subscribe");

        // One offer sits in the channel, the other waits for room.
        all_offered(&engine).await;
        subscriber.close().await;

        let failed = engine.failed();
        assert_eq!(failed.len(), 2);
        for command in &failed {
            assert_eq!(command.retries, 3);
            assert!(command.error_message.contains("waiting for a consumer"));
        }

        // Nothing left to ack: withdrawn offers are never handed out.
        let ended = timeout(Duration::from_secs(2), sub.recv()).await.expect("timeout");
        assert!(ended.is_none());
        assert_eq!(subscriber.metrics().snapshot().messages_delivered, 0);
    }

    #[tokio::test]
    async fn test_consumer_timeout_fails_waiting_jobs() {
        let engine = Arc::new(InMemoryZeebe::new());
        engine.enqueue_job(job_with_variables(TOPIC, 3, r#"{"payload":1}"#));
        engine.enqueue_job(job_with_variables(TOPIC, 3, r#"{"payload":2}"#));
        let subscriber = Subscriber::new(config(&engine).with_timeout(Duration::from_millis(100)))
            .expect("valid");
        let mut sub = subscriber.subscribe(TOPIC).await.expect("subscribe");

        resolved(&engine, 2).await;
        let failed = engine.failed();
        assert_eq!(failed.len(), 2);
        for command in &failed {
            assert_eq!(command.retries, 2);
            assert!(command.error_message.contains("waiting for a consumer"));
        }
        assert!(sub.try_recv().is_none());

        subscriber.close().await;
        assert_eq!(subscriber.metrics().snapshot().messages_delivered, 0);
    }

    #[tokio::test]
    async fn test_subscribe_after_close_fails() {
        let engine = Arc::new(InMemoryZeebe::new());
        let subscriber = Subscriber::new(config(&engine)).expect("valid");

        subscriber.close().await;
        subscriber.close().await;

        assert!(matches!(
            subscriber.subscribe(TOPIC).await,
            Err(SubscribeError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_message_name_restored_from_headers() {
        let engine = Arc::new(InMemoryZeebe::new());
        let mut job = job_with_variables(TOPIC, 1, r#"{"payload":null}"#);
        job.custom_headers = r#"{"message_name":"order-placed"}"#.to_string();
        engine.enqueue_job(job);

        let subscriber = Subscriber::new(config(&engine)).expect("valid");
        let mut sub = subscriber.subscribe(TOPIC).await.expect("subscribe");

        let msg = next_message(&mut sub).await;
        assert_eq!(msg.metadata.get(MESSAGE_NAME_METADATA_KEY), "order-placed");
        assert_eq!(msg.payload, b"null".to_vec());
        msg.ack();

        resolved(&engine, 1).await;
        subscriber.close().await;
    }

    #[tokio::test]
    async fn test_rejected_resolution_is_logged_not_propagated() {
        let engine = Arc::new(InMemoryZeebe::new());
        engine.reject_job_commands(true);
        engine.enqueue_job(job_with_variables(TOPIC, 1, r#"{"payload":1}"#));

        let subscriber = Subscriber::new(config(&engine)).expect("valid");
        let mut sub = subscriber.subscribe(TOPIC).await.expect("subscribe");
        next_message(&mut sub).await.ack();

        subscriber.close().await;
        assert_eq!(subscriber.metrics().snapshot().job_command_errors, 1);
        assert!(engine.completed().is_empty());
    }
}
