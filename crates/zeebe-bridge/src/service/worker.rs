//! Job Worker Pool
//!
//! Leases jobs of one type and runs a [`JobHandler`] for each of them.
//!
//! ```text
//! ┌────────┐  activate_jobs  ┌──────────┐  mpsc(max_jobs_active)  ┌────────────┐
//! │ engine │ ◀────────────── │  poller  │ ──────────────────────▶ │ dispatcher │
//! └────────┘                 └──────────┘                         └─────┬──────┘
//!      ▲                          ▲  notify on finish                   │ semaphore(concurrency)
//!      │ complete / fail          └─────────────────────────────┐       ▼
//!      └──────────────────────────────────────────────────── handler tasks
//! ```
//!
//! The poller re-activates once the number of leased-but-unfinished jobs
//! drops to `max_jobs_active × poll_threshold`, asking for just enough jobs to
//! fill the cap again. Jobs still buffered when the worker closes are not
//! handed back; the engine re-offers them after their lease times out.

use crate::config::{duration_millis, BridgeSettings};
use crate::domain::Job;
use crate::error::{TransportError, ValidationError};
use crate::metrics::BridgeMetrics;
use crate::ports::{
    ActivateJobsCommand, CompleteJobCommand, FailJobCommand, JobClient, JobHandler, ZeebeClient,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Notify, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Configures and opens a [`JobWorker`].
pub struct JobWorkerBuilder {
    client: Arc<dyn ZeebeClient>,
    handler: Option<Arc<dyn JobHandler>>,
    metrics: Arc<BridgeMetrics>,
    job_type: String,
    settings: BridgeSettings,
}

impl JobWorkerBuilder {
    pub fn new(client: Arc<dyn ZeebeClient>) -> Self {
        Self {
            client,
            handler: None,
            metrics: Arc::new(BridgeMetrics::new()),
            job_type: String::new(),
            settings: BridgeSettings::default(),
        }
    }

    /// Task type to lease.
    #[must_use]
    pub fn job_type(mut self, job_type: impl Into<String>) -> Self {
        self.job_type = job_type.into();
        self
    }

    #[must_use]
    pub fn handler(mut self, handler: Arc<dyn JobHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Take name, timeout and tuning from `settings`.
    #[must_use]
    pub fn settings(mut self, settings: &BridgeSettings) -> Self {
        self.settings = settings.clone();
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.settings.worker_name = name.into();
        self
    }

    /// Lease duration requested on activation.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.job_timeout_ms = duration_millis(timeout);
        self
    }

    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.settings.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn max_jobs_active(mut self, max: usize) -> Self {
        self.settings.max_jobs_active = max;
        self
    }

    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.settings.poll_interval_ms = duration_millis(interval);
        self
    }

    #[must_use]
    pub fn poll_threshold(mut self, threshold: f64) -> Self {
        self.settings.poll_threshold = threshold;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.settings.request_timeout_ms = duration_millis(timeout);
        self
    }

    #[must_use]
    pub fn metrics(mut self, metrics: Arc<BridgeMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Validate the configuration and start polling.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(self) -> Result<JobWorker, ValidationError> {
        if self.job_type.is_empty() {
            return Err(ValidationError::MissingJobType);
        }
        let handler = self.handler.ok_or(ValidationError::MissingHandler)?;
        let mut settings = self.settings;
        settings.set_defaults();
        settings.validate()?;

        let concurrency = settings.concurrency;
        let max_jobs_active = settings.max_jobs_active;
        let threshold =
            ((max_jobs_active as f64) * settings.poll_threshold).round() as usize;

        let (shutdown, _) = watch::channel(false);
        let (jobs_tx, jobs_rx) = mpsc::channel(max_jobs_active);
        let permits = Arc::new(Semaphore::new(concurrency));
        let active = Arc::new(ActiveJobs::default());

        let poller = Poller {
            client: self.client.clone(),
            template: ActivateJobsCommand {
                job_type: self.job_type.clone(),
                worker_name: settings.worker_name.clone(),
                timeout: settings.job_timeout(),
                max_jobs_to_activate: max_jobs_active,
                request_timeout: settings.request_timeout(),
            },
            max_jobs_active,
            threshold,
            poll_interval: settings.poll_interval(),
            active: active.clone(),
            jobs: jobs_tx,
            metrics: self.metrics,
        };

        let dispatcher = Dispatcher {
            commands: Arc::new(JobCommands(self.client)),
            handler,
            permits: permits.clone(),
            active,
            jobs: jobs_rx,
        };

        info!(
            job_type = %self.job_type,
            worker = %settings.worker_name,
            concurrency,
            max_jobs_active,
            "Opening job worker"
        );

        Ok(JobWorker {
            job_type: self.job_type,
            poller: tokio::spawn(poller.run(shutdown.subscribe())),
            dispatcher: tokio::spawn(dispatcher.run(shutdown.subscribe())),
            shutdown,
            permits,
            concurrency,
        })
    }
}

/// A running job worker.
///
/// Dropping the worker without closing it stops polling and dispatching but
/// does not wait for in-flight handlers.
pub struct JobWorker {
    job_type: String,
    shutdown: watch::Sender<bool>,
    poller: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
    permits: Arc<Semaphore>,
    concurrency: usize,
}

impl JobWorker {
    pub fn job_type(&self) -> &str {
        &self.job_type
    }

    /// Stop polling and dispatching. Idempotent.
    pub fn close(&self) {
        self.shutdown.send_replace(true);
    }

    /// Wait for the poller, the dispatcher and every in-flight handler.
    pub async fn await_close(self) {
        self.close();

        if let Err(e) = self.poller.await {
            error!(job_type = %self.job_type, error = %e, "Job poller task failed");
        }
        if let Err(e) = self.dispatcher.await {
            error!(job_type = %self.job_type, error = %e, "Job dispatcher task failed");
        }

        // Each handler holds one permit until it returns.
        match self.permits.acquire_many(self.concurrency as u32).await {
            Ok(_all) => debug!(job_type = %self.job_type, "Job worker drained"),
            Err(_) => warn!(job_type = %self.job_type, "Job worker semaphore closed"),
        }
    }
}

/// Leased-but-unfinished jobs, plus a wake-up for the poller.
#[derive(Default)]
struct ActiveJobs {
    count: AtomicUsize,
    finished: Notify,
}

/// Held by a handler task for the lifetime of one job.
struct JobSlot {
    active: Arc<ActiveJobs>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for JobSlot {
    fn drop(&mut self) {
        self.active.count.fetch_sub(1, Ordering::SeqCst);
        self.active.finished.notify_one();
    }
}

struct Poller {
    client: Arc<dyn ZeebeClient>,
    template: ActivateJobsCommand,
    max_jobs_active: usize,
    threshold: usize,
    poll_interval: Duration,
    active: Arc<ActiveJobs>,
    jobs: mpsc::Sender<Job>,
    metrics: Arc<BridgeMetrics>,
}

impl Poller {
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            let active = self.active.count.load(Ordering::SeqCst);
            if active <= self.threshold {
                let command = ActivateJobsCommand {
                    max_jobs_to_activate: self.max_jobs_active.saturating_sub(active),
                    ..self.template.clone()
                };

                let activated = tokio::select! {
                    result = self.client.activate_jobs(command) => result,
                    _ = shutdown.changed() => break,
                };

                match activated {
                    Ok(jobs) => {
                        if !jobs.is_empty() {
                            debug!(
                                job_type = %self.template.job_type,
                                count = jobs.len(),
                                "Activated jobs"
                            );
                            self.metrics.record_jobs_activated(jobs.len());
                        }
                        for job in jobs {
                            self.active.count.fetch_add(1, Ordering::SeqCst);
                            if self.jobs.send(job).await.is_err() {
                                self.active.count.fetch_sub(1, Ordering::SeqCst);
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        warn!(
                            job_type = %self.template.job_type,
                            error = %e,
                            "Failed to activate jobs"
                        );
                    }
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = self.active.finished.notified() => {}
                _ = shutdown.changed() => break,
            }
        }

        debug!(job_type = %self.template.job_type, "Job poller stopped");
    }
}

struct Dispatcher {
    commands: Arc<JobCommands>,
    handler: Arc<dyn JobHandler>,
    permits: Arc<Semaphore>,
    active: Arc<ActiveJobs>,
    jobs: mpsc::Receiver<Job>,
}

impl Dispatcher {
    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            let permit = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                permit = self.permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let job = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                job = self.jobs.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            let slot = JobSlot {
                active: self.active.clone(),
                _permit: permit,
            };
            let commands = self.commands.clone();
            let handler = self.handler.clone();

            tokio::spawn(async move {
                let _slot = slot;
                handler.handle(commands.as_ref(), job).await;
            });
        }
    }
}

/// The complete/fail subset of the engine client, as handed to handlers.
struct JobCommands(Arc<dyn ZeebeClient>);

#[async_trait]
impl JobClient for JobCommands {
    async fn complete_job(&self, command: CompleteJobCommand) -> Result<(), TransportError> {
        self.0.complete_job(command).await
    }

    async fn fail_job(&self, command: FailJobCommand) -> Result<(), TransportError> {
        self.0.fail_job(command).await
    }
}
