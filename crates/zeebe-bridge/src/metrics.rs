//! Counters for bridge operations
//!
//! Lock-free counters shared by the publisher, the subscriber and the job
//! worker pool. Take a [`MetricsSnapshot`] to read them consistently enough
//! for dashboards and tests.
//!
//! ## Usage
//!
//! ```ignore
//! use zeebe_bridge::metrics::BridgeMetrics;
//!
//! let metrics = Arc::new(BridgeMetrics::new());
//! let subscriber = Subscriber::with_metrics(config, metrics.clone())?;
//!
//! let snapshot = metrics.snapshot();
//! println!("completed: {}", snapshot.jobs_completed);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for the bridge.
#[derive(Debug, Default)]
pub struct BridgeMetrics {
    /// Jobs leased from the engine
    pub jobs_activated: AtomicU64,
    /// Jobs completed after an ack
    pub jobs_completed: AtomicU64,
    /// Jobs failed with a retry decrement (nack, timeout, dropped message)
    pub jobs_failed: AtomicU64,
    /// Jobs failed with zero retries because no message could be produced
    pub jobs_dead_lettered: AtomicU64,
    /// Jobs handed back unchanged during shutdown
    pub jobs_released: AtomicU64,
    /// Complete/fail commands the engine did not accept
    pub job_command_errors: AtomicU64,
    /// Messages handed to a consumer
    pub messages_delivered: AtomicU64,
    /// Messages accepted by the engine
    pub messages_published: AtomicU64,
    /// Messages that failed to marshal or send
    pub publish_failures: AtomicU64,
}

impl BridgeMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_jobs_activated(&self, count: usize) {
        self.jobs_activated.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_job_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_job_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_job_dead_lettered(&self) {
        self.jobs_dead_lettered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_job_released(&self) {
        self.jobs_released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_job_command_error(&self) {
        self.job_command_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message_delivered(&self) {
        self.messages_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message_published(&self) {
        self.messages_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_publish_failure(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            jobs_activated: self.jobs_activated.load(Ordering::Relaxed),
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            jobs_dead_lettered: self.jobs_dead_lettered.load(Ordering::Relaxed),
            jobs_released: self.jobs_released.load(Ordering::Relaxed),
            job_command_errors: self.job_command_errors.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            messages_published: self.messages_published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`BridgeMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub jobs_activated: u64,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
    pub jobs_dead_lettered: u64,
    pub jobs_released: u64,
    pub job_command_errors: u64,
    pub messages_delivered: u64,
    pub messages_published: u64,
    pub publish_failures: u64,
}

impl MetricsSnapshot {
    /// Jobs that reached a terminal command (complete or fail of any kind).
    pub fn jobs_resolved(&self) -> u64 {
        self.jobs_completed + self.jobs_failed + self.jobs_dead_lettered + self.jobs_released
    }
}
