//! Bridge settings
//!
//! Worker identity, per-job timeout and job worker tuning. Settings are plain
//! data; collaborators (engine client, marshallers) are wired separately on
//! [`crate::PublisherConfig`] and [`crate::SubscriberConfig`].
//!
//! # Environment Variables
//!
//! - `ZEEBE_BRIDGE_WORKER`: Worker name reported to the engine (default: default)
//! - `ZEEBE_BRIDGE_JOB_TIMEOUT_MS`: Per-job lease and ack timeout (default: 300000)
//! - `ZEEBE_BRIDGE_CONCURRENCY`: Concurrent job handlers (default: 4)
//! - `ZEEBE_BRIDGE_MAX_JOBS_ACTIVE`: Leased-but-unfinished job cap (default: 32)
//! - `ZEEBE_BRIDGE_POLL_INTERVAL_MS`: Activation poll interval (default: 100)
//! - `ZEEBE_BRIDGE_POLL_THRESHOLD`: Fraction of the cap at which to re-poll (default: 0.3)
//! - `ZEEBE_BRIDGE_REQUEST_TIMEOUT_MS`: Activation request timeout (default: 10000)

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Worker name used when none is configured.
pub const DEFAULT_WORKER_NAME: &str = "default";

/// Per-job timeout used when none is configured.
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(5 * 60);

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_MAX_JOBS_ACTIVE: usize = 32;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_POLL_THRESHOLD: f64 = 0.3;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on handler concurrency.
pub const MAX_CONCURRENCY: usize = 4096;

/// Subscriber-side settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Worker name reported to the engine
    pub worker_name: String,
    /// Job lease duration, also bounds the wait for an ack
    pub job_timeout_ms: u64,
    /// Concurrently running job handlers
    pub concurrency: usize,
    /// Cap on leased-but-unfinished jobs
    pub max_jobs_active: usize,
    /// Activation poll interval
    pub poll_interval_ms: u64,
    /// Re-poll once active jobs drop to this fraction of `max_jobs_active`
    pub poll_threshold: f64,
    /// How long the gateway may hold an activation request open
    pub request_timeout_ms: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            job_timeout_ms: duration_millis(DEFAULT_JOB_TIMEOUT),
            concurrency: DEFAULT_CONCURRENCY,
            max_jobs_active: DEFAULT_MAX_JOBS_ACTIVE,
            poll_interval_ms: duration_millis(DEFAULT_POLL_INTERVAL),
            poll_threshold: DEFAULT_POLL_THRESHOLD,
            request_timeout_ms: duration_millis(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

impl BridgeSettings {
    /// Read settings from `ZEEBE_BRIDGE_*` environment variables.
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            worker_name: lookup("ZEEBE_BRIDGE_WORKER")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.worker_name),
            job_timeout_ms: parse_var(&lookup, "ZEEBE_BRIDGE_JOB_TIMEOUT_MS")
                .unwrap_or(defaults.job_timeout_ms),
            concurrency: parse_var(&lookup, "ZEEBE_BRIDGE_CONCURRENCY")
                .unwrap_or(defaults.concurrency),
            max_jobs_active: parse_var(&lookup, "ZEEBE_BRIDGE_MAX_JOBS_ACTIVE")
                .unwrap_or(defaults.max_jobs_active),
            poll_interval_ms: parse_var(&lookup, "ZEEBE_BRIDGE_POLL_INTERVAL_MS")
                .unwrap_or(defaults.poll_interval_ms),
            poll_threshold: parse_var(&lookup, "ZEEBE_BRIDGE_POLL_THRESHOLD")
                .unwrap_or(defaults.poll_threshold),
            request_timeout_ms: parse_var(&lookup, "ZEEBE_BRIDGE_REQUEST_TIMEOUT_MS")
                .unwrap_or(defaults.request_timeout_ms),
        }
    }

    /// Fill in defaults for unset identity fields.
    pub fn set_defaults(&mut self) {
        if self.worker_name.is_empty() {
            self.worker_name = DEFAULT_WORKER_NAME.to_string();
        }
        if self.job_timeout_ms == 0 {
            self.job_timeout_ms = duration_millis(DEFAULT_JOB_TIMEOUT);
        }
    }

    /// Check the worker tuning is usable.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(ValidationError::InvalidWorkerSetting(format!(
                "concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
                self.concurrency
            )));
        }
        if self.max_jobs_active == 0 {
            return Err(ValidationError::InvalidWorkerSetting(
                "max_jobs_active cannot be 0".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::InvalidWorkerSetting(
                "poll_interval_ms cannot be 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.poll_threshold) {
            return Err(ValidationError::InvalidWorkerSetting(format!(
                "poll_threshold must be between 0 and 1, got {}",
                self.poll_threshold
            )));
        }
        Ok(())
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_millis(self.job_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Builder-style method to set the worker name
    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Builder-style method to set the per-job timeout
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout_ms = duration_millis(timeout);
        self
    }

    /// Builder-style method to set handler concurrency
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Builder-style method to set the active job cap
    pub fn with_max_jobs_active(mut self, max: usize) -> Self {
        self.max_jobs_active = max;
        self
    }

    /// Builder-style method to set the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = duration_millis(interval);
        self
    }

    /// Builder-style method to set the poll threshold
    pub fn with_poll_threshold(mut self, threshold: f64) -> Self {
        self.poll_threshold = threshold;
        self
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}
