//! # Execution Context
//!
//! A cheap, cloneable handle that bounds how long work on a message may take.
//! A context ends when its deadline passes or when the lifecycle signal it was
//! derived from fires. Derived contexts never outlive their parent.

use std::future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};

/// Why a context ended.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// The lifecycle signal fired, or its owner went away.
    #[error("context cancelled")]
    Cancelled,

    /// The deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Execution context carried by a message.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

impl Context {
    /// A context that never ends.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that ends when `signal` turns `true` or its sender is dropped.
    #[must_use]
    pub fn with_cancel(signal: watch::Receiver<bool>) -> Self {
        Self {
            deadline: None,
            cancel: Some(signal),
        }
    }

    /// Derive a child context that also ends after `timeout`.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < candidate => parent,
            _ => candidate,
        };
        Self {
            deadline: Some(deadline),
            cancel: self.cancel.clone(),
        }
    }

    /// The deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Non-blocking check: why the context has ended, if it has.
    #[must_use]
    pub fn err(&self) -> Option<ContextError> {
        if let Some(rx) = &self.cancel {
            if *rx.borrow() || rx.has_changed().is_err() {
                return Some(ContextError::Cancelled);
            }
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Wait until the context ends.
    ///
    /// Never resolves for a background context.
    pub async fn done(&self) -> ContextError {
        let cancelled = async {
            match self.cancel.clone() {
                Some(mut rx) => {
                    // A dropped sender means the owner is gone, which counts as cancellation.
                    let _ = rx.wait_for(|cancelled| *cancelled).await;
                }
                None => future::pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => future::pending::<()>().await,
            }
        };

        tokio::select! {
            () = cancelled => ContextError::Cancelled,
            () = expired => ContextError::DeadlineExceeded,
        }
    }
}
