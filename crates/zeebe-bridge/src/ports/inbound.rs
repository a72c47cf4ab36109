//! Inbound Ports (Driving Ports)
//!
//! What the job worker pool calls for every leased job.

use super::outbound::JobClient;
use crate::domain::Job;
use async_trait::async_trait;

/// Handles one leased job.
///
/// A handler owns the job's lifecycle: it must end by completing or failing
/// the job through `client`, or leave it to expire at the engine.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn handle(&self, client: &dyn JobClient, job: Job);
}
