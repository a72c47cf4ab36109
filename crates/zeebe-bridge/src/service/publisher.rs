//! Outbound bridge
//!
//! Turns bus messages into engine "publish message" commands. Messages are
//! sent in order and publishing stops at the first failure; the caller decides
//! what to re-publish.

use crate::domain::ZeebeMessage;
use crate::error::{MarshalError, PublishError, TransportError, ValidationError};
use crate::marshal::Marshaller;
use crate::metrics::BridgeMetrics;
use crate::ports::{PublishMessageCommand, ZeebeClient};
use async_trait::async_trait;
use shared_bus::{Message, Publisher as BusPublisher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Collaborators for a [`Publisher`].
#[derive(Clone, Default)]
pub struct PublisherConfig {
    pub client: Option<Arc<dyn ZeebeClient>>,
    pub marshaller: Option<Arc<dyn Marshaller>>,
}

impl PublisherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style method to set the engine client
    pub fn with_client(mut self, client: Arc<dyn ZeebeClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Builder-style method to set the marshaller
    pub fn with_marshaller(mut self, marshaller: Arc<dyn Marshaller>) -> Self {
        self.marshaller = Some(marshaller);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.client.is_none() {
            return Err(ValidationError::MissingClient);
        }
        if self.marshaller.is_none() {
            return Err(ValidationError::MissingMarshaller);
        }
        Ok(())
    }
}

/// Publishes bus messages to the engine.
pub struct Publisher {
    client: Arc<dyn ZeebeClient>,
    marshaller: Arc<dyn Marshaller>,
    closed: AtomicBool,
    metrics: Arc<BridgeMetrics>,
}

impl Publisher {
    pub fn new(config: PublisherConfig) -> Result<Self, ValidationError> {
        Self::with_metrics(config, Arc::new(BridgeMetrics::new()))
    }

    /// Create a publisher that records into shared counters.
    pub fn with_metrics(
        config: PublisherConfig,
        metrics: Arc<BridgeMetrics>,
    ) -> Result<Self, ValidationError> {
        let client = config.client.ok_or(ValidationError::MissingClient)?;
        let marshaller = config.marshaller.ok_or(ValidationError::MissingMarshaller)?;
        Ok(Self {
            client,
            marshaller,
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

    /// Publish `messages` in order.
    ///
    /// Each send is bounded by the message's context. Nothing already sent is
    /// rolled back when a later message fails.
    pub async fn publish(&self, topic: &str, messages: &[Message]) -> Result<(), PublishError> {
        if self.is_closed() {
            return Err(PublishError::Closed);
        }

        for msg in messages {
            if let Err(e) = self.publish_one(topic, msg).await {
                self.metrics.record_publish_failure();
                warn!(topic = topic, message_uuid = %msg.uuid, error = %e, "Publish failed");
                return Err(e);
            }
        }
        Ok(())
    }

    async fn publish_one(&self, topic: &str, msg: &Message) -> Result<(), PublishError> {
        let marshal_error = |source: MarshalError| PublishError::Marshal {
            uuid: msg.uuid.clone(),
            source,
        };

        let marshaled = self.marshaller.marshal(topic, msg).map_err(marshal_error)?;
        let command = build_command(marshaled).map_err(marshal_error)?;

        let transport_error = |source: TransportError| PublishError::Transport {
            uuid: msg.uuid.clone(),
            source,
        };
        if let Some(reason) = msg.context().err() {
            return Err(transport_error(TransportError::Aborted(reason)));
        }

        let sent = tokio::select! {
            biased;
            reason = msg.context().done() => Err(TransportError::Aborted(reason)),
            sent = self.client.publish_message(command) => sent,
        };
        let response = sent.map_err(transport_error)?;

        self.metrics.record_message_published();
        debug!(
            topic = topic,
            message_uuid = %msg.uuid,
            message_key = response.key,
            "Published message"
        );
        Ok(())
    }

    /// Stop accepting messages. The engine client stays open.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("Publisher closed");
        }
    }
}

fn build_command(marshaled: ZeebeMessage) -> Result<PublishMessageCommand, MarshalError> {
    let ttl = Duration::from_millis(u64::try_from(marshaled.time_to_live).unwrap_or(0));
    let mut command = PublishMessageCommand::new(marshaled.name)
        .correlation_key(marshaled.correlation_key)
        .time_to_live(ttl)
        .variables_from_str(&marshaled.variables)?;
    if let Some(id) = marshaled.message_id {
        command = command.message_id(id);
    }
    Ok(command)
}

#[async_trait]
impl BusPublisher for Publisher {
    type Error = PublishError;

    async fn publish(&self, topic: &str, messages: &[Message]) -> Result<(), PublishError> {
        Publisher::publish(self, topic, messages).await
    }

    async fn close(&self) -> Result<(), PublishError> {
        Publisher::close(self);
        Ok(())
    }
}
