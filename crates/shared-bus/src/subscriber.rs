//! # Subscriber
//!
//! Defines the subscription side of the bus.
//!
//! Handoff is a rendezvous: a producer offers a [`Delivery`] and learns when
//! a consumer has actually received the message. An offer withdrawn before
//! that point is skipped by the subscription, so the consumer never sees a
//! message whose producer has already given up on it.

use crate::message::Message;
use async_trait::async_trait;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::Stream;

/// Trait for subscribing to a topic.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Error returned by the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Start consuming `topic`. Messages arrive on the returned subscription.
    async fn subscribe(&self, topic: &str) -> Result<Subscription, Self::Error>;

    /// Stop consuming and wait for in-flight messages to resolve.
    async fn close(&self) -> Result<(), Self::Error>;
}

/// A message offered to a subscription.
///
/// The paired [`HandoffReceiver`] resolves once a consumer takes the message.
/// Closing that receiver withdraws the offer.
#[derive(Debug)]
pub struct Delivery {
    message: Message,
    taken: oneshot::Sender<()>,
}

/// Producer side of a [`Delivery`]: `Ok(())` once the message was taken,
/// an error if the offer was dropped unreceived.
pub type HandoffReceiver = oneshot::Receiver<()>;

impl Delivery {
    /// Offer `message`.
    #[must_use]
    pub fn offer(message: Message) -> (Self, HandoffReceiver) {
        let (taken, handoff) = oneshot::channel();
        (Self { message, taken }, handoff)
    }

    /// Claim the message. `None` when the producer withdrew the offer.
    fn claim(self) -> Option<Message> {
        let Self { message, taken } = self;
        taken.send(()).ok().map(|()| message)
    }
}

/// A receive-only handle for delivered messages.
///
/// Ends (yields `None`) once the producing side has shut down.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    receiver: mpsc::Receiver<Delivery>,
}

impl Subscription {
    /// Wrap the receiving half of a delivery channel.
    #[must_use]
    pub fn new(topic: impl Into<String>, receiver: mpsc::Receiver<Delivery>) -> Self {
        Self {
            topic: topic.into(),
            receiver,
        }
    }

    /// The subscribed topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Receive the next message.
    ///
    /// # Returns
    ///
    /// - `Some(message)` - The next delivered message
    /// - `None` - The producing side shut down
    pub async fn recv(&mut self) -> Option<Message> {
        while let Some(delivery) = self.receiver.recv().await {
            if let Some(message) = delivery.claim() {
                return Some(message);
            }
        }
        None
    }

    /// Receive without waiting. `None` when nothing is ready right now.
    pub fn try_recv(&mut self) -> Option<Message> {
        while let Ok(delivery) = self.receiver.try_recv() {
            if let Some(message) = delivery.claim() {
                return Some(message);
            }
        }
        None
    }
}

impl Stream for Subscription {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(self.receiver.poll_recv(cx)) {
                Some(delivery) => {
                    if let Some(message) = delivery.claim() {
                        return Poll::Ready(Some(message));
                    }
                }
                None => return Poll::Ready(None),
            }
        }
    }
}
