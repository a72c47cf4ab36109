//! # Bus Message
//!
//! The unit of transfer on the bus: an identifier, string metadata, an opaque
//! payload, an execution [`Context`] and a one-shot acknowledgment cell.
//!
//! Acknowledgment is resolved exactly once. The first `ack()` or `nack()`
//! wins; later calls report whether the message ended up in the requested
//! state but never flip it.

use crate::context::Context;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::watch;
use uuid::Uuid;

/// String-keyed metadata attached to a message.
///
/// Values are always strings. A missing key reads as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata(HashMap<String, String>);

impl Metadata {
    /// Create empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value, or `""` when the key is absent.
    #[must_use]
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map_or("", String::as_str)
    }

    /// Set a value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Remove a key, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Whether the key is present (even with an empty value).
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Metadata
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Acknowledgment state of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckState {
    /// Neither acked nor nacked yet.
    Pending,
    /// Positively acknowledged by the consumer.
    Acked,
    /// Negatively acknowledged by the consumer.
    Nacked,
}

/// Final outcome observed by an [`AckWatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The consumer acked the message.
    Acked,
    /// The consumer nacked the message.
    Nacked,
    /// The message was dropped while still pending.
    Dropped,
}

/// A message travelling over the bus.
pub struct Message {
    /// Unique message identifier.
    pub uuid: String,

    /// Message metadata.
    pub metadata: Metadata,

    /// Opaque payload, conventionally JSON.
    pub payload: Vec<u8>,

    /// Execution context bounding the message's processing.
    context: Context,

    /// Acknowledgment cell.
    ack: watch::Sender<AckState>,
}

impl Message {
    /// Create a new message with the given identifier and payload.
    pub fn new(uuid: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        let (ack, _) = watch::channel(AckState::Pending);
        Self {
            uuid: uuid.into(),
            metadata: Metadata::new(),
            payload: payload.into(),
            context: Context::background(),
            ack,
        }
    }

    /// Create a new message with a freshly generated v4 UUID.
    pub fn with_new_uuid(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(new_uuid(), payload)
    }

    /// Builder-style metadata setter.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.set(key, value);
        self
    }

    /// The message's execution context.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Replace the message's execution context.
    pub fn set_context(&mut self, context: Context) {
        self.context = context;
    }

    /// Acknowledge the message.
    ///
    /// Returns `true` if the message is acked after the call, `false` if it
    /// had already been nacked.
    pub fn ack(&self) -> bool {
        self.resolve(AckState::Acked)
    }

    /// Negatively acknowledge the message.
    ///
    /// Returns `true` if the message is nacked after the call, `false` if it
    /// had already been acked.
    pub fn nack(&self) -> bool {
        self.resolve(AckState::Nacked)
    }

    /// Current acknowledgment state.
    #[must_use]
    pub fn ack_state(&self) -> AckState {
        *self.ack.borrow()
    }

    /// Obtain a watcher that resolves once the message is acked or nacked.
    #[must_use]
    pub fn ack_watcher(&self) -> AckWatcher {
        AckWatcher {
            rx: self.ack.subscribe(),
        }
    }

    /// Copy the message with a fresh acknowledgment cell and a background context.
    #[must_use]
    pub fn copy(&self) -> Self {
        let mut copy = Self::new(self.uuid.clone(), self.payload.clone());
        copy.metadata = self.metadata.clone();
        copy
    }

    fn resolve(&self, target: AckState) -> bool {
        self.ack.send_if_modified(|state| {
            if *state == AckState::Pending {
                *state = target;
                true
            } else {
                false
            }
        });
        *self.ack.borrow() == target
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("uuid", &self.uuid)
            .field("metadata", &self.metadata)
            .field("payload_len", &self.payload.len())
            .field("ack", &self.ack_state())
            .finish()
    }
}

/// Observes the acknowledgment of a message from another task.
#[derive(Debug)]
pub struct AckWatcher {
    rx: watch::Receiver<AckState>,
}

impl AckWatcher {
    /// Wait until the message is acked, nacked, or dropped while pending.
    pub async fn wait(&mut self) -> AckOutcome {
        let resolved = self
            .rx
            .wait_for(|state| *state != AckState::Pending)
            .await
            .map(|state| *state);

        match resolved {
            Ok(AckState::Acked) => AckOutcome::Acked,
            Ok(_) => AckOutcome::Nacked,
            Err(_) => match *self.rx.borrow() {
                AckState::Acked => AckOutcome::Acked,
                AckState::Nacked => AckOutcome::Nacked,
                AckState::Pending => AckOutcome::Dropped,
            },
        }
    }
}

/// Generate a new random message identifier.
#[must_use]
pub fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}
