//! Error types for the bridge

use shared_bus::ContextError;
use thiserror::Error;

/// The job's custom headers or variables could not be parsed.
///
/// Fatal for the job: the subscriber fails it with zero retries.
#[derive(Debug, Error)]
pub enum ConfigBuildError {
    #[error("malformed custom headers: {0}")]
    Headers(#[source] serde_json::Error),

    #[error("malformed variables: {0}")]
    Variables(#[source] serde_json::Error),
}

/// Conversion between bus messages and engine shapes failed.
#[derive(Debug, Error)]
pub enum MarshalError {
    #[error(transparent)]
    Config(#[from] ConfigBuildError),

    #[error("cannot encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("variables document must be a JSON object, got {found}")]
    VariablesNotObject { found: &'static str },

    #[error("metadata value for key '{key}' must be a string, got {found}")]
    NonStringMetadata { key: String, found: &'static str },
}

/// A required collaborator or setting is missing or out of range.
///
/// Only ever returned at construction time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing zeebe client")]
    MissingClient,

    #[error("missing marshaller")]
    MissingMarshaller,

    #[error("missing unmarshaller")]
    MissingUnmarshaller,

    #[error("missing job handler")]
    MissingHandler,

    #[error("missing job type")]
    MissingJobType,

    #[error("invalid job worker setting: {0}")]
    InvalidWorkerSetting(String),
}

/// Sending a command to the engine failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    #[error("command rejected: {0}")]
    Rejected(String),

    #[error("job {0} not found")]
    JobNotFound(i64),

    #[error("request aborted: {0}")]
    Aborted(#[from] ContextError),
}

/// Errors from [`crate::Publisher::publish`].
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publisher closed")]
    Closed,

    #[error("cannot marshal message {uuid}")]
    Marshal {
        uuid: String,
        #[source]
        source: MarshalError,
    },

    #[error("cannot send message {uuid}")]
    Transport {
        uuid: String,
        #[source]
        source: TransportError,
    },
}

/// Errors from [`crate::Subscriber`] operations.
#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error("subscriber closed")]
    Closed,

    #[error("invalid subscriber config: {0}")]
    Validation(#[from] ValidationError),
}
