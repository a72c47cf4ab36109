//! Activated job as reported by the engine.

use crate::error::ConfigBuildError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A leased unit of work for one task type.
///
/// Read-only to the bridge. Terminated by exactly one complete or fail command.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique job key
    pub key: i64,
    /// Task type, used as the bus topic
    #[serde(rename = "type")]
    pub job_type: String,
    /// Key of the owning workflow instance
    pub workflow_instance_key: i64,
    /// BPMN process id of the workflow
    pub bpmn_process_id: String,
    /// Version of the workflow definition
    pub workflow_definition_version: i32,
    /// Key of the workflow definition
    pub workflow_key: i64,
    /// Id of the task element
    pub element_id: String,
    /// Key of the task element instance
    pub element_instance_key: i64,
    /// Custom headers as a JSON object of strings
    pub custom_headers: String,
    /// Name of the worker that activated the job
    pub worker: String,
    /// Remaining retries
    pub retries: i32,
    /// Lease deadline, epoch milliseconds
    pub deadline: i64,
    /// Variables as a JSON object
    pub variables: String,
}

impl Job {
    /// Parse the custom headers blob.
    pub fn custom_headers_as_map(&self) -> Result<Map<String, Value>, ConfigBuildError> {
        serde_json::from_str(&self.custom_headers).map_err(ConfigBuildError::Headers)
    }

    /// Parse the variables blob.
    pub fn variables_as_map(&self) -> Result<Map<String, Value>, ConfigBuildError> {
        serde_json::from_str(&self.variables).map_err(ConfigBuildError::Variables)
    }
}
