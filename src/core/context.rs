use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt,
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BatchError;

use super::build_name;

/// Status of a job or step execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    /**
     * The batch job has successfully completed its execution.
     */
    COMPLETED,
    /**
     * Status of a batch job prior to its execution.
     */
    STARTING,
    /**
     * Status of a batch job that is running.
     */
    STARTED,
    /**
     * Status of batch job waiting for a step to complete before stopping the batch job.
     */
    STOPPING,
    /**
     * Status of a batch job that has been stopped by request.
     */
    STOPPED,
    /**
     * Status of a batch job that has failed during its execution.
     */
    FAILED,
    /**
     * Status of a batch job that did not stop properly and can not be restarted.
     */
    ABANDONED,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Key/value configuration handed to a batch artifact.
///
/// Keys are case-sensitive. Missing keys are reported through
/// [`BatchProperties::require`] as [`BatchError::MissingProperty`].
///
/// # Examples
///
/// ```
/// use batch_fixtures::core::context::BatchProperties;
///
/// let properties = BatchProperties::new()
///     .with("resource", "/tmp/numbers.csv")
///     .with("testName", "PASS");
///
/// assert_eq!(properties.get("testName"), Some("PASS"));
/// assert!(properties.require("missing").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchProperties {
    values: HashMap<String, String>,
}

impl BatchProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property, replacing any previous value for `key`.
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    pub fn insert(&mut self, key: &str, value: &str) -> Option<String> {
        self.values.insert(key.to_string(), value.to_string())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns the value for `key` or fails with [`BatchError::MissingProperty`].
    pub fn require(&self, key: &str) -> Result<&str, BatchError> {
        self.get(key)
            .ok_or_else(|| BatchError::MissingProperty(key.to_string()))
    }

    /// Loads properties from a flat JSON object, e.g. `{"resource": "data.csv"}`.
    pub fn from_json(json: &str) -> Result<Self, BatchError> {
        serde_json::from_str(json).map_err(|error| BatchError::Properties(error.to_string()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BatchProperties {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Read/write view of the running job, owned by the runtime.
pub trait JobContext {
    fn job_name(&self) -> String;

    fn execution_id(&self) -> Uuid;

    fn batch_status(&self) -> BatchStatus;

    /// Exit status set by an artifact, if any.
    fn exit_status(&self) -> Option<String>;

    fn set_exit_status(&self, status: &str);
}

/// Read/write view of the running step, owned by the runtime.
pub trait StepContext {
    fn step_name(&self) -> String;

    fn execution_id(&self) -> Uuid;

    fn exit_status(&self) -> Option<String>;

    fn set_exit_status(&self, status: &str);
}

/// Everything a batch artifact may look at while it runs.
///
/// Bindings are passed explicitly rather than kept in global state, so one
/// artifact instance can serve several executions.
pub struct StepScope<'a> {
    pub properties: &'a BatchProperties,
    pub job: &'a dyn JobContext,
    pub step: &'a dyn StepContext,
}

impl<'a> StepScope<'a> {
    pub fn new(
        properties: &'a BatchProperties,
        job: &'a dyn JobContext,
        step: &'a dyn StepContext,
    ) -> Self {
        Self {
            properties,
            job,
            step,
        }
    }
}

/// In-memory [`JobContext`] used by [`JobInstance`](crate::core::job::JobInstance).
pub struct SimpleJobContext {
    name: String,
    execution_id: Uuid,
    batch_status: Cell<BatchStatus>,
    exit_status: RefCell<Option<String>>,
}

impl SimpleJobContext {
    /// Creates a context for a job called `name`, or a random name when `None`.
    pub fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string).unwrap_or_else(build_name),
            execution_id: Uuid::new_v4(),
            batch_status: Cell::new(BatchStatus::STARTING),
            exit_status: RefCell::new(None),
        }
    }

    pub fn set_batch_status(&self, status: BatchStatus) {
        self.batch_status.set(status);
    }
}

impl JobContext for SimpleJobContext {
    fn job_name(&self) -> String {
        self.name.clone()
    }

    fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    fn batch_status(&self) -> BatchStatus {
        self.batch_status.get()
    }

    fn exit_status(&self) -> Option<String> {
        self.exit_status.borrow().clone()
    }

    fn set_exit_status(&self, status: &str) {
        *self.exit_status.borrow_mut() = Some(status.to_string());
    }
}

/// In-memory [`StepContext`] created for each step execution.
pub struct SimpleStepContext {
    name: String,
    execution_id: Uuid,
    exit_status: RefCell<Option<String>>,
}

impl SimpleStepContext {
    pub fn new(name: &str) -> Self {
        Self::with_execution_id(name, Uuid::new_v4())
    }

    pub fn with_execution_id(name: &str, execution_id: Uuid) -> Self {
        Self {
            name: name.to_string(),
            execution_id,
            exit_status: RefCell::new(None),
        }
    }
}

impl StepContext for SimpleStepContext {
    fn step_name(&self) -> String {
        self.name.clone()
    }

    fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    fn exit_status(&self) -> Option<String> {
        self.exit_status.borrow().clone()
    }

    fn set_exit_status(&self, status: &str) {
        *self.exit_status.borrow_mut() = Some(status.to_string());
    }
}
