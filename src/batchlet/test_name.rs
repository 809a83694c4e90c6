//! Batchlet that echoes the `testName` property back as its exit status.
//!
//! Its only purpose is to check that a runtime plumbs job context, step
//! context and batch properties through to the batchlet, and that exit
//! statuses set by the batchlet reach the job execution.

use log::info;

use crate::{
    core::{
        batchlet::Batchlet,
        context::{JobContext, StepContext, StepScope},
    },
    error::BatchError,
};

/// Property whose value becomes the job exit status.
pub const TEST_NAME_PROPERTY: &str = "testName";

/// Sets the job exit status to the `testName` property and returns it.
///
/// # Examples
///
/// ```
/// use batch_fixtures::batchlet::test_name::TestNameBatchlet;
/// use batch_fixtures::core::batchlet::Batchlet;
/// use batch_fixtures::core::context::{
///     BatchProperties, JobContext, SimpleJobContext, SimpleStepContext, StepScope,
/// };
///
/// let properties = BatchProperties::new().with("testName", "PASS");
/// let job = SimpleJobContext::new(Some("job1"));
/// let step = SimpleStepContext::new("step1");
///
/// let status = TestNameBatchlet
///     .process(&StepScope::new(&properties, &job, &step))
///     .unwrap();
///
/// assert_eq!(status, "PASS");
/// assert_eq!(job.exit_status().as_deref(), Some("PASS"));
/// ```
#[derive(Default)]
pub struct TestNameBatchlet;

impl Batchlet for TestNameBatchlet {
    /// # Errors
    /// `BatchError::MissingProperty` when `testName` is not configured. The job
    /// exit status is left untouched in that case.
    fn process(&self, scope: &StepScope) -> Result<String, BatchError> {
        let job_name = scope.job.job_name();
        let step_name = scope.step.step_name();
        let test_name = scope.properties.require(TEST_NAME_PROPERTY)?;

        info!(
            "Batchlet process in job: {}, step: {}, testName: {}",
            job_name, step_name, test_name
        );

        scope.job.set_exit_status(test_name);

        Ok(test_name.to_string())
    }

    fn stop(&self) {
        info!("Batchlet stop requested, nothing in flight");
    }
}
