use std::time::{Duration, Instant};

use log::{info, warn};
use uuid::Uuid;

use crate::BatchError;

use super::{
    build_name,
    context::{BatchStatus, JobContext, SimpleJobContext},
    step::{Step, StepExecution},
};

/// Type alias for job execution results.
type JobResult<T> = Result<T, BatchError>;

/// Represents a job that can be executed.
///
/// A job is a container for a sequence of steps that are executed in order.
/// The job orchestrates the steps and reports the overall result.
pub trait Job {
    /// Runs the job with a fresh in-memory job context.
    fn run(&self) -> JobResult<JobExecution>;

    /// Runs the job against a context supplied by the caller.
    ///
    /// # Returns
    /// - `Ok(JobExecution)` when every step completes
    /// - `Err(BatchError::Step)` naming the first step that failed
    fn run_with_context(&self, context: &dyn JobContext) -> JobResult<JobExecution>;
}

/// Represents the execution of a job.
#[derive(Debug)]
pub struct JobExecution {
    /// Execution id of the job context the job ran with
    pub id: Uuid,
    pub name: String,
    /// The time when the job started executing
    pub start: Instant,
    /// The time when the job finished executing
    pub end: Instant,
    /// The total duration of the job execution
    pub duration: Duration,
    pub batch_status: BatchStatus,
    /// Exit status set on the job context, or the batch status when none was set
    pub exit_status: String,
    /// Executions of the steps, in run order
    pub step_executions: Vec<StepExecution>,
}

/// Represents an instance of a job.
///
/// A `JobInstance` is created through the `JobBuilder` and executed by
/// calling `run`. The steps are executed in the order they were added.
pub struct JobInstance<'a> {
    /// Unique identifier for this job instance
    id: Uuid,
    /// Human-readable name for the job
    name: String,
    /// Collection of steps that make up this job, in execution order
    steps: Vec<&'a dyn Step>,
}

impl JobInstance<'_> {
    pub fn get_id(&self) -> Uuid {
        self.id
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Forwards a stop request to every step.
    pub fn stop(&self) {
        info!("Stop requested for job: {}, id: {}", self.name, self.id);
        self.steps.iter().for_each(|step| step.stop());
    }
}

impl Job for JobInstance<'_> {
    fn run(&self) -> JobResult<JobExecution> {
        let context = SimpleJobContext::new(Some(&self.name));
        context.set_batch_status(BatchStatus::STARTED);

        let result = self.run_with_context(&context);

        context.set_batch_status(match result {
            Ok(_) => BatchStatus::COMPLETED,
            Err(_) => BatchStatus::FAILED,
        });

        result
    }

    fn run_with_context(&self, context: &dyn JobContext) -> JobResult<JobExecution> {
        let start = Instant::now();

        info!(
            "Start of job: {}, id: {}, execution: {}",
            self.name,
            self.id,
            context.execution_id()
        );

        let mut step_executions = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let mut step_execution = StepExecution::new(step.get_name());
            let result = step.execute(context, &mut step_execution);
            step_executions.push(step_execution);

            // If a step fails, abort the job
            if let Err(error) = result {
                warn!("Job {} failed: {}", self.name, error);
                return Err(BatchError::Step(step.get_name().to_owned()));
            }
        }

        let exit_status = context
            .exit_status()
            .unwrap_or_else(|| BatchStatus::COMPLETED.to_string());

        info!(
            "End of job: {}, id: {}, exit status: {}",
            self.name, self.id, exit_status
        );

        Ok(JobExecution {
            id: context.execution_id(),
            name: self.name.clone(),
            start,
            end: Instant::now(),
            duration: start.elapsed(),
            batch_status: BatchStatus::COMPLETED,
            exit_status,
            step_executions,
        })
    }
}

/// Builder for creating a job instance.
///
/// # Example
///
/// ```
/// use batch_fixtures::batchlet::test_name::TestNameBatchlet;
/// use batch_fixtures::core::context::BatchProperties;
/// use batch_fixtures::core::job::{Job, JobBuilder};
/// use batch_fixtures::core::step::StepBuilder;
///
/// let batchlet = TestNameBatchlet;
/// let step = StepBuilder::new("step1")
///     .batchlet(&batchlet)
///     .properties(BatchProperties::new().with("testName", "PASS"))
///     .build();
///
/// let job = JobBuilder::new().name("job1".to_string()).start(&step).build();
/// let execution = job.run().unwrap();
///
/// assert_eq!(execution.exit_status, "PASS");
/// ```
#[derive(Default)]
pub struct JobBuilder<'a> {
    /// Optional name for the job (generated randomly if not specified)
    name: Option<String>,
    /// Collection of steps to be executed, in order
    steps: Vec<&'a dyn Step>,
}

impl<'a> JobBuilder<'a> {
    pub fn new() -> Self {
        Self {
            name: None,
            steps: Vec::new(),
        }
    }

    pub fn name(mut self, name: String) -> JobBuilder<'a> {
        self.name = Some(name);
        self
    }

    /// Sets the first step of the job. Same as `next`, reads better first.
    pub fn start(mut self, step: &'a dyn Step) -> JobBuilder<'a> {
        self.steps.push(step);
        self
    }

    /// Adds a step to the job. Steps are executed in the order they are added.
    pub fn next(mut self, step: &'a dyn Step) -> JobBuilder<'a> {
        self.steps.push(step);
        self
    }

    /// Builds the job. If no name has been provided, a random name is generated.
    pub fn build(self) -> JobInstance<'a> {
        JobInstance {
            id: Uuid::new_v4(),
            name: self.name.unwrap_or_else(build_name),
            steps: self.steps,
        }
    }
}
