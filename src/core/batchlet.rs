use crate::error::BatchError;

use super::context::StepScope;

/// A single-invocation unit of work, run by a
/// [`BatchletStep`](crate::core::step::BatchletStep).
///
/// `process` runs once to completion and returns the exit status of the
/// unit of work. `stop` may be called by the runtime to request early
/// termination; implementations with nothing in flight can ignore it.
pub trait Batchlet {
    fn process(&self, scope: &StepScope) -> Result<String, BatchError>;

    fn stop(&self) {}
}
