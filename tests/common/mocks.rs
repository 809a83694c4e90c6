//! Mock versions of the runtime-owned contexts.
use mockall::mock;
use uuid::Uuid;

use batch_fixtures::core::context::{BatchStatus, JobContext, StepContext};

mock! {
    pub JobCtx {}
    impl JobContext for JobCtx {
        fn job_name(&self) -> String;
        fn execution_id(&self) -> Uuid;
        fn batch_status(&self) -> BatchStatus;
        fn exit_status(&self) -> Option<String>;
        fn set_exit_status(&self, status: &str);
    }
}

mock! {
    pub StepCtx {}
    impl StepContext for StepCtx {
        fn step_name(&self) -> String;
        fn execution_id(&self) -> Uuid;
        fn exit_status(&self) -> Option<String>;
        fn set_exit_status(&self, status: &str);
    }
}
