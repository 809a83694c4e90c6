#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # Batch Fixtures

 Small, well-behaved batch artifacts for exercising a JSR-352 style batch
 runtime: a checkpointed CSV item reader and a batchlet that echoes a
 configured test name as its exit status.

 ## Core Concepts

- **ItemReader:** Retrieves the input of a chunk step one item at a time. Its
  `checkpoint_info` is recorded at every commit and handed back to `open`
  when the step is restarted.
- **Batchlet:** A single-invocation unit of work. `process` returns the exit
  status, `stop` requests early termination.
- **StepScope:** The job context, step context and batch properties an
  artifact runs with, passed explicitly instead of living in global state.
- **Step / Job:** A thin in-process driver that runs the artifacts the way a
  runtime would, in order and without retry.

 ## Features

| **Feature** | **Description**                                                |
|-------------|----------------------------------------------------------------|
| csv         | Enables the in-memory CSV `ItemReader`                         |
| logger      | Enables a logger `ItemWriter`, useful for debugging purposes   |
| full        | Enables all available features                                 |

 ## Getting Started

```toml
[dependencies]
batch-fixtures = { version = "<version>", features = ["full"] }
```

```rust
# use batch_fixtures::{
#     batchlet::test_name::TestNameBatchlet,
#     core::{
#         context::BatchProperties,
#         job::{Job, JobBuilder},
#         step::StepBuilder,
#     },
#     error::BatchError,
# };
fn main() -> Result<(), BatchError> {
    let batchlet = TestNameBatchlet;

    let step = StepBuilder::new("step1")
        .batchlet(&batchlet)
        .properties(BatchProperties::new().with("testName", "PASS"))
        .build();

    let job = JobBuilder::new().name("job1".to_string()).start(&step).build();
    let execution = job.run()?;

    assert_eq!(execution.exit_status, "PASS");

    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.
 */

/// Core module for batch operations
pub mod core;

/// Error types for batch operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Set of item readers / writers (for example: csv reader)
pub mod item;

/// Set of batchlets
pub mod batchlet;
