use thiserror::Error;

#[derive(Error, Debug)]
/// Batch error
pub enum BatchError {
    #[error("ItemWriter from: {0}")]
    ItemWriter(String),

    #[error("ItemReader from: {0}")]
    ItemReader(String),

    #[error("ItemProcessor from: {0}")]
    ItemProcessor(String),

    #[error("Batchlet from: {0}")]
    Batchlet(String),

    #[error("Step failed: {0}")]
    Step(String),

    #[error("Missing batch property: {0}")]
    MissingProperty(String),

    #[error("Invalid batch properties: {0}")]
    Properties(String),

    #[error("Invalid checkpoint: {0}")]
    Checkpoint(String),
}
