use crate::{core::checkpoint::Checkpoint, error::BatchError};

/// Result of a single `read` call.
///
/// - `Ok(Some(item))`: an item was read
/// - `Ok(None)`: the reader is exhausted (end-of-data, not an error)
/// - `Err(BatchError)`: reading failed
pub type ItemReaderResult<I> = Result<Option<I>, BatchError>;

/// Result of processing one item.
pub type ItemProcessorResult<O> = Result<O, BatchError>;

/// Result of writing a chunk of items.
pub type ItemWriterResult = Result<(), BatchError>;

/// Retrieves input for a step, one item at a time.
///
/// The lifecycle mirrors the reader role a batch runtime drives:
/// `open` (with the checkpoint of a previous run, if any), repeated `read`
/// calls interleaved with `checkpoint_info` at every commit, then `close`.
///
/// Methods take `&self`; implementations keep their cursor behind interior
/// mutability so a step can hold the reader by shared reference.
pub trait ItemReader<I> {
    /// Prepares the reader. `checkpoint` is the token last returned by
    /// [`ItemReader::checkpoint_info`] when the step is restarted.
    fn open(&self, _checkpoint: Option<&Checkpoint>) -> Result<(), BatchError> {
        Ok(())
    }

    /// Reads the next item. Returns `Ok(None)` once the input is exhausted.
    fn read(&self) -> ItemReaderResult<I>;

    /// Current read progress, persisted by the runtime at each commit.
    fn checkpoint_info(&self) -> Option<Checkpoint> {
        None
    }

    fn close(&self) -> Result<(), BatchError> {
        Ok(())
    }
}

pub trait ItemProcessor<I, O> {
    fn process(&self, item: &I) -> ItemProcessorResult<O>;
}

pub trait ItemWriter<O> {
    fn write(&self, items: &[O]) -> ItemWriterResult;

    fn flush(&self) -> ItemWriterResult {
        Ok(())
    }

    fn open(&self) -> ItemWriterResult {
        Ok(())
    }

    fn close(&self) -> ItemWriterResult {
        Ok(())
    }
}

/// Processor that hands every item through unchanged.
#[derive(Default)]
pub struct PassThroughProcessor;

impl<I: Clone> ItemProcessor<I, I> for PassThroughProcessor {
    fn process(&self, item: &I) -> ItemProcessorResult<I> {
        Ok(item.clone())
    }
}
