use std::time::{Duration, Instant};

use log::{debug, info, warn};
use uuid::Uuid;

use crate::BatchError;

use super::{
    batchlet::Batchlet,
    checkpoint::Checkpoint,
    context::{BatchProperties, BatchStatus, JobContext, SimpleStepContext, StepContext, StepScope},
    item::{ItemProcessor, ItemReader, ItemWriter, PassThroughProcessor},
};

/// Outcome of reading one chunk.
#[derive(Debug, PartialEq)]
pub enum ChunkStatus {
    /// The chunk holds `chunk_size` items, more may follow
    Full,
    /// The reader is exhausted
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Starting,
    Success,
    ReadError,
    ProcessorError,
    WriteError,
    BatchletError,
}

/// Execution details of one step run.
#[derive(Debug)]
pub struct StepExecution {
    /// Unique identifier for this step execution
    pub id: Uuid,
    /// Human-readable name for the step
    pub name: String,
    /// Current status of the step execution
    pub status: StepStatus,
    /// Exit status reported by the step's artifacts, `None` until the step ends
    pub exit_status: Option<String>,
    pub start_time: Instant,
    pub end_time: Instant,
    pub duration: Duration,
    /// Number of items successfully read
    pub read_count: usize,
    /// Number of items successfully written
    pub write_count: usize,
    /// Number of chunks written
    pub commit_count: usize,
    /// Reader checkpoint recorded at the last commit
    pub checkpoint: Option<Checkpoint>,
}

impl StepExecution {
    pub fn new(name: &str) -> Self {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: StepStatus::Starting,
            exit_status: None,
            start_time: now,
            end_time: now,
            duration: Duration::default(),
            read_count: 0,
            write_count: 0,
            commit_count: 0,
            checkpoint: None,
        }
    }
}

pub trait Step {
    fn get_name(&self) -> &str;

    /// Executes the step within the given job.
    ///
    /// # Returns
    /// - `Ok(())`: the step completed, details are in `step_execution`
    /// - `Err(BatchError::Step)`: the step failed, `step_execution.status` says where
    fn execute(
        &self,
        job: &dyn JobContext,
        step_execution: &mut StepExecution,
    ) -> Result<(), BatchError>;

    /// Requests early termination. Steps with nothing to interrupt ignore it.
    fn stop(&self) {}
}

/// Step that drives a reader, a processor and a writer chunk by chunk.
///
/// After every written chunk the reader's checkpoint is recorded in the
/// step execution; passing it to [`ChunkOrientedStepBuilder::restart_from`]
/// resumes a later run right after the last committed item. Any error ends
/// the step: there is no skip or retry.
pub struct ChunkOrientedStep<'a, I, O> {
    name: String,
    /// Component responsible for reading items from the source
    reader: &'a dyn ItemReader<I>,
    /// Component responsible for processing items
    processor: &'a dyn ItemProcessor<I, O>,
    /// Component responsible for writing items to the destination
    writer: &'a dyn ItemWriter<O>,
    /// Number of items to process in each chunk
    chunk_size: u16,
    /// Checkpoint handed to the reader when it is opened
    restart: Option<Checkpoint>,
}

impl<I, O> Step for ChunkOrientedStep<'_, I, O> {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn execute(
        &self,
        job: &dyn JobContext,
        step_execution: &mut StepExecution,
    ) -> Result<(), BatchError> {
        let start_time = Instant::now();
        step_execution.status = StepStatus::Starting;

        info!(
            "Start of step: {}, id: {}, job: {}",
            step_execution.name,
            step_execution.id,
            job.job_name()
        );

        let result = self.open_and_run(step_execution);

        step_execution.start_time = start_time;
        step_execution.end_time = Instant::now();
        step_execution.duration = start_time.elapsed();

        info!(
            "End of step: {}, id: {}, read: {}, written: {}",
            step_execution.name,
            step_execution.id,
            step_execution.read_count,
            step_execution.write_count
        );

        match result {
            Ok(()) => {
                step_execution.status = StepStatus::Success;
                step_execution.exit_status = Some(BatchStatus::COMPLETED.to_string());
                Ok(())
            }
            Err(error) => {
                warn!("Step {} failed: {}", step_execution.name, error);
                step_execution.exit_status = Some(BatchStatus::FAILED.to_string());
                Err(BatchError::Step(step_execution.name.clone()))
            }
        }
    }
}

impl<I, O> ChunkOrientedStep<'_, I, O> {
    /// Opens the reader then the writer and runs the chunks. Only the
    /// components that were opened get closed.
    fn open_and_run(&self, step_execution: &mut StepExecution) -> Result<(), BatchError> {
        if let Err(error) = self.reader.open(self.restart.as_ref()) {
            step_execution.status = StepStatus::ReadError;
            return Err(error);
        }

        if let Err(error) = self.writer.open() {
            step_execution.status = StepStatus::WriteError;
            Self::manage_error(self.reader.close());
            return Err(error);
        }

        let result = self.run_chunks(step_execution);

        Self::manage_error(self.reader.close());
        Self::manage_error(self.writer.close());

        result
    }

    fn run_chunks(&self, step_execution: &mut StepExecution) -> Result<(), BatchError> {
        step_execution.checkpoint = self.reader.checkpoint_info();

        loop {
            let (read_items, chunk_status) = self.read_chunk(step_execution)?;

            let processed_items = self.process_chunk(step_execution, &read_items)?;

            self.write_chunk(step_execution, &processed_items)?;

            if !read_items.is_empty() {
                step_execution.commit_count += 1;
                step_execution.checkpoint = self.reader.checkpoint_info();
                debug!(
                    "Committed chunk {}, checkpoint: {:?}",
                    step_execution.commit_count, step_execution.checkpoint
                );
            }

            if chunk_status == ChunkStatus::Finished {
                return Ok(());
            }
        }
    }

    /// Reads up to `chunk_size` items.
    ///
    /// # Returns
    /// - `Ok((items, ChunkStatus::Full))`: the chunk is full
    /// - `Ok((items, ChunkStatus::Finished))`: the reader is exhausted, `items` may be empty
    /// - `Err(BatchError)`: the reader failed
    fn read_chunk(
        &self,
        step_execution: &mut StepExecution,
    ) -> Result<(Vec<I>, ChunkStatus), BatchError> {
        debug!("Start reading chunk");

        let mut read_items = Vec::with_capacity(self.chunk_size as usize);

        loop {
            match self.reader.read() {
                Ok(Some(item)) => {
                    read_items.push(item);
                    step_execution.read_count += 1;

                    if read_items.len() >= self.chunk_size as usize {
                        return Ok((read_items, ChunkStatus::Full));
                    }
                }
                Ok(None) => return Ok((read_items, ChunkStatus::Finished)),
                Err(error) => {
                    step_execution.status = StepStatus::ReadError;
                    return Err(error);
                }
            }
        }
    }

    fn process_chunk(
        &self,
        step_execution: &mut StepExecution,
        read_items: &[I],
    ) -> Result<Vec<O>, BatchError> {
        debug!("Processing chunk of {} items", read_items.len());

        let mut result = Vec::with_capacity(read_items.len());
        for item in read_items {
            match self.processor.process(item) {
                Ok(processed_item) => result.push(processed_item),
                Err(error) => {
                    step_execution.status = StepStatus::ProcessorError;
                    return Err(error);
                }
            }
        }

        Ok(result)
    }

    fn write_chunk(
        &self,
        step_execution: &mut StepExecution,
        processed_items: &[O],
    ) -> Result<(), BatchError> {
        if processed_items.is_empty() {
            debug!("No items to write, skipping write call");
            return Ok(());
        }

        debug!("Writing chunk of {} items", processed_items.len());

        let result = self
            .writer
            .write(processed_items)
            .and_then(|()| self.writer.flush());

        match result {
            Ok(()) => {
                step_execution.write_count += processed_items.len();
                Ok(())
            }
            Err(error) => {
                step_execution.status = StepStatus::WriteError;
                Err(error)
            }
        }
    }

    /// Logs errors from operations that must not fail the step.
    fn manage_error(result: Result<(), BatchError>) {
        if let Err(error) = result {
            warn!("Non-fatal error: {}", error);
        }
    }
}

pub struct ChunkOrientedStepBuilder<'a, I, O> {
    name: String,
    reader: Option<&'a dyn ItemReader<I>>,
    processor: Option<&'a dyn ItemProcessor<I, O>>,
    writer: Option<&'a dyn ItemWriter<O>>,
    chunk_size: u16,
    restart: Option<Checkpoint>,
}

impl<'a, I, O> ChunkOrientedStepBuilder<'a, I, O> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            reader: None,
            processor: None,
            writer: None,
            chunk_size: 10,
            restart: None,
        }
    }

    pub fn reader(mut self, reader: &'a dyn ItemReader<I>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn processor(mut self, processor: &'a dyn ItemProcessor<I, O>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn writer(mut self, writer: &'a dyn ItemWriter<O>) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Number of items per chunk, at least 1.
    pub fn chunk_size(mut self, chunk_size: u16) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Resumes reading from a checkpoint recorded by a previous execution.
    pub fn restart_from(mut self, checkpoint: Checkpoint) -> Self {
        self.restart = Some(checkpoint);
        self
    }

    /// Builds the step. Without a processor, items are passed through as read.
    ///
    /// # Errors
    /// `BatchError::Step` if the reader or the writer is missing.
    pub fn build(self) -> Result<ChunkOrientedStep<'a, I, O>, BatchError>
    where
        PassThroughProcessor: ItemProcessor<I, O>,
    {
        let reader = self
            .reader
            .ok_or_else(|| BatchError::Step(format!("{}: a reader is required", self.name)))?;
        let writer = self
            .writer
            .ok_or_else(|| BatchError::Step(format!("{}: a writer is required", self.name)))?;

        Ok(ChunkOrientedStep {
            name: self.name,
            reader,
            processor: self.processor.unwrap_or(&PassThroughProcessor),
            writer,
            chunk_size: self.chunk_size,
            restart: self.restart,
        })
    }
}

/// Step that runs a [`Batchlet`] once.
///
/// The step exit status is the one set on the step context by the batchlet,
/// or else the value returned by `process`.
pub struct BatchletStep<'a> {
    name: String,
    batchlet: &'a dyn Batchlet,
    properties: BatchProperties,
}

impl Step for BatchletStep<'_> {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn execute(
        &self,
        job: &dyn JobContext,
        step_execution: &mut StepExecution,
    ) -> Result<(), BatchError> {
        let start_time = Instant::now();
        step_execution.status = StepStatus::Starting;

        info!(
            "Start of step: {}, id: {}, job: {}",
            step_execution.name,
            step_execution.id,
            job.job_name()
        );

        let step_context = SimpleStepContext::with_execution_id(&self.name, step_execution.id);
        let scope = StepScope::new(&self.properties, job, &step_context);
        let result = self.batchlet.process(&scope);

        step_execution.start_time = start_time;
        step_execution.end_time = Instant::now();
        step_execution.duration = start_time.elapsed();

        match result {
            Ok(status) => {
                let exit_status = step_context.exit_status().unwrap_or(status);
                info!(
                    "End of step: {}, id: {}, exit status: {}",
                    step_execution.name, step_execution.id, exit_status
                );
                step_execution.status = StepStatus::Success;
                step_execution.exit_status = Some(exit_status);
                Ok(())
            }
            Err(error) => {
                warn!("Step {} failed: {}", step_execution.name, error);
                step_execution.status = StepStatus::BatchletError;
                step_execution.exit_status = Some(BatchStatus::FAILED.to_string());
                Err(BatchError::Step(step_execution.name.clone()))
            }
        }
    }

    fn stop(&self) {
        info!("Stop requested for step: {}", self.name);
        self.batchlet.stop();
    }
}

pub struct BatchletStepBuilder<'a> {
    name: String,
    batchlet: &'a dyn Batchlet,
    properties: BatchProperties,
}

impl<'a> BatchletStepBuilder<'a> {
    pub fn new(name: &str, batchlet: &'a dyn Batchlet) -> Self {
        Self {
            name: name.to_string(),
            batchlet,
            properties: BatchProperties::new(),
        }
    }

    /// Properties visible to the batchlet through its [`StepScope`].
    pub fn properties(mut self, properties: BatchProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn build(self) -> BatchletStep<'a> {
        BatchletStep {
            name: self.name,
            batchlet: self.batchlet,
            properties: self.properties,
        }
    }
}

pub struct StepBuilder {
    name: String,
}

impl StepBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    pub fn batchlet<'a>(self, batchlet: &'a dyn Batchlet) -> BatchletStepBuilder<'a> {
        BatchletStepBuilder::new(&self.name, batchlet)
    }

    pub fn chunk<'a, I, O>(self, chunk_size: u16) -> ChunkOrientedStepBuilder<'a, I, O> {
        ChunkOrientedStepBuilder::new(&self.name).chunk_size(chunk_size)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use crate::{
        core::{
            batchlet::Batchlet,
            checkpoint::Checkpoint,
            context::{JobContext, SimpleJobContext, StepContext, StepScope},
            item::{ItemProcessor, ItemProcessorResult, ItemReader, ItemReaderResult, ItemWriter},
        },
        error::BatchError,
    };

    use super::{Step, StepBuilder, StepExecution, StepStatus};

    /// Serves `0..count` and reports its position as checkpoint.
    struct CountingReader {
        count: usize,
        position: Cell<usize>,
        fail_at: Option<usize>,
        fail_open: bool,
        closed: Cell<bool>,
    }

    impl CountingReader {
        fn new(count: usize) -> Self {
            Self {
                count,
                position: Cell::new(0),
                fail_at: None,
                fail_open: false,
                closed: Cell::new(false),
            }
        }
    }

    impl ItemReader<usize> for CountingReader {
        fn open(&self, checkpoint: Option<&Checkpoint>) -> Result<(), BatchError> {
            if self.fail_open {
                return Err(BatchError::ItemReader("missing input".to_string()));
            }
            self.position
                .set(checkpoint.map(Checkpoint::position).unwrap_or(0));
            Ok(())
        }

        fn read(&self) -> ItemReaderResult<usize> {
            let position = self.position.get();
            if Some(position) == self.fail_at {
                return Err(BatchError::ItemReader("boom".to_string()));
            }
            if position >= self.count {
                return Ok(None);
            }
            self.position.set(position + 1);
            Ok(Some(position))
        }

        fn checkpoint_info(&self) -> Option<Checkpoint> {
            Some(Checkpoint::new(self.position.get()))
        }

        fn close(&self) -> Result<(), BatchError> {
            self.closed.set(true);
            Ok(())
        }
    }

    #[derive(Default)]
    struct CollectingWriter {
        items: RefCell<Vec<usize>>,
        chunks: Cell<usize>,
        fail_open: bool,
        opened: Cell<bool>,
        closed: Cell<bool>,
    }

    impl ItemWriter<usize> for CollectingWriter {
        fn write(&self, items: &[usize]) -> Result<(), BatchError> {
            self.items.borrow_mut().extend_from_slice(items);
            self.chunks.set(self.chunks.get() + 1);
            Ok(())
        }

        fn open(&self) -> Result<(), BatchError> {
            if self.fail_open {
                return Err(BatchError::ItemWriter("read-only target".to_string()));
            }
            self.opened.set(true);
            Ok(())
        }

        fn close(&self) -> Result<(), BatchError> {
            self.closed.set(true);
            Ok(())
        }
    }

    struct DoublingProcessor;

    impl ItemProcessor<usize, usize> for DoublingProcessor {
        fn process(&self, item: &usize) -> ItemProcessorResult<usize> {
            Ok(item * 2)
        }
    }

    struct StatusBatchlet {
        step_status: Option<&'static str>,
        stopped: Cell<bool>,
    }

    impl Batchlet for StatusBatchlet {
        fn process(&self, scope: &StepScope) -> Result<String, BatchError> {
            if let Some(status) = self.step_status {
                scope.step.set_exit_status(status);
            }
            Ok("RETURNED".to_string())
        }

        fn stop(&self) {
            self.stopped.set(true);
        }
    }

    #[test]
    fn chunk_step_reads_and_writes_every_item() {
        let reader = CountingReader::new(5);
        let writer = CollectingWriter::default();
        let job = SimpleJobContext::new(Some("job"));

        let step = StepBuilder::new("step")
            .chunk(2)
            .reader(&reader)
            .writer(&writer)
            .build()
            .unwrap();
        let mut execution = StepExecution::new(step.get_name());

        step.execute(&job, &mut execution).unwrap();

        assert_eq!(execution.status, StepStatus::Success);
        assert_eq!(execution.exit_status.as_deref(), Some("COMPLETED"));
        assert_eq!(execution.read_count, 5);
        assert_eq!(execution.write_count, 5);
        assert_eq!(execution.commit_count, 3);
        assert_eq!(execution.checkpoint, Some(Checkpoint::new(5)));
        assert_eq!(*writer.items.borrow(), vec![0, 1, 2, 3, 4]);
        assert_eq!(writer.chunks.get(), 3);
    }

    #[test]
    fn chunk_step_applies_processor() {
        let reader = CountingReader::new(3);
        let writer = CollectingWriter::default();
        let processor = DoublingProcessor;
        let job = SimpleJobContext::new(None);

        let step = StepBuilder::new("step")
            .chunk(10)
            .reader(&reader)
            .processor(&processor)
            .writer(&writer)
            .build()
            .unwrap();

        step.execute(&job, &mut StepExecution::new("step")).unwrap();

        assert_eq!(*writer.items.borrow(), vec![0, 2, 4]);
    }

    #[test]
    fn chunk_step_restarts_from_checkpoint() {
        let reader = CountingReader::new(4);
        let writer = CollectingWriter::default();
        let job = SimpleJobContext::new(None);

        let step = StepBuilder::new("step")
            .chunk(3)
            .reader(&reader)
            .writer(&writer)
            .restart_from(Checkpoint::new(2))
            .build()
            .unwrap();
        let mut execution = StepExecution::new("step");

        step.execute(&job, &mut execution).unwrap();

        assert_eq!(*writer.items.borrow(), vec![2, 3]);
        assert_eq!(execution.read_count, 2);
        assert_eq!(execution.checkpoint, Some(Checkpoint::new(4)));
    }

    #[test]
    fn chunk_step_keeps_last_committed_checkpoint_on_read_error() {
        let reader = CountingReader {
            fail_at: Some(3),
            ..CountingReader::new(10)
        };
        let writer = CollectingWriter::default();
        let job = SimpleJobContext::new(None);

        let step = StepBuilder::new("step")
            .chunk(2)
            .reader(&reader)
            .writer(&writer)
            .build()
            .unwrap();
        let mut execution = StepExecution::new("step");

        let result = step.execute(&job, &mut execution);

        assert!(matches!(result, Err(BatchError::Step(name)) if name == "step"));
        assert_eq!(execution.status, StepStatus::ReadError);
        assert_eq!(execution.checkpoint, Some(Checkpoint::new(2)));
        assert_eq!(*writer.items.borrow(), vec![0, 1]);
    }

    #[test]
    fn chunk_step_closes_reader_and_writer_after_success() {
        let reader = CountingReader::new(3);
        let writer = CollectingWriter::default();
        let job = SimpleJobContext::new(None);

        let step = StepBuilder::new("step")
            .chunk(2)
            .reader(&reader)
            .writer(&writer)
            .build()
            .unwrap();

        step.execute(&job, &mut StepExecution::new("step")).unwrap();

        assert!(reader.closed.get());
        assert!(writer.opened.get());
        assert!(writer.closed.get());
    }

    #[test]
    fn failed_reader_open_leaves_writer_untouched() {
        let reader = CountingReader {
            fail_open: true,
            ..CountingReader::new(3)
        };
        let writer = CollectingWriter::default();
        let job = SimpleJobContext::new(None);

        let step = StepBuilder::new("step")
            .chunk(2)
            .reader(&reader)
            .writer(&writer)
            .build()
            .unwrap();
        let mut execution = StepExecution::new("step");

        let result = step.execute(&job, &mut execution);

        assert!(result.is_err());
        assert_eq!(execution.status, StepStatus::ReadError);
        assert!(!reader.closed.get());
        assert!(!writer.opened.get());
        assert!(!writer.closed.get());
    }

    #[test]
    fn failed_writer_open_closes_only_the_reader() {
        let reader = CountingReader::new(3);
        let writer = CollectingWriter {
            fail_open: true,
            ..CollectingWriter::default()
        };
        let job = SimpleJobContext::new(None);

        let step = StepBuilder::new("step")
            .chunk(2)
            .reader(&reader)
            .writer(&writer)
            .build()
            .unwrap();
        let mut execution = StepExecution::new("step");

        let result = step.execute(&job, &mut execution);

        assert!(result.is_err());
        assert_eq!(execution.status, StepStatus::WriteError);
        assert!(reader.closed.get());
        assert!(!writer.closed.get());
        assert_eq!(execution.read_count, 0);
    }

    #[test]
    fn chunk_step_with_no_items_succeeds_without_writing() {
        let reader = CountingReader::new(0);
        let writer = CollectingWriter::default();
        let job = SimpleJobContext::new(None);

        let step = StepBuilder::new("empty")
            .chunk(2)
            .reader(&reader)
            .writer(&writer)
            .build()
            .unwrap();
        let mut execution = StepExecution::new("empty");

        step.execute(&job, &mut execution).unwrap();

        assert_eq!(execution.commit_count, 0);
        assert_eq!(writer.chunks.get(), 0);
    }

    #[test]
    fn chunk_step_requires_a_writer() {
        let reader = CountingReader::new(1);

        let result = StepBuilder::new("step")
            .chunk::<usize, usize>(1)
            .reader(&reader)
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn batchlet_return_value_becomes_step_exit_status() {
        let batchlet = StatusBatchlet {
            step_status: None,
            stopped: Cell::new(false),
        };
        let job = SimpleJobContext::new(Some("job"));
        let step = StepBuilder::new("step").batchlet(&batchlet).build();
        let mut execution = StepExecution::new("step");

        step.execute(&job, &mut execution).unwrap();

        assert_eq!(execution.exit_status.as_deref(), Some("RETURNED"));
        assert!(job.exit_status().is_none());
    }

    #[test]
    fn step_context_exit_status_wins_over_return_value() {
        let batchlet = StatusBatchlet {
            step_status: Some("FROM_CONTEXT"),
            stopped: Cell::new(false),
        };
        let job = SimpleJobContext::new(Some("job"));
        let step = StepBuilder::new("step").batchlet(&batchlet).build();
        let mut execution = StepExecution::new("step");

        step.execute(&job, &mut execution).unwrap();

        assert_eq!(execution.exit_status.as_deref(), Some("FROM_CONTEXT"));
    }

    #[test]
    fn stop_is_forwarded_to_batchlet() {
        let batchlet = StatusBatchlet {
            step_status: None,
            stopped: Cell::new(false),
        };
        let step = StepBuilder::new("step").batchlet(&batchlet).build();

        step.stop();

        assert!(batchlet.stopped.get());
    }
}
