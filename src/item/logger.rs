use std::{cell::Cell, fmt::Debug};

use log::info;

use crate::{core::item::ItemWriter, BatchError};

/// Writer that logs every item at `info` level and keeps nothing but a count.
///
/// Handy as the writing end of a chunk step whose only purpose is to check
/// what a reader produced.
///
/// # Examples
///
/// ```
/// use batch_fixtures::core::item::ItemWriter;
/// use batch_fixtures::item::logger::LoggerWriter;
///
/// let writer = LoggerWriter::new("numbers");
/// let items: &[u32] = &[1, 2, 3];
/// writer.write(items).unwrap();
///
/// assert_eq!(writer.written(), 3);
/// ```
pub struct LoggerWriter {
    label: String,
    written: Cell<usize>,
}

impl Default for LoggerWriter {
    fn default() -> Self {
        Self::new("Record")
    }
}

impl LoggerWriter {
    /// `label` prefixes every logged line.
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            written: Cell::new(0),
        }
    }

    /// Number of items logged so far.
    pub fn written(&self) -> usize {
        self.written.get()
    }
}

impl<T> ItemWriter<T> for LoggerWriter
where
    T: Debug,
{
    fn write(&self, items: &[T]) -> Result<(), BatchError> {
        items
            .iter()
            .for_each(|item| info!("{}: {:?}", self.label, item));
        self.written.set(self.written.get() + items.len());
        Ok(())
    }
}
