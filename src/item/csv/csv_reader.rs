use log::{debug, info};
use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::{
    core::{
        checkpoint::Checkpoint,
        context::BatchProperties,
        item::{ItemReader, ItemReaderResult},
    },
    error::BatchError,
};

/// Property naming the file to read.
pub const RESOURCE_PROPERTY: &str = "resource";

/// Optional property overriding the field delimiter (one ASCII character).
pub const DELIMITER_PROPERTY: &str = "delimiter";

/// One line of the source file, split into fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row(Vec<String>);

impl Row {
    /// Splits `line` on every `delimiter`, without quoting or trimming. A
    /// trailing `\r` left by a CRLF terminator is dropped first, so a line
    /// with `n` delimiters always gives `n + 1` fields and an empty line
    /// gives one empty field.
    pub fn split(line: &str, delimiter: u8) -> Self {
        let line = line.strip_suffix('\r').unwrap_or(line);
        Row(line
            .split(char::from(delimiter))
            .map(str::to_string)
            .collect())
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_fields(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for Row {
    fn from(fields: Vec<String>) -> Self {
        Row(fields)
    }
}

/// Reader that serves the rows of a delimited file from memory.
///
/// Nothing is read until [`ItemReader::open`] is called. Opening loads every
/// row and positions the cursor, either at the start or at the checkpoint of
/// a previous execution. The row buffer is replaced only once the whole file
/// has been read, so a failed open never leaves a partial buffer behind.
///
/// # Examples
///
/// ```
/// use batch_fixtures::core::{checkpoint::Checkpoint, item::ItemReader};
/// use batch_fixtures::item::csv::csv_reader::CsvItemReaderBuilder;
/// use std::io::Write;
///
/// let mut file = tempfile::NamedTempFile::new().unwrap();
/// file.write_all(b"1\n2\n3\n").unwrap();
///
/// let reader = CsvItemReaderBuilder::new().from_path(file.path());
///
/// // Resume after the first two rows
/// reader.open(Some(&Checkpoint::new(2))).unwrap();
///
/// assert_eq!(reader.read().unwrap().unwrap().fields(), &["3"]);
/// assert!(reader.read().unwrap().is_none());
/// ```
pub struct CsvItemReader {
    resource: PathBuf,
    delimiter: u8,
    /// `None` until opened, and again after close
    rows: RefCell<Option<Vec<Row>>>,
    position: Cell<usize>,
}

impl CsvItemReader {
    /// Builds a reader from batch properties.
    ///
    /// `resource` is required. `delimiter` is optional and must be a single
    /// ASCII character.
    pub fn from_properties(properties: &BatchProperties) -> Result<Self, BatchError> {
        let resource = properties.require(RESOURCE_PROPERTY)?;

        let mut builder = CsvItemReaderBuilder::new();

        if let Some(delimiter) = properties.get(DELIMITER_PROPERTY) {
            match delimiter.as_bytes() {
                [byte] if byte.is_ascii() => builder = builder.delimiter(*byte),
                _ => {
                    return Err(BatchError::Properties(format!(
                        "{} must be a single ASCII character, got {:?}",
                        DELIMITER_PROPERTY, delimiter
                    )));
                }
            }
        }

        Ok(builder.from_path(resource))
    }

    pub fn resource(&self) -> &Path {
        &self.resource
    }

    /// Reads the whole resource, one row per line. The file is closed when
    /// the buffered reader goes out of scope, on success and on every error
    /// path.
    fn load_rows(&self) -> Result<Vec<Row>, BatchError> {
        let file = File::open(&self.resource).map_err(|error| {
            BatchError::ItemReader(format!(
                "unable to open {}: {}",
                self.resource.display(),
                error
            ))
        })?;

        let mut rows = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|error| {
                BatchError::ItemReader(format!(
                    "unable to read {}: {}",
                    self.resource.display(),
                    error
                ))
            })?;
            rows.push(Row::split(&line, self.delimiter));
        }

        Ok(rows)
    }
}

impl ItemReader<Row> for CsvItemReader {
    /// Loads the resource and positions the cursor.
    ///
    /// # Errors
    /// - `BatchError::ItemReader` if the file cannot be opened or read
    /// - `BatchError::Checkpoint` if the checkpoint points past the last row
    fn open(&self, checkpoint: Option<&Checkpoint>) -> Result<(), BatchError> {
        let rows = self.load_rows()?;

        let position = match checkpoint {
            Some(checkpoint) if checkpoint.position() > rows.len() => {
                return Err(BatchError::Checkpoint(format!(
                    "position {} is beyond the {} rows of {}",
                    checkpoint.position(),
                    rows.len(),
                    self.resource.display()
                )));
            }
            Some(checkpoint) => checkpoint.position(),
            None => 0,
        };

        info!(
            "Opened {} with {} rows, starting at row {}",
            self.resource.display(),
            rows.len(),
            position
        );

        *self.rows.borrow_mut() = Some(rows);
        self.position.set(position);

        Ok(())
    }

    /// Returns the row under the cursor and advances it.
    ///
    /// # Returns
    /// - `Ok(Some(row))` while rows remain
    /// - `Ok(None)` once every row has been read
    /// - `Err(BatchError::ItemReader)` if the reader is not open
    fn read(&self) -> ItemReaderResult<Row> {
        let rows = self.rows.borrow();
        let rows = rows
            .as_ref()
            .ok_or_else(|| BatchError::ItemReader("CSV reader is not open".to_string()))?;

        let position = self.position.get();
        match rows.get(position) {
            Some(row) => {
                self.position.set(position + 1);
                Ok(Some(row.clone()))
            }
            None => {
                debug!("End of {} reached at row {}", self.resource.display(), position);
                Ok(None)
            }
        }
    }

    fn checkpoint_info(&self) -> Option<Checkpoint> {
        Some(Checkpoint::new(self.position.get()))
    }

    fn close(&self) -> Result<(), BatchError> {
        *self.rows.borrow_mut() = None;
        debug!("Closed {}", self.resource.display());
        Ok(())
    }
}

/// A builder for configuring a [`CsvItemReader`].
///
/// # Default Configuration
///
/// - Delimiter: comma (,)
///
/// # Examples
///
/// ```
/// use batch_fixtures::item::csv::csv_reader::CsvItemReaderBuilder;
///
/// let reader = CsvItemReaderBuilder::new()
///     .delimiter(b';')
///     .from_path("numbers.csv");
///
/// assert_eq!(reader.resource().to_str(), Some("numbers.csv"));
/// ```
pub struct CsvItemReaderBuilder {
    delimiter: u8,
}

impl Default for CsvItemReaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvItemReaderBuilder {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Creates a reader for the file at `path`. The file is not touched
    /// until the reader is opened.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> CsvItemReader {
        CsvItemReader {
            resource: path.as_ref().to_path_buf(),
            delimiter: self.delimiter,
            rows: RefCell::new(None),
            position: Cell::new(0),
        }
    }
}
