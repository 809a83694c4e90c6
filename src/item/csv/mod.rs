/// CSV item reader backed by an in-memory row buffer.
///
/// The reader loads the whole resource when it is opened, splitting each line
/// on a single-byte delimiter, and then hands out one [`Row`](csv_reader::Row)
/// per `read` call. Its checkpoint is the number of rows already handed out,
/// so a restarted step resumes on the first row it had not yet read.
///
/// Parsing is deliberately naive: no quoting, no escaping, no header row and
/// no trimming. A line with `n` delimiters always yields `n + 1` fields, so
/// an empty line yields a single empty field.
///
/// # Examples
///
/// ```
/// use batch_fixtures::core::item::ItemReader;
/// use batch_fixtures::item::csv::csv_reader::CsvItemReaderBuilder;
/// use std::io::Write;
///
/// let mut file = tempfile::NamedTempFile::new().unwrap();
/// file.write_all(b"a,b,c\n1,2,3\n").unwrap();
///
/// let reader = CsvItemReaderBuilder::new().from_path(file.path());
/// reader.open(None).unwrap();
///
/// assert_eq!(reader.read().unwrap().unwrap().fields(), &["a", "b", "c"]);
/// assert_eq!(reader.read().unwrap().unwrap().fields(), &["1", "2", "3"]);
/// assert!(reader.read().unwrap().is_none());
/// assert_eq!(reader.checkpoint_info().unwrap().position(), 2);
/// ```
pub mod csv_reader;
