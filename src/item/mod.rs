#[cfg(feature = "logger")]
/// This module provides a logger item writer, useful for debugging purposes.
pub mod logger;

#[cfg(feature = "csv")]
/// This module provides a CSV item reader backed by an in-memory row buffer.
pub mod csv;
