//! # Batchlet Module
//!
//! Batchlet implementations. A batchlet is a single-invocation unit of work
//! that does not follow the chunk-oriented reader/processor/writer pattern.

pub mod test_name;
