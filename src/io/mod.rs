//! Source and sink adapters around the `csv` crate.
//!
//! - [`CsvSource`] yields one record at a time as owned strings and owns the input handle.
//! - [`CsvSink`] writes a header then rows of [`crate::types::Value`]s.
//!
//! Both use a [`crate::CsvFormat`] so output follows the input dialect.

pub mod sink;
pub mod source;

pub use sink::CsvSink;
pub use source::{CsvSource, SourceRecord};
