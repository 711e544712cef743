//! CSV sink adapter.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::options::CsvFormat;
use crate::types::Value;

/// Writes a header and rows to a CSV output. Quoting is handled by the `csv` writer.
#[derive(Debug)]
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    /// Create (or truncate) `path` for writing.
    pub fn create(path: impl AsRef<Path>, format: &CsvFormat) -> PipelineResult<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(file, format))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(writer: W, format: &CsvFormat) -> Self {
        let writer = csv::WriterBuilder::new()
            .flexible(true)
            .delimiter(format.delimiter)
            .quote(format.quote)
            .from_writer(writer);
        Self { writer }
    }

    pub fn write_header<S: AsRef<str>>(&mut self, names: &[S]) -> PipelineResult<()> {
        self.writer.write_record(names.iter().map(|n| n.as_ref()))?;
        Ok(())
    }

    pub fn write_row(&mut self, row: &[Value]) -> PipelineResult<()> {
        self.writer.write_record(row.iter().map(Value::to_string))?;
        Ok(())
    }

    /// Flush buffered output and return the underlying writer.
    pub fn finish(self) -> PipelineResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| PipelineError::Io(e.into_error()))
    }
}
