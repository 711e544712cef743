//! CSV source adapter.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::PipelineResult;
use crate::options::CsvFormat;

/// One record pulled from a [`CsvSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    /// 1-based input line the record starts on, counting skipped lines.
    pub line: usize,
    pub fields: Vec<String>,
}

/// Pulls raw records from a CSV input.
///
/// Leading lines are skipped as physical lines, blank ones included, before CSV parsing starts.
/// After that, blank lines are not returned as records but still count toward
/// [`SourceRecord::line`]. Headers are not interpreted here: the header row is just the first
/// record. Records may have differing widths.
#[derive(Debug)]
pub struct CsvSource<R> {
    reader: csv::Reader<BufReader<R>>,
    record: csv::StringRecord,
    skipped: usize,
}

impl CsvSource<File> {
    /// Open `path` for reading, skipping `skip_lines` leading lines.
    pub fn open(path: impl AsRef<Path>, format: &CsvFormat, skip_lines: usize) -> PipelineResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, format, skip_lines)
    }
}

impl<R: Read> CsvSource<R> {
    /// Wrap an existing reader, skipping `skip_lines` leading lines.
    ///
    /// Input shorter than `skip_lines` is not an error here; check [`Self::skipped`].
    pub fn from_reader(reader: R, format: &CsvFormat, skip_lines: usize) -> PipelineResult<Self> {
        let mut input = BufReader::new(reader);
        let mut line = Vec::new();
        let mut skipped = 0;
        while skipped < skip_lines {
            line.clear();
            if input.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            skipped += 1;
        }
        Ok(Self {
            reader: builder(format).from_reader(input),
            record: csv::StringRecord::new(),
            skipped,
        })
    }

    /// Number of lines actually skipped at construction.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Read the next record, or `None` at end of input.
    ///
    /// Calling again after the end keeps returning `None`.
    pub fn next_record(&mut self) -> PipelineResult<Option<SourceRecord>> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(None);
        }
        let line = self
            .record
            .position()
            .map_or(0, |pos| pos.line() as usize);
        Ok(Some(SourceRecord {
            line: self.skipped + line,
            fields: self.record.iter().map(str::to_owned).collect(),
        }))
    }

    /// Release the reader and return the underlying handle.
    pub fn into_inner(self) -> R {
        self.reader.into_inner().into_inner()
    }
}

fn builder(format: &CsvFormat) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .delimiter(format.delimiter)
        .quote(format.quote)
        .trim(if format.trim {
            csv::Trim::Fields
        } else {
            csv::Trim::None
        });
    builder
}
