//! The row pipeline driver.
//!
//! A [`RowPipeline`] owns a CSV source whose header row initializes the [`Schema`]. Operations are
//! registered up front and validated immediately; nothing runs until rows are pulled. Each pull
//! reads one record and sends it through the transform chain, the constraint chain and the
//! optional projection, in that order.
//!
//! A pipeline is single-threaded: the source cursor is unsynchronized state, so pulls must not
//! be shared across threads.
//!
//! ## Example
//!
//! ```rust
//! use csv_transform::{Predicate, PipelineOptions, RowPipeline, Value};
//!
//! # fn main() -> Result<(), csv_transform::PipelineError> {
//! let input = "id,name\n1,ada\n2,grace\n";
//! let mut p = RowPipeline::from_reader(input.as_bytes(), &PipelineOptions::default())?;
//! p.add("k", "x")?;
//! p.mutate(|v| Value::from(v.to_string().to_uppercase()), "name")?;
//! p.constraint(Predicate::named("not_empty", |v| v.is_truthy()), "name")?;
//! p.select(["name", "k"])?;
//!
//! let rows = p.collect::<Result<Vec<_>, _>>()?;
//! assert_eq!(rows[0], vec![Value::from("ADA"), Value::from("x")]);
//! # Ok(())
//! # }
//! ```

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use crate::columns::{ColumnSelection, ResolvedColumn};
use crate::constraint::{ConstraintChain, ConstraintOp, Predicate};
use crate::error::{BoxError, PipelineError, PipelineResult, RowError};
use crate::io::{CsvSink, CsvSource};
use crate::observability::{PipelineContext, PipelineObserver, PipelineSeverity, PipelineStats};
use crate::options::{CsvFormat, PipelineOptions};
use crate::projection::Projection;
use crate::schema::Schema;
use crate::transform::{DeriveFn, MutateFn, TransformChain, TransformOp};
use crate::types::{Row, Value};

/// Streaming CSV transformation pipeline.
pub struct RowPipeline<R = File> {
    source: CsvSource<R>,
    format: CsvFormat,
    schema: Schema,
    transforms: TransformChain,
    constraints: ConstraintChain,
    projection: Option<Projection>,
    row_number: usize,
    rows_emitted: usize,
    exhausted: bool,
    context: PipelineContext,
    observer: Option<Arc<dyn PipelineObserver>>,
    alert_at_or_above: PipelineSeverity,
}

impl RowPipeline<File> {
    /// Open `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> PipelineResult<Self> {
        Self::open_with_options(path, &PipelineOptions::default())
    }

    /// Open `path`, discarding `skip_rows` rows before the header.
    pub fn open_skip(path: impl AsRef<Path>, skip_rows: usize) -> PipelineResult<Self> {
        Self::open_with_options(path, &PipelineOptions::skipping(skip_rows))
    }

    /// Open `path` with explicit options.
    ///
    /// Fails with [`PipelineError::Io`] if the file cannot be opened and
    /// [`PipelineError::MissingHeader`] if it ends before the header row.
    pub fn open_with_options(path: impl AsRef<Path>, options: &PipelineOptions) -> PipelineResult<Self> {
        let path = path.as_ref();
        let context = PipelineContext {
            source: path.display().to_string(),
        };
        let result = CsvSource::open(path, &options.format, options.skip_rows)
            .and_then(|source| Self::start(source, context.clone(), options));
        if let Err(e) = &result {
            report(options.observer.as_deref(), options.alert_at_or_above, &context, e);
        }
        result
    }
}

impl<R: Read> RowPipeline<R> {
    /// Build a pipeline over an in-memory or already-open reader.
    pub fn from_reader(reader: R, options: &PipelineOptions) -> PipelineResult<Self> {
        let context = PipelineContext {
            source: "<reader>".to_owned(),
        };
        let source = CsvSource::from_reader(reader, &options.format, options.skip_rows)?;
        Self::start(source, context, options)
    }

    fn start(mut source: CsvSource<R>, context: PipelineContext, options: &PipelineOptions) -> PipelineResult<Self> {
        let skipped = source.skipped();
        if skipped < options.skip_rows {
            return Err(PipelineError::MissingHeader { skipped });
        }
        let header = source
            .next_record()?
            .ok_or(PipelineError::MissingHeader { skipped })?;
        tracing::debug!(
            source = %context.source,
            skipped,
            line = header.line,
            columns = header.fields.len(),
            "pipeline opened"
        );

        Ok(Self {
            source,
            format: options.format,
            schema: Schema::from_names(header.fields),
            transforms: TransformChain::new(),
            constraints: ConstraintChain::new(),
            projection: None,
            row_number: header.line,
            rows_emitted: 0,
            exhausted: false,
            context,
            observer: options.observer.clone(),
            alert_at_or_above: options.alert_at_or_above,
        })
    }

    /// The output schema: the projection's columns if `select` was called, else the working
    /// schema.
    pub fn schema(&self) -> &Schema {
        match &self.projection {
            Some(p) => p.output_schema(),
            None => &self.schema,
        }
    }

    /// The schema rows have before projection. Column names in registrations resolve here.
    pub fn working_schema(&self) -> &Schema {
        &self.schema
    }

    /// 1-based input line of the last consumed record, counting skipped lines, the header and
    /// blank lines.
    pub fn row_number(&self) -> usize {
        self.row_number
    }

    pub fn transforms(&self) -> &TransformChain {
        &self.transforms
    }

    pub fn constraints(&self) -> &ConstraintChain {
        &self.constraints
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    /// Rename columns. Names missing from `mapping` are unchanged; unknown keys are ignored.
    pub fn rename<I, K, V>(&mut self, mapping: I) -> PipelineResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.ensure_unprojected("rename")?;
        self.schema.rename(mapping);
        Ok(())
    }

    /// Append a column holding `value` on every row.
    ///
    /// The name is not checked against existing columns; a duplicate name shadows the earlier
    /// column in later lookups.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Value>) -> PipelineResult<()> {
        self.ensure_unprojected("add")?;
        let name = name.into();
        self.schema.append(name.clone());
        tracing::debug!(column = %name, "registered add");
        self.transforms.push(TransformOp::Append {
            name,
            value: value.into(),
        });
        Ok(())
    }

    /// Append a column computed by `func` from the values of `columns`, passed in order.
    pub fn add_column<F>(
        &mut self,
        name: impl Into<String>,
        func: F,
        columns: impl Into<ColumnSelection>,
    ) -> PipelineResult<()>
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        self.register_derive(name.into(), Box::new(move |args| Ok(func(args))), columns.into())
    }

    /// Like [`Self::add_column`], with a function that may fail.
    pub fn try_add_column<F, E>(
        &mut self,
        name: impl Into<String>,
        func: F,
        columns: impl Into<ColumnSelection>,
    ) -> PipelineResult<()>
    where
        F: Fn(&[Value]) -> Result<Value, E> + 'static,
        E: Into<BoxError>,
    {
        self.register_derive(
            name.into(),
            Box::new(move |args| func(args).map_err(Into::into)),
            columns.into(),
        )
    }

    /// Replace each targeted value with `func(value)`.
    ///
    /// [`ColumnSelection::All`] targets the columns present now, not ones added later. After
    /// `select` it targets only the selected columns.
    pub fn mutate<F>(&mut self, func: F, col: impl Into<ColumnSelection>) -> PipelineResult<()>
    where
        F: Fn(&Value) -> Value + 'static,
    {
        self.register_mutate(Box::new(move |v| Ok(func(v))), col.into())
    }

    /// Like [`Self::mutate`], with a function that may fail.
    pub fn try_mutate<F, E>(&mut self, func: F, col: impl Into<ColumnSelection>) -> PipelineResult<()>
    where
        F: Fn(&Value) -> Result<Value, E> + 'static,
        E: Into<BoxError>,
    {
        self.register_mutate(Box::new(move |v| func(v).map_err(Into::into)), col.into())
    }

    /// Check every targeted value with `predicate` after all transforms have run.
    ///
    /// As with [`Self::mutate`], [`ColumnSelection::All`] after `select` means the selected
    /// columns.
    pub fn constraint(&mut self, predicate: Predicate, col: impl Into<ColumnSelection>) -> PipelineResult<()> {
        let targets = self.resolve_targets(col.into())?;
        tracing::debug!(predicate = predicate.name(), targets = targets.len(), "registered constraint");
        self.constraints.push(ConstraintOp { predicate, targets });
        Ok(())
    }

    /// Emit only `columns`, in the given order. Replaces any earlier projection.
    pub fn select<I, S>(&mut self, columns: I) -> PipelineResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let projection = Projection::new(columns, &self.schema)?;
        tracing::debug!(columns = ?projection.output_schema().names(), "registered select");
        self.projection = Some(projection);
        Ok(())
    }

    fn register_derive(
        &mut self,
        name: String,
        func: DeriveFn,
        columns: ColumnSelection,
    ) -> PipelineResult<()> {
        self.ensure_unprojected("add_column")?;
        if matches!(columns, ColumnSelection::All) {
            return Err(PipelineError::InvalidColumnSpec {
                message: "add_column needs a column name or a list of column names".to_owned(),
            });
        }
        let inputs = columns.resolve(&self.schema)?;
        self.schema.append(name.clone());
        tracing::debug!(column = %name, inputs = inputs.len(), "registered add_column");
        self.transforms.push(TransformOp::Derive { name, inputs, func });
        Ok(())
    }

    fn register_mutate(
        &mut self,
        func: MutateFn,
        col: ColumnSelection,
    ) -> PipelineResult<()> {
        let targets = self.resolve_targets(col)?;
        tracing::debug!(targets = targets.len(), "registered mutate");
        self.transforms.push(TransformOp::Mutate { targets, func });
        Ok(())
    }

    fn resolve_targets(&self, col: ColumnSelection) -> PipelineResult<Vec<ResolvedColumn>> {
        match (&col, &self.projection) {
            (ColumnSelection::All, Some(p)) => Ok(p.columns().to_vec()),
            _ => col.resolve(&self.schema),
        }
    }

    fn ensure_unprojected(&self, operation: &'static str) -> PipelineResult<()> {
        match self.projection {
            Some(_) => Err(PipelineError::SchemaFrozen { operation }),
            None => Ok(()),
        }
    }

    /// Pull the next processed row.
    ///
    /// Returns `Ok(None)` once the input is exhausted, and keeps doing so on later calls.
    /// Row-processing failures come back as [`PipelineError::Transform`] with the row number.
    pub fn next_row(&mut self) -> PipelineResult<Option<Row>> {
        if self.exhausted {
            return Ok(None);
        }
        let record = match self.source.next_record() {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.exhausted = true;
                self.finished();
                return Ok(None);
            }
            Err(e) => {
                self.report(&e);
                return Err(e);
            }
        };
        self.row_number = record.line;

        let raw: Row = record.fields.into_iter().map(Value::Utf8).collect();
        match self.process(raw) {
            Ok(row) => {
                self.rows_emitted += 1;
                if let Some(o) = &self.observer {
                    o.on_row_emitted(&self.context, self.row_number);
                }
                Ok(Some(row))
            }
            Err(source) => {
                let err = PipelineError::Transform {
                    row: self.row_number,
                    source,
                };
                self.report(&err);
                Err(err)
            }
        }
    }

    fn process(&self, raw: Row) -> Result<Row, RowError> {
        let mutated = self.transforms.apply(raw)?;
        self.constraints.check(&mutated, self.row_number)?;
        match &self.projection {
            Some(p) => p.apply(&mutated),
            None => Ok(mutated),
        }
    }

    /// Drain the pipeline into a new file at `path`: header first, then every row.
    ///
    /// The output file is closed before this returns, including on failure. Rows written before
    /// a failure stay in the file. Returns the number of data rows written.
    pub fn write_to_path(&mut self, path: impl AsRef<Path>) -> PipelineResult<usize> {
        let path = path.as_ref();
        let mut sink = match CsvSink::create(path, &self.format) {
            Ok(sink) => sink,
            Err(e) => {
                self.report(&e);
                return Err(e);
            }
        };
        let written = self.write_to_sink(&mut sink)?;
        self.reported(sink.finish())?;
        tracing::debug!(path = %path.display(), rows = written, "pipeline written");
        Ok(written)
    }

    /// Drain the pipeline into `writer` and return it.
    pub fn write_to_writer<W: Write>(&mut self, writer: W) -> PipelineResult<W> {
        let mut sink = CsvSink::from_writer(writer, &self.format);
        self.write_to_sink(&mut sink)?;
        self.reported(sink.finish())
    }

    /// Write the header and then every remaining row to `sink`.
    ///
    /// Sink failures are reported to the observer like row failures. The sink may buffer, so a
    /// write error can also surface only when it is finished.
    pub fn write_to_sink<W: Write>(&mut self, sink: &mut CsvSink<W>) -> PipelineResult<usize> {
        let header = sink.write_header(self.schema().names());
        self.reported(header)?;
        let mut written = 0;
        while let Some(row) = self.next_row()? {
            self.reported(sink.write_row(&row))?;
            written += 1;
        }
        Ok(written)
    }

    /// Release the input handle.
    pub fn close(self) -> R {
        self.source.into_inner()
    }

    fn finished(&self) {
        if let Some(o) = &self.observer {
            o.on_finished(
                &self.context,
                PipelineStats {
                    rows_read: self.row_number,
                    rows_emitted: self.rows_emitted,
                },
            );
        }
    }

    fn report(&self, error: &PipelineError) {
        report(self.observer.as_deref(), self.alert_at_or_above, &self.context, error);
    }

    fn reported<T>(&self, result: PipelineResult<T>) -> PipelineResult<T> {
        if let Err(e) = &result {
            self.report(e);
        }
        result
    }
}

fn report(
    observer: Option<&dyn PipelineObserver>,
    alert_at_or_above: PipelineSeverity,
    ctx: &PipelineContext,
    error: &PipelineError,
) {
    let Some(o) = observer else {
        return;
    };
    let severity = PipelineSeverity::of(error);
    o.on_failure(ctx, severity, error);
    if severity >= alert_at_or_above {
        o.on_alert(ctx, severity, error);
    }
}

impl<R: Read> Iterator for RowPipeline<R> {
    type Item = PipelineResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

impl<R: Read> std::fmt::Debug for RowPipeline<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowPipeline")
            .field("source", &self.context.source)
            .field("schema", &self.schema().names())
            .field("transforms", &self.transforms.len())
            .field("constraints", &self.constraints.len())
            .field("row_number", &self.row_number)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
