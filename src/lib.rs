//! `csv-transform` is a streaming CSV transformation pipeline.
//!
//! A [`RowPipeline`] reads a delimited text file one row at a time and applies a declared
//! sequence of column renames, value mutations, row constraints and a final column projection.
//! Results are pulled row by row (the pipeline is an [`Iterator`]) or written to another CSV file.
//!
//! ## Processing order
//!
//! Registration calls only record work; nothing runs until a row is pulled. Each pull:
//!
//! 1. reads one record from the source (fields enter as [`Value::Utf8`]),
//! 2. runs every transform (`add`, `add_column`, `mutate`) in registration order,
//! 3. runs every constraint against the mutated row, stopping at the first failure,
//! 4. applies the projection installed by `select`, if any.
//!
//! Column names are validated when an operation is registered, so a typo fails before any
//! row is read. Failures while processing a row come back as [`PipelineError::Transform`]
//! carrying the 1-based row number (skipped rows and the header are counted).
//!
//! ## Quick example
//!
//! ```no_run
//! use csv_transform::{Predicate, RowPipeline, Value};
//!
//! # fn main() -> Result<(), csv_transform::PipelineError> {
//! let mut p = RowPipeline::open("people.csv")?;
//! p.rename([("nm", "name")])?;
//! p.add("source", "import")?;
//! p.mutate(|v| Value::from(v.to_string().trim().to_owned()), "name")?;
//! p.constraint(Predicate::named("not_empty", |v| v.is_truthy()), "name")?;
//! p.select(["name", "source"])?;
//! let written = p.write_to_path("people_clean.csv")?;
//! println!("rows={written}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`pipeline`]: the [`RowPipeline`] driver
//! - [`schema`], [`columns`]: column names, positions and column targeting
//! - [`transform`], [`constraint`], [`projection`]: the three processing stages
//! - [`io`]: CSV source and sink adapters
//! - [`recipe`], [`builtins`]: JSON-declared pipelines
//! - [`observability`]: observer hooks for logging and alerts
//! - [`error`]: error types

pub mod builtins;
pub mod columns;
pub mod constraint;
pub mod error;
pub mod io;
pub mod observability;
pub mod options;
pub mod pipeline;
pub mod projection;
pub mod recipe;
pub mod schema;
pub mod transform;
pub mod types;

pub use columns::ColumnSelection;
pub use constraint::Predicate;
pub use error::{BoxError, ConstraintViolation, PipelineError, PipelineResult, RowError};
pub use observability::{
    CompositeObserver, PipelineContext, PipelineObserver, PipelineSeverity, PipelineStats, StdErrObserver,
    TracingObserver,
};
pub use options::{CsvFormat, PipelineOptions};
pub use pipeline::RowPipeline;
pub use recipe::{Recipe, Step};
pub use schema::Schema;
pub use types::{Row, Value};
