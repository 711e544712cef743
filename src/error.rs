use thiserror::Error;

use crate::types::Value;

/// Convenience result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type user functions may return from fallible mutations and derivations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type returned by pipeline construction, registration, pulls and writes.
///
/// Registration-time problems ([`PipelineError::UnknownColumn`],
/// [`PipelineError::InvalidColumnSpec`], [`PipelineError::SchemaFrozen`]) are returned by the
/// registering call itself. Anything that goes wrong while a row is processed is wrapped in
/// [`PipelineError::Transform`] together with the row number.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Recipe JSON could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input ended before a header row could be read.
    #[error("input has no header row after skipping {skipped} row(s)")]
    MissingHeader { skipped: usize },

    /// A column name does not resolve in the current schema.
    #[error("The column '{column}' does not exist")]
    UnknownColumn { column: String },

    /// A column parameter has the wrong shape (must be absent, a name, or a list of names).
    #[error("invalid column specification: {message}")]
    InvalidColumnSpec { message: String },

    /// A schema-changing operation was registered after a projection was installed.
    #[error("cannot {operation} after select: the output schema is fixed by the projection")]
    SchemaFrozen { operation: &'static str },

    /// A recipe step is malformed or names an unknown builtin.
    #[error("invalid recipe: {message}")]
    InvalidRecipe { message: String },

    /// Processing a row failed.
    #[error("on csv row {row} with error: {source}")]
    Transform {
        row: usize,
        #[source]
        source: RowError,
    },
}

impl PipelineError {
    /// Returns the constraint violation if this is a wrapped constraint failure.
    pub fn constraint_violation(&self) -> Option<&ConstraintViolation> {
        match self {
            PipelineError::Transform {
                source: RowError::Constraint(v),
                ..
            } => Some(v),
            _ => None,
        }
    }

    /// Returns the row number for row-processing failures.
    pub fn row(&self) -> Option<usize> {
        match self {
            PipelineError::Transform { row, .. } => Some(*row),
            _ => None,
        }
    }
}

/// The cause of a row-processing failure.
#[derive(Debug, Error)]
pub enum RowError {
    /// A constraint predicate rejected a value.
    #[error(transparent)]
    Constraint(#[from] ConstraintViolation),

    /// A user-supplied mutation or derivation function failed.
    #[error("function applied to column '{column}' failed: {source}")]
    Function {
        column: String,
        #[source]
        source: BoxError,
    },

    /// The row is narrower than the schema expects.
    #[error("column '{column}' is at index {index} but the row has only {width} field(s)")]
    MissingField {
        column: String,
        index: usize,
        width: usize,
    },
}

/// A value failed a registered constraint.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{column} value {value} does not satisfy the constraint {predicate} on row {row}")]
pub struct ConstraintViolation {
    /// Name of the checked column.
    pub column: String,
    /// The offending value.
    pub value: Value,
    /// Display name of the predicate.
    pub predicate: String,
    /// Row number (1-based, counting skipped rows and the header).
    pub row: usize,
}
