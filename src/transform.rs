//! Transform chain: ordered row mutations.
//!
//! Each registered operation is stored as a [`TransformOp`] value holding the indices it resolved
//! at registration plus the user function. The chain is append-only and runs top to bottom on
//! every pulled row.

use std::fmt;

use crate::columns::ResolvedColumn;
use crate::error::{BoxError, RowError};
use crate::types::{Row, Value};

/// Function applied to a single field by [`TransformOp::Mutate`].
pub type MutateFn = Box<dyn Fn(&Value) -> Result<Value, BoxError>>;

/// Function producing a new field from several inputs, used by [`TransformOp::Derive`].
pub type DeriveFn = Box<dyn Fn(&[Value]) -> Result<Value, BoxError>>;

/// A single registered row mutation.
pub enum TransformOp {
    /// Append a constant value.
    Append { name: String, value: Value },
    /// Append the result of `func` called with the values of `inputs`, in order.
    Derive {
        name: String,
        inputs: Vec<ResolvedColumn>,
        func: DeriveFn,
    },
    /// Replace each target field with `func(field)`, in target order.
    Mutate {
        targets: Vec<ResolvedColumn>,
        func: MutateFn,
    },
}

impl TransformOp {
    /// Short name of the operation kind.
    pub fn kind(&self) -> &'static str {
        match self {
            TransformOp::Append { .. } => "add",
            TransformOp::Derive { .. } => "add_column",
            TransformOp::Mutate { .. } => "mutate",
        }
    }

    /// Columns read by this operation.
    pub fn inputs(&self) -> &[ResolvedColumn] {
        match self {
            TransformOp::Append { .. } => &[],
            TransformOp::Derive { inputs, .. } => inputs,
            TransformOp::Mutate { targets, .. } => targets,
        }
    }

    /// Apply this operation to an owned row.
    pub fn apply(&self, mut row: Row) -> Result<Row, RowError> {
        match self {
            TransformOp::Append { value, .. } => {
                row.push(value.clone());
            }
            TransformOp::Derive { name, inputs, func } => {
                let args = inputs
                    .iter()
                    .map(|c| field(&row, c).cloned())
                    .collect::<Result<Vec<_>, _>>()?;
                let value = func(&args).map_err(|source| RowError::Function {
                    column: name.clone(),
                    source,
                })?;
                row.push(value);
            }
            TransformOp::Mutate { targets, func } => {
                for target in targets {
                    let value = func(field(&row, target)?).map_err(|source| RowError::Function {
                        column: target.name.clone(),
                        source,
                    })?;
                    row[target.index] = value;
                }
            }
        }
        Ok(row)
    }
}

impl fmt::Debug for TransformOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformOp::Append { name, value } => f
                .debug_struct("Append")
                .field("name", name)
                .field("value", value)
                .finish(),
            TransformOp::Derive { name, inputs, .. } => f
                .debug_struct("Derive")
                .field("name", name)
                .field("inputs", inputs)
                .finish_non_exhaustive(),
            TransformOp::Mutate { targets, .. } => f
                .debug_struct("Mutate")
                .field("targets", targets)
                .finish_non_exhaustive(),
        }
    }
}

pub(crate) fn field<'a>(row: &'a [Value], column: &ResolvedColumn) -> Result<&'a Value, RowError> {
    row.get(column.index).ok_or_else(|| RowError::MissingField {
        column: column.name.clone(),
        index: column.index,
        width: row.len(),
    })
}

/// Ordered, append-only list of [`TransformOp`]s.
#[derive(Debug, Default)]
pub struct TransformChain {
    ops: Vec<TransformOp>,
}

impl TransformChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: TransformOp) {
        self.ops.push(op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransformOp> {
        self.ops.iter()
    }

    /// Thread `row` through every operation in registration order.
    pub fn apply(&self, row: Row) -> Result<Row, RowError> {
        self.ops.iter().try_fold(row, |row, op| op.apply(row))
    }
}
