//! Column targeting for mutations and constraints.
//!
//! Operations that act on "some columns" take a [`ColumnSelection`]. It is resolved once, at
//! registration, into a list of [`ResolvedColumn`]s. [`ColumnSelection::All`] snapshots the
//! columns present at that moment; columns added later are not included.

use crate::error::{PipelineError, PipelineResult};
use crate::schema::Schema;

/// Which columns an operation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelection {
    /// Every column in the schema at registration time.
    All,
    /// A single named column.
    Single(String),
    /// An ordered list of named columns.
    Set(Vec<String>),
}

/// A column name paired with the index it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub name: String,
    pub index: usize,
}

impl ColumnSelection {
    /// Resolve the selection against `schema`.
    ///
    /// Fails with [`PipelineError::UnknownColumn`] on the first name that does not resolve.
    pub fn resolve(&self, schema: &Schema) -> PipelineResult<Vec<ResolvedColumn>> {
        let names: &[String] = match self {
            ColumnSelection::All => schema.names(),
            ColumnSelection::Single(name) => std::slice::from_ref(name),
            ColumnSelection::Set(names) => names,
        };
        names
            .iter()
            .map(|name| {
                schema.resolve(name).map(|index| ResolvedColumn {
                    name: name.clone(),
                    index,
                })
            })
            .collect()
    }

    /// Parse a selection from a JSON value.
    ///
    /// `null` selects all columns, a string selects one column and an array of strings selects
    /// several. Any other shape is an [`PipelineError::InvalidColumnSpec`].
    pub fn from_json(value: &serde_json::Value) -> PipelineResult<Self> {
        match value {
            serde_json::Value::Null => Ok(ColumnSelection::All),
            serde_json::Value::String(s) => Ok(ColumnSelection::Single(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => Ok(s.clone()),
                    other => Err(PipelineError::InvalidColumnSpec {
                        message: format!("column names must be strings, got {other}"),
                    }),
                })
                .collect::<PipelineResult<Vec<_>>>()
                .map(ColumnSelection::Set),
            other => Err(PipelineError::InvalidColumnSpec {
                message: format!("expected null, a string or a list of strings, got {other}"),
            }),
        }
    }

    /// Like [`Self::from_json`] but rejects `null`, for parameters that require explicit names.
    pub fn names_from_json(value: &serde_json::Value) -> PipelineResult<Vec<String>> {
        match Self::from_json(value)? {
            ColumnSelection::All => Err(PipelineError::InvalidColumnSpec {
                message: "expected a string or a list of strings, got null".to_owned(),
            }),
            ColumnSelection::Single(name) => Ok(vec![name]),
            ColumnSelection::Set(names) => Ok(names),
        }
    }
}

impl From<&str> for ColumnSelection {
    fn from(name: &str) -> Self {
        ColumnSelection::Single(name.to_owned())
    }
}

impl From<String> for ColumnSelection {
    fn from(name: String) -> Self {
        ColumnSelection::Single(name)
    }
}

impl From<&String> for ColumnSelection {
    fn from(name: &String) -> Self {
        ColumnSelection::Single(name.clone())
    }
}

impl<S: Into<String>> From<Vec<S>> for ColumnSelection {
    fn from(names: Vec<S>) -> Self {
        ColumnSelection::Set(names.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for ColumnSelection {
    fn from(names: [S; N]) -> Self {
        ColumnSelection::Set(names.into_iter().map(Into::into).collect())
    }
}
