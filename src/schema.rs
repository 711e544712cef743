//! Schema registry: ordered column names plus a name → position index.
//!
//! Duplicate names are allowed. The index is rebuilt in column order, so a duplicated name
//! resolves to its rightmost position.

use std::collections::HashMap;

use crate::error::{PipelineError, PipelineResult};

/// Ordered column names and their positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Create a schema from an ordered list of column names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut schema = Self {
            names: names.into_iter().map(Into::into).collect(),
            index: HashMap::new(),
        };
        schema.rebuild_index();
        schema
    }

    /// Column names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the index of a column by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Returns the index of a column, or [`PipelineError::UnknownColumn`].
    pub fn resolve(&self, name: &str) -> PipelineResult<usize> {
        self.index_of(name).ok_or_else(|| PipelineError::UnknownColumn {
            column: name.to_owned(),
        })
    }

    /// Replace every column name found as a key in `mapping` with its value.
    ///
    /// Keys that match no current column are ignored.
    pub fn rename<I, K, V>(&mut self, mapping: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mapping: HashMap<String, String> = mapping
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        for name in &mut self.names {
            if let Some(new_name) = mapping.get(name.as_str()) {
                *name = new_name.clone();
            }
        }
        self.rebuild_index();
    }

    /// Append a column name and return its index.
    pub fn append(&mut self, name: impl Into<String>) -> usize {
        let name = name.into();
        let idx = self.names.len();
        self.index.insert(name.clone(), idx);
        self.names.push(name);
        idx
    }

    /// Install an entirely new name sequence, discarding the previous index.
    pub fn replace_with<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (idx, name) in self.names.iter().enumerate() {
            self.index.insert(name.clone(), idx);
        }
    }
}
