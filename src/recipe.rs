//! Declarative pipelines loaded from JSON.
//!
//! A recipe lists the same operations the [`RowPipeline`] API offers, with functions and
//! predicates referenced by name (see [`crate::builtins`]):
//!
//! ```json
//! {
//!   "skip_rows": 0,
//!   "format": { "delimiter": ",", "quote": "\"", "trim": false },
//!   "steps": [
//!     { "op": "rename", "mapping": { "nm": "name" } },
//!     { "op": "add", "name": "k", "value": "x" },
//!     { "op": "mutate", "function": "upper", "col": "name" },
//!     { "op": "constraint", "predicate": "not_empty", "col": ["name"] },
//!     { "op": "select", "columns": ["name", "k"] }
//!   ]
//! }
//! ```
//!
//! `col` may be omitted or `null` (all columns), a column name, or a list of names. Any other
//! shape fails with [`PipelineError::InvalidColumnSpec`].

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::builtins;
use crate::columns::ColumnSelection;
use crate::error::{PipelineError, PipelineResult};
use crate::options::{CsvFormat, PipelineOptions};
use crate::pipeline::RowPipeline;
use crate::types::Value;

/// A declarative pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Rows to skip before the header.
    #[serde(default)]
    pub skip_rows: usize,
    #[serde(default)]
    pub format: RecipeFormat,
    pub steps: Vec<Step>,
}

/// CSV dialect as written in a recipe. Characters must be ASCII.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeFormat {
    pub delimiter: char,
    pub quote: char,
    pub trim: bool,
}

impl Default for RecipeFormat {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            trim: false,
        }
    }
}

/// One registration step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Rename {
        mapping: BTreeMap<String, String>,
    },
    Add {
        name: String,
        value: serde_json::Value,
    },
    AddColumn {
        name: String,
        function: String,
        columns: serde_json::Value,
    },
    Mutate {
        function: String,
        #[serde(default)]
        col: serde_json::Value,
    },
    Constraint {
        predicate: String,
        #[serde(default)]
        col: serde_json::Value,
    },
    Select {
        columns: serde_json::Value,
    },
}

impl Recipe {
    /// Parse a recipe from JSON text.
    pub fn from_json(text: &str) -> PipelineResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a recipe file.
    pub fn from_path(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Pipeline options derived from the recipe header.
    pub fn options(&self) -> PipelineResult<PipelineOptions> {
        Ok(PipelineOptions {
            skip_rows: self.skip_rows,
            format: CsvFormat {
                delimiter: ascii_byte("delimiter", self.format.delimiter)?,
                quote: ascii_byte("quote", self.format.quote)?,
                trim: self.format.trim,
            },
            ..Default::default()
        })
    }

    /// Register every step on `pipeline`, in order. Stops at the first failing step.
    pub fn apply<R: Read>(&self, pipeline: &mut RowPipeline<R>) -> PipelineResult<()> {
        for step in &self.steps {
            step.apply(pipeline)?;
        }
        tracing::debug!(steps = self.steps.len(), "recipe applied");
        Ok(())
    }

    /// Open `input`, apply the recipe and write the result to `output`.
    ///
    /// `options` supplies the observer and alert threshold; reading options come from the recipe.
    pub fn run(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        options: &PipelineOptions,
    ) -> PipelineResult<usize> {
        let options = PipelineOptions {
            observer: options.observer.clone(),
            alert_at_or_above: options.alert_at_or_above,
            ..self.options()?
        };
        let mut pipeline = RowPipeline::open_with_options(input, &options)?;
        self.apply(&mut pipeline)?;
        pipeline.write_to_path(output)
    }
}

impl Step {
    /// Register this step on `pipeline`.
    pub fn apply<R: Read>(&self, pipeline: &mut RowPipeline<R>) -> PipelineResult<()> {
        match self {
            Step::Rename { mapping } => pipeline.rename(mapping.clone()),
            Step::Add { name, value } => pipeline.add(name.clone(), json_to_value(value)?),
            Step::AddColumn {
                name,
                function,
                columns,
            } => {
                let func = builtins::derivation(function).ok_or_else(|| unknown("function", function))?;
                let columns = ColumnSelection::names_from_json(columns)?;
                pipeline.try_add_column(name.clone(), func, columns)
            }
            Step::Mutate { function, col } => {
                let func = builtins::mutation(function).ok_or_else(|| unknown("function", function))?;
                pipeline.try_mutate(func, ColumnSelection::from_json(col)?)
            }
            Step::Constraint { predicate, col } => {
                let predicate =
                    builtins::predicate(predicate).ok_or_else(|| unknown("predicate", predicate))?;
                pipeline.constraint(predicate, ColumnSelection::from_json(col)?)
            }
            Step::Select { columns } => pipeline.select(ColumnSelection::names_from_json(columns)?),
        }
    }
}

fn unknown(kind: &str, name: &str) -> PipelineError {
    PipelineError::InvalidRecipe {
        message: format!("unknown {kind} '{name}'"),
    }
}

fn ascii_byte(field: &str, c: char) -> PipelineResult<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(PipelineError::InvalidRecipe {
            message: format!("{field} must be an ASCII character, got '{c}'"),
        })
    }
}

fn json_to_value(value: &serde_json::Value) -> PipelineResult<Value> {
    match value {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::String(s) => Ok(Value::Utf8(s.clone())),
        serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(Value::Int64(i)),
            (None, Some(f)) => Ok(Value::Float64(f)),
            (None, None) => Err(PipelineError::InvalidRecipe {
                message: format!("number {n} is out of range"),
            }),
        },
        other => Err(PipelineError::InvalidRecipe {
            message: format!("add value must be a scalar, got {other}"),
        }),
    }
}
