//! Projection stage: the final reorder/subset step.

use crate::columns::ResolvedColumn;
use crate::error::{PipelineResult, RowError};
use crate::schema::Schema;
use crate::transform::field;
use crate::types::{Row, Value};

/// Rebuilds each row from the listed columns, in the given order.
///
/// Duplicates are kept: selecting `["a", "a"]` emits the `a` field twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    columns: Vec<ResolvedColumn>,
    schema: Schema,
}

impl Projection {
    /// Resolve `names` against the pre-projection schema.
    pub fn new<I, S>(names: I, schema: &Schema) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns = names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                schema.resolve(name).map(|index| ResolvedColumn {
                    name: name.to_owned(),
                    index,
                })
            })
            .collect::<PipelineResult<Vec<_>>>()?;
        let mut output = schema.clone();
        output.replace_with(columns.iter().map(|c| c.name.as_str()));
        Ok(Self {
            columns,
            schema: output,
        })
    }

    pub fn columns(&self) -> &[ResolvedColumn] {
        &self.columns
    }

    /// The output schema: the selected names verbatim.
    pub fn output_schema(&self) -> &Schema {
        &self.schema
    }

    pub fn apply(&self, row: &[Value]) -> Result<Row, RowError> {
        self.columns
            .iter()
            .map(|c| field(row, c).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Projection;
    use crate::error::PipelineError;
    use crate::schema::Schema;
    use crate::types::Value;

    #[test]
    fn swaps_two_columns() {
        let schema = Schema::from_names(["c1", "c2"]);
        let p = Projection::new(["c2", "c1"], &schema).unwrap();
        let out = p.apply(&[Value::Int64(1), Value::Int64(2)]).unwrap();
        assert_eq!(out, vec![Value::Int64(2), Value::Int64(1)]);
        assert_eq!(p.output_schema().names(), ["c2", "c1"]);
    }

    #[test]
    fn keeps_duplicates_and_subsets() {
        let schema = Schema::from_names(["a", "b", "c"]);
        let p = Projection::new(["c", "c"], &schema).unwrap();
        let out = p
            .apply(&[Value::from("1"), Value::from("2"), Value::from("3")])
            .unwrap();
        assert_eq!(out, vec![Value::from("3"), Value::from("3")]);
        assert_eq!(p.output_schema().names(), ["c", "c"]);
    }

    #[test]
    fn output_schema_resolves_selected_names_only() {
        let schema = Schema::from_names(["a", "b", "c"]);
        let p = Projection::new(["c", "a"], &schema).unwrap();
        let out = p.output_schema();
        assert_eq!(out.index_of("c"), Some(0));
        assert_eq!(out.index_of("a"), Some(1));
        assert_eq!(out.index_of("b"), None);
        assert_eq!(schema.index_of("b"), Some(1));
    }

    #[test]
    fn unknown_column_fails() {
        let schema = Schema::from_names(["a"]);
        let err = Projection::new(["a", "nope"], &schema).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownColumn { column } if column == "nope"));
    }
}
