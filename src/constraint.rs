//! Constraint chain: ordered row validation, run after all transforms.
//!
//! Checks are fail-fast. The first falsy predicate stops the row with a
//! [`ConstraintViolation`] naming the column, the value, the predicate and the row number.

use std::fmt;

use crate::columns::ResolvedColumn;
use crate::error::{ConstraintViolation, RowError};
use crate::transform::field;
use crate::types::Value;

/// A named boolean check over a single value.
pub struct Predicate {
    name: String,
    func: Box<dyn Fn(&Value) -> bool>,
}

impl Predicate {
    /// Wrap `func`, naming it after the function's own path.
    ///
    /// A `fn is_even(..)` item is named `is_even`; closures are named `{{closure}}`.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        Self {
            name: short_type_name::<F>().to_owned(),
            func: Box::new(func),
        }
    }

    /// Wrap `func` under an explicit display name.
    pub fn named<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn test(&self, value: &Value) -> bool {
        (self.func)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").field("name", &self.name).finish_non_exhaustive()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// A predicate bound to the columns it checks.
#[derive(Debug)]
pub struct ConstraintOp {
    pub predicate: Predicate,
    pub targets: Vec<ResolvedColumn>,
}

impl ConstraintOp {
    /// Check each target column in order; stop at the first failure.
    pub fn check(&self, row: &[Value], row_number: usize) -> Result<(), RowError> {
        for target in &self.targets {
            let value = field(row, target)?;
            if !self.predicate.test(value) {
                return Err(ConstraintViolation {
                    column: target.name.clone(),
                    value: value.clone(),
                    predicate: self.predicate.name().to_owned(),
                    row: row_number,
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Ordered, append-only list of [`ConstraintOp`]s.
#[derive(Debug, Default)]
pub struct ConstraintChain {
    ops: Vec<ConstraintOp>,
}

impl ConstraintChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: ConstraintOp) {
        self.ops.push(op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstraintOp> {
        self.ops.iter()
    }

    /// Run every constraint in registration order.
    pub fn check(&self, row: &[Value], row_number: usize) -> Result<(), RowError> {
        self.ops.iter().try_for_each(|op| op.check(row, row_number))
    }
}
