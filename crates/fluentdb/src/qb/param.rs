//! Bind parameter collection with dialect-specific placeholders.

use crate::qb::Dialect;
use crate::value::Value;

/// Arguments collected while rendering, in placeholder order.
#[derive(Clone, Debug, Default)]
pub struct ParamList {
    dialect: Dialect,
    values: Vec<Value>,
}

impl ParamList {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            values: Vec::new(),
        }
    }

    /// Add a value and return its placeholder text.
    pub fn push(&mut self, value: Value) -> String {
        self.values.push(value);
        self.dialect.placeholder(self.values.len())
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
