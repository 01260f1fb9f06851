//! INSERT query builder.

use crate::error::OrmResult;
use crate::qb::Dialect;
use crate::qb::param::ParamList;
use crate::qb::traits::SqlQb;
use crate::value::Value;

/// Single-row INSERT builder.
#[derive(Clone, Debug)]
pub struct InsertQb {
    table: String,
    columns: Vec<String>,
    values: Vec<Value>,
    /// RETURNING column (PostgreSQL only)
    returning: Option<String>,
}

impl InsertQb {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            values: Vec::new(),
            returning: None,
        }
    }

    /// Add a column/value pair.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.columns.push(column.to_string());
        self.values.push(value.into());
        self
    }

    /// Add `RETURNING column`. Ignored by dialects without RETURNING.
    pub fn returning(mut self, column: &str) -> Self {
        self.returning = Some(column.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl SqlQb for InsertQb {
    fn render(&self, params: &mut ParamList, out: &mut String) -> OrmResult<()> {
        out.push_str(&format!("INSERT INTO {}", self.table));

        if self.columns.is_empty() {
            match params.dialect() {
                Dialect::Postgres => out.push_str(" DEFAULT VALUES"),
                Dialect::MySql => out.push_str(" () VALUES ()"),
            }
        } else {
            let placeholders: Vec<String> =
                self.values.iter().map(|v| params.push(v.clone())).collect();
            out.push_str(&format!(
                " ({}) VALUES ({})",
                self.columns.join(", "),
                placeholders.join(", ")
            ));
        }

        if let Some(column) = &self.returning {
            if params.dialect().supports_returning() {
                out.push_str(&format!(" RETURNING {column}"));
            }
        }
        Ok(())
    }
}
