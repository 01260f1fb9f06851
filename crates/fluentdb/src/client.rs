//! Connection traits the builder executes through.
//!
//! [`Executor`] is implemented by pooled connections and by transactions, so
//! every CRUD operation runs the same way with or without a transaction
//! attached. [`Connection`] adds the dialect and the ability to begin a
//! [`Transaction`].

use crate::error::{OrmError, OrmResult};
use crate::qb::Dialect;
use crate::value::{FieldType, Value};
use std::future::Future;

/// One result row: column names and their decoded values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Record {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Build a record from `(column, value)` pairs.
    pub fn from_pairs<I, S, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let (columns, values) = pairs
            .into_iter()
            .map(|(c, v)| (c.into(), v.into()))
            .unzip();
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the named column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Decode the named column.
    pub fn try_get<T: FieldType>(&self, column: &str) -> OrmResult<T> {
        let value = self
            .get(column)
            .cloned()
            .ok_or_else(|| OrmError::conversion(column, "column not present in row"))?;
        T::from_value(value).map_err(|e| e.in_field(column))
    }

    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn into_iter_pairs(self) -> impl Iterator<Item = (String, Value)> {
        self.columns.into_iter().zip(self.values)
    }
}

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Generated key reported by the driver (MySQL); `None` elsewhere.
    pub last_insert_id: Option<u64>,
}

/// Runs SQL text with positional [`Value`] arguments.
pub trait Executor: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = OrmResult<Vec<Record>>> + Send;

    /// Execute a statement and report affected rows.
    fn execute(&self, sql: &str, args: &[Value]) -> impl Future<Output = OrmResult<ExecResult>> + Send;
}

/// A transaction bound to one physical connection.
pub trait Transaction: Executor + Sized {
    fn commit(self) -> impl Future<Output = OrmResult<()>> + Send;

    fn rollback(self) -> impl Future<Output = OrmResult<()>> + Send;
}

/// A shareable handle to a database (typically a pool).
pub trait Connection: Executor + Clone + 'static {
    type Tx: Transaction + 'static;

    fn dialect(&self) -> Dialect;

    /// Start a transaction on a dedicated connection.
    fn begin(&self) -> impl Future<Output = OrmResult<Self::Tx>> + Send;
}
