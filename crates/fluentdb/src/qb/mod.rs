//! Dialect-aware SQL rendering for structured clause objects.
//!
//! The builders here never talk to a database. They turn clause state into
//! `(sql, args)` pairs that an [`Executor`](crate::Executor) runs.
//!
//! ```ignore
//! use fluentdb::qb;
//! use fluentdb::{Condition, Dialect, WhereOpt};
//!
//! let (sql, args) = qb::select_from("users")
//!     .and_where(Condition::new("age", WhereOpt::GrEq, 18))
//!     .sql(Dialect::Postgres)?;
//! assert_eq!(sql, "SELECT * FROM users WHERE age >= $1");
//! ```

mod delete;
mod expr;
mod insert;
mod param;
mod select;
mod traits;
mod update;

pub use delete::DeleteQb;
pub use insert::InsertQb;
pub use param::ParamList;
pub use select::SelectQb;
pub use traits::SqlQb;
pub use update::UpdateQb;

/// SQL family: decides placeholder syntax, pagination and insert-id retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `$1, $2, ...`; generated keys come back through `RETURNING`.
    #[default]
    Postgres,
    /// `?`; generated keys come back through the connection's last insert id.
    MySql,
}

impl Dialect {
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::MySql => "?".to_string(),
        }
    }

    pub fn supports_returning(self) -> bool {
        matches!(self, Dialect::Postgres)
    }
}

/// Start a SELECT over `table`.
pub fn select_from(table: &str) -> SelectQb {
    SelectQb::new(table)
}

/// Start an INSERT into `table`.
pub fn insert_into(table: &str) -> InsertQb {
    InsertQb::new(table)
}

/// Start an UPDATE of `table`.
pub fn update(table: &str) -> UpdateQb {
    UpdateQb::new(table)
}

/// Start a DELETE from `table`.
pub fn delete_from(table: &str) -> DeleteQb {
    DeleteQb::new(table)
}

#[cfg(test)]
mod tests;
