//! Trait definitions for query builders.

use crate::error::OrmResult;
use crate::qb::Dialect;
use crate::qb::param::ParamList;
use crate::value::Value;

/// Base trait for all query builders.
pub trait SqlQb {
    /// Append this statement to `out`, binding arguments into `params`.
    fn render(&self, params: &mut ParamList, out: &mut String) -> OrmResult<()>;

    /// Render the statement and its arguments for `dialect`.
    fn sql(&self, dialect: Dialect) -> OrmResult<(String, Vec<Value>)> {
        let mut params = ParamList::new(dialect);
        let mut out = String::new();
        self.render(&mut params, &mut out)?;
        Ok((out, params.into_values()))
    }

    /// PostgreSQL text only, for debugging and tests. Render errors yield an empty string.
    fn to_sql(&self) -> String {
        self.sql(Dialect::Postgres)
            .map(|(sql, _)| sql)
            .unwrap_or_default()
    }
}
