//! The fluent statement accumulator and its CRUD executors.
//!
//! A [`DbModel`] collects clause state through chained `&mut self` setters.
//! One terminal operation ([`get`](DbModel::get), [`find`](DbModel::find),
//! [`create`](DbModel::create), [`update`](DbModel::update),
//! [`delete`](DbModel::delete)) consumes that state and resets the builder,
//! whether it succeeds or not.
//!
//! ```ignore
//! use fluentdb::{DbModel, OrderByDir, WhereOpt};
//!
//! let mut db = DbModel::new(conn);
//! let (users, total) = db
//!     .and_where("age", WhereOpt::GrEq, 18)
//!     .order_by("name", OrderByDir::Asc)
//!     .limit(10, 0)
//!     .find::<User>()
//!     .await?;
//! ```

mod create;
mod delete;
mod find;
mod get;
mod update;


pub use create::Creatable;
pub use get::GetOne;
pub use update::Updatable;

use crate::client::{Connection, ExecResult, Executor, Record};
use crate::condition::{
    AndOr, Condition, Fetch, JoinItem, JoinType, Limit, Operand, OrderByDir, SortItem,
    WhereBuilder, WhereOpt,
};
use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::qb::{Dialect, SelectQb};
use crate::reflect::Table;
use crate::trace::SqlTracer;
use crate::value::{FieldType, Value};
use std::collections::BTreeMap;

/// Column or field name to value, for map-based create and update.
pub type ValueMap = BTreeMap<String, Value>;

/// Alias of the subquery wrapped by count queries.
const COUNT_ALIAS: &str = "_result_out_";

#[derive(Debug, Clone)]
struct RawQuery {
    sql: String,
    args: Vec<Value>,
}

/// Chainable query state bound to a connection.
pub struct DbModel<C: Connection> {
    conn: C,
    pub(crate) tx: Option<C::Tx>,
    model: Option<Box<dyn Model>>,
    raw: Option<RawQuery>,
    select_columns: Vec<String>,
    omit_columns: Vec<String>,
    conditions: Vec<Condition>,
    joins: Vec<JoinItem>,
    group_by: Vec<String>,
    having: Vec<Condition>,
    order_by: Vec<SortItem>,
    limit: Limit,
    fetch: Fetch,
    tracer: Option<SqlTracer>,
}

impl<C: Connection> DbModel<C> {
    /// A fresh builder on `conn`. SQL tracing is on when `DB_DEBUG` is true.
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            tx: None,
            model: None,
            raw: None,
            select_columns: Vec::new(),
            omit_columns: Vec::new(),
            conditions: Vec::new(),
            joins: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            limit: Limit::default(),
            fetch: Fetch::default(),
            tracer: crate::config::debug_from_env().then(SqlTracer::default),
        }
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn dialect(&self) -> Dialect {
        self.conn.dialect()
    }

    /// Replace the SQL tracer. Survives [`reset`](Self::reset).
    pub fn set_tracer(&mut self, tracer: Option<SqlTracer>) -> &mut Self {
        self.tracer = tracer;
        self
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// Run `sql` verbatim on the next terminal operation, ignoring builder state.
    pub fn raw(&mut self, sql: impl Into<String>, args: Vec<Value>) -> &mut Self {
        self.raw = Some(RawQuery {
            sql: sql.into(),
            args,
        });
        self
    }

    /// Columns to SELECT, and the only columns written by create and update.
    pub fn select(&mut self, columns: &[&str]) -> &mut Self {
        self.select_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Columns excluded from create, update and implicit SELECT lists.
    pub fn omit(&mut self, columns: &[&str]) -> &mut Self {
        self.omit_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Register the target model for map-based create and update.
    pub fn model(&mut self, model: impl Model + 'static) -> &mut Self {
        self.model = Some(Box::new(model));
        self
    }

    pub fn and_where(
        &mut self,
        field: impl Into<String>,
        opt: WhereOpt,
        value: impl Into<Operand>,
    ) -> &mut Self {
        self.conditions.push(Condition::new(field, opt, value));
        self
    }

    pub fn or_where(
        &mut self,
        field: impl Into<String>,
        opt: WhereOpt,
        value: impl Into<Operand>,
    ) -> &mut Self {
        self.conditions.push(Condition::new(field, opt, value).or());
        self
    }

    /// Add a prebuilt condition as-is.
    pub fn and_condition(&mut self, condition: Condition) -> &mut Self {
        self.conditions.push(condition);
        self
    }

    /// Add one parenthesized group, joined with AND.
    pub fn where_group(&mut self, build: impl FnOnce(WhereBuilder) -> WhereBuilder) -> &mut Self {
        let nested = build(WhereBuilder::new()).into_conditions();
        if !nested.is_empty() {
            self.conditions.push(Condition::group(nested, AndOr::And));
        }
        self
    }

    /// Add the built conditions flat, only when `condition` holds.
    pub fn when(
        &mut self,
        condition: bool,
        build: impl FnOnce(WhereBuilder) -> WhereBuilder,
    ) -> &mut Self {
        if condition {
            self.conditions
                .extend(build(WhereBuilder::new()).into_conditions());
        }
        self
    }

    pub fn join(
        &mut self,
        join: JoinType,
        table: impl Into<String>,
        condition: Condition,
    ) -> &mut Self {
        self.joins.push(JoinItem {
            join,
            table: table.into(),
            condition,
        });
        self
    }

    pub fn having(
        &mut self,
        field: impl Into<String>,
        opt: WhereOpt,
        value: impl Into<Operand>,
    ) -> &mut Self {
        self.having.push(Condition::new(field, opt, value));
        self
    }

    pub fn group_by(&mut self, fields: &[&str]) -> &mut Self {
        self.group_by.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    pub fn order_by(&mut self, field: impl Into<String>, direction: OrderByDir) -> &mut Self {
        self.order_by.push(SortItem {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(&mut self, limit: u64, offset: u64) -> &mut Self {
        self.limit = Limit { limit, offset };
        self
    }

    /// Clear LIMIT/OFFSET and return what was set.
    pub fn remove_limit(&mut self) -> Limit {
        std::mem::take(&mut self.limit)
    }

    /// `OFFSET .. FETCH NEXT ..`; takes precedence over [`limit`](Self::limit).
    pub fn fetch(&mut self, offset: u64, fetch: u64) -> &mut Self {
        self.fetch = Fetch { offset, fetch };
        self
    }

    /// Clear OFFSET/FETCH and return what was set.
    pub fn remove_fetch(&mut self) -> Fetch {
        std::mem::take(&mut self.fetch)
    }

    /// Clear all accumulated state. The connection, any attached transaction
    /// and the tracer are kept.
    pub fn reset(&mut self) -> &mut Self {
        self.model = None;
        self.raw = None;
        self.select_columns.clear();
        self.omit_columns.clear();
        self.conditions.clear();
        self.joins.clear();
        self.group_by.clear();
        self.having.clear();
        self.order_by.clear();
        self.limit = Limit::default();
        self.fetch = Fetch::default();
        self
    }

    pub(crate) fn trace(&self, sql: &str, args: &[Value]) {
        if let Some(tracer) = &self.tracer {
            tracer.trace(sql, args);
        }
    }

    /// Run a query on the attached transaction, or on the connection.
    async fn fetch_rows(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Record>> {
        self.trace(sql, args);
        match &self.tx {
            Some(tx) => tx.query(sql, args).await,
            None => self.conn.query(sql, args).await,
        }
    }

    async fn exec(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.trace(sql, args);
        match &self.tx {
            Some(tx) => tx.execute(sql, args).await,
            None => self.conn.execute(sql, args).await,
        }
    }

    async fn exec_raw(&self) -> OrmResult<ExecResult> {
        let raw = self
            .raw
            .as_ref()
            .ok_or_else(|| OrmError::Other("no raw statement set".into()))?;
        self.exec(&raw.sql, &raw.args).await
    }

    /// Run an INSERT and return the generated key when `returning` is set.
    ///
    /// PostgreSQL reads the key from the statement's `RETURNING` row; MySQL
    /// reads the connection's last insert id.
    async fn add(&self, sql: &str, args: &[Value], returning: bool) -> OrmResult<Option<Value>> {
        if returning && self.dialect().supports_returning() {
            let rows = self.fetch_rows(sql, args).await?;
            return Ok(rows
                .into_iter()
                .next()
                .and_then(|row| row.into_iter_pairs().next())
                .map(|(_, id)| id));
        }

        let result = self.exec(sql, args).await?;
        Ok(returning
            .then_some(result.last_insert_id)
            .flatten()
            .map(Value::U64))
    }

    /// `SELECT COUNT(*) AS total FROM (<sql>) AS _result_out_`
    async fn count_raw(&self, sql: &str, args: &[Value]) -> OrmResult<i64> {
        let count_sql = format!("SELECT COUNT(*) AS total FROM ({sql}) AS {COUNT_ALIAS}");
        self.total(&count_sql, args).await
    }

    async fn count(&self, qb: &SelectQb) -> OrmResult<i64> {
        use crate::qb::SqlQb;

        let (sql, args) = qb.count_wrapper(COUNT_ALIAS).sql(self.dialect())?;
        self.total(&sql, &args).await
    }

    async fn total(&self, sql: &str, args: &[Value]) -> OrmResult<i64> {
        let rows = self.fetch_rows(sql, args).await?;
        match rows.first() {
            Some(row) => row
                .get("total")
                .or_else(|| row.first())
                .cloned()
                .map_or(Ok(0), i64::from_value)
                .map_err(|e| e.in_field("total")),
            None => Ok(0),
        }
    }

    /// Whether `column` survives the select/omit filters.
    fn keeps_column(&self, column: &str) -> bool {
        (self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == column))
            && !self.omit_columns.iter().any(|c| c == column)
    }

    /// SELECT over `table` carrying the accumulated clauses, without ordering
    /// or pagination.
    fn select_qb(&self, table: &Table) -> SelectQb {
        let columns: Vec<String> = if !self.select_columns.is_empty() {
            self.select_columns.clone()
        } else if !self.omit_columns.is_empty() {
            table
                .data_columns()
                .filter(|c| self.keeps_column(&c.name))
                .map(|c| c.name.clone())
                .collect()
        } else {
            Vec::new()
        };

        crate::qb::select_from(&table.name)
            .columns(columns)
            .joins(self.joins.iter().cloned())
            .group_by(self.group_by.iter().cloned())
            .having(self.having.iter().cloned())
    }

    /// Apply the user's pagination; FETCH wins over LIMIT.
    fn paginate(&self, qb: SelectQb) -> SelectQb {
        if self.fetch.is_set() {
            qb.fetch(self.fetch)
        } else if self.limit.is_set() {
            qb.limit(self.limit)
        } else {
            qb
        }
    }

    fn has_pagination(&self) -> bool {
        self.fetch.is_set() || self.limit.is_set()
    }
}

/// Equality filters for the target's non-zero data columns (primaries excluded).
fn where_from_model(table: &Table, mut qb: SelectQb) -> SelectQb {
    if !table.has_data {
        return qb;
    }
    for column in table.data_columns() {
        if column.primary || column.is_not_data() || column.is_zero {
            continue;
        }
        qb = qb.and_where(Condition::new(
            column.name.clone(),
            WhereOpt::Eq,
            table.value(&column.name).clone(),
        ));
    }
    qb
}

/// Equality predicates for every primary key holding a non-zero value.
fn primary_conditions(table: &Table) -> Vec<Condition> {
    table
        .present_primaries()
        .map(|pk| Condition::new(pk.name.clone(), WhereOpt::Eq, table.value(&pk.name).clone()))
        .collect()
}

/// Store a row into `target`, matching result columns to fields through
/// `table`. Columns the model does not map are ignored.
fn assign_record(target: &mut dyn Model, table: &Table, record: Record) -> OrmResult<()> {
    for (name, value) in record.into_iter_pairs() {
        let Some(column) = table.column(&name) else {
            continue;
        };
        if column.is_relation() {
            continue;
        }
        target
            .assign(&column.key, value)
            .map_err(|e| e.in_field(&column.key))?;
    }
    Ok(())
}
