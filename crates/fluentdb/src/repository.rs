//! Generic one-call helpers over [`DbModel`].
//!
//! Every helper builds a fresh [`DbModel`] on a clone of the connection, so
//! they can be called concurrently on a shared pool handle. Failures other
//! than [`OrmError::NotFound`] are logged under `fluentdb.repository`.
//!
//! ```ignore
//! let user: User = fluentdb::repository::get_model_by_id(&conn, 7).await?;
//! let (page, total) = fluentdb::repository::find_models::<User, _>(
//!     &conn, 2, 20, "name", OrderByDir::Asc, Vec::new(),
//! ).await?;
//! ```

use crate::client::Connection;
use crate::condition::{Condition, Operand, OrderByDir, WhereOpt};
use crate::db::{DbModel, ValueMap};
use crate::error::OrmResult;
use crate::model::{Entity, Model};

fn log_failure<T>(op: &'static str, model: &str, result: OrmResult<T>) -> OrmResult<T> {
    if let Err(e) = &result
        && !e.is_not_found()
    {
        tracing::error!(target: "fluentdb.repository", op, model, error = %e, "repository call failed");
    }
    result
}

/// Load the model whose `id` column equals `id`.
pub async fn get_model_by_id<M: Entity, C: Connection>(
    conn: &C,
    id: impl Into<Operand>,
) -> OrmResult<M> {
    get_model_by(conn, "id", id).await
}

/// Load the first model whose `field` equals `value`.
pub async fn get_model_by<M: Entity, C: Connection>(
    conn: &C,
    field: &str,
    value: impl Into<Operand>,
) -> OrmResult<M> {
    get_model_where_eq(conn, field, value).await
}

pub async fn get_model_where_eq<M: Entity, C: Connection>(
    conn: &C,
    field: &str,
    value: impl Into<Operand>,
) -> OrmResult<M> {
    get_model(conn, vec![Condition::new(field, WhereOpt::Eq, value)]).await
}

/// Load the first model matching every condition.
pub async fn get_model<M: Entity, C: Connection>(
    conn: &C,
    conditions: Vec<Condition>,
) -> OrmResult<M> {
    let mut db = DbModel::new(conn.clone());
    let mut model = M::default();
    for condition in conditions {
        db.and_condition(condition);
    }
    let result = db.first(&mut model).await.map(|()| model);
    log_failure("get", M::descriptor().name, result)
}

/// One page of models plus the total number of matches.
///
/// `page` is 1-based; page 0 is treated as the first page.
pub async fn find_models<M: Entity, C: Connection>(
    conn: &C,
    page: u64,
    limit: u64,
    sort_field: &str,
    sort_dir: OrderByDir,
    conditions: Vec<Condition>,
) -> OrmResult<(Vec<M>, i64)> {
    let offset = page.saturating_sub(1) * limit;

    let mut db = DbModel::new(conn.clone());
    for condition in conditions {
        db.and_condition(condition);
    }
    if !sort_field.is_empty() {
        db.order_by(sort_field, sort_dir);
    }
    let result = db.limit(limit, offset).find::<M>().await;
    log_failure("find", M::descriptor().name, result)
}

/// Models whose `field` equals `value` and whose columns equal every entry
/// of `filters`.
pub async fn list_models<M: Entity, C: Connection>(
    conn: &C,
    page: u64,
    limit: u64,
    field: &str,
    value: impl Into<Operand>,
    filters: &ValueMap,
) -> OrmResult<(Vec<M>, i64)> {
    let offset = page.saturating_sub(1) * limit;

    let mut db = DbModel::new(conn.clone());
    db.and_where(field, WhereOpt::Eq, value);
    for (column, value) in filters {
        db.and_where(column.as_str(), WhereOpt::Eq, value.clone());
    }
    let result = db.limit(limit, offset).find::<M>().await;
    log_failure("list", M::descriptor().name, result)
}

/// Insert `model` inside its own transaction.
pub async fn create_model<M: Model, C: Connection>(conn: &C, model: &mut M) -> OrmResult<()> {
    let name = model.schema().name;
    let mut db = DbModel::new(conn.clone());
    let result: OrmResult<()> =
        async { crate::transaction!(db, { db.create(model).await }) }.await;
    log_failure("create", name, result)
}

/// Update `model` by its primary key inside its own transaction.
pub async fn update_model<M: Model, C: Connection>(conn: &C, model: &mut M) -> OrmResult<()> {
    let name = model.schema().name;
    let mut db = DbModel::new(conn.clone());
    let result: OrmResult<()> =
        async { crate::transaction!(db, { db.update(model).await }) }.await;
    log_failure("update", name, result)
}

/// Delete `model` by its primary key inside its own transaction.
pub async fn delete_model<M: Model, C: Connection>(conn: &C, model: &M) -> OrmResult<()> {
    let name = model.schema().name;
    let mut db = DbModel::new(conn.clone());
    let result: OrmResult<()> =
        async { crate::transaction!(db, { db.delete(model).await }) }.await;
    log_failure("delete", name, result)
}

/// Keys accepted by [`process_order_by`].
#[derive(Debug, Clone, Copy)]
pub enum AcceptedOrders<'a> {
    /// Keys used as column names as-is.
    List(&'a [&'a str]),
    /// Public key to column name.
    Map(&'a [(&'a str, &'a str)]),
}

impl AcceptedOrders<'_> {
    fn resolve(&self, key: &str) -> Option<String> {
        match self {
            AcceptedOrders::List(keys) => keys.contains(&key).then(|| key.to_string()),
            AcceptedOrders::Map(pairs) => pairs
                .iter()
                .find(|(alias, _)| *alias == key)
                .map(|(_, column)| column.to_string()),
        }
    }
}

/// Apply a user-supplied sort key such as `"name"` or `"-created_at"`.
///
/// A leading `-` sorts descending. Keys not in `accepted`, and an empty
/// `order_by`, fall back to `default_key`; `default_dir` then overrides the
/// direction. Nothing is ordered when no key survives.
pub fn process_order_by<C: Connection>(
    db: &mut DbModel<C>,
    order_by: &str,
    accepted: AcceptedOrders<'_>,
    default_key: Option<&str>,
    default_dir: Option<OrderByDir>,
) {
    let (key, mut direction) = match order_by.strip_prefix('-') {
        Some(rest) => (rest, OrderByDir::Desc),
        None => (order_by, OrderByDir::Asc),
    };

    let mut column = if key.is_empty() {
        None
    } else {
        accepted.resolve(key)
    };

    if column.is_none() {
        if let Some(default) = default_key {
            column = Some(default.to_string());
        }
        if let Some(dir) = default_dir {
            direction = dir;
        }
    }

    if let Some(column) = column {
        db.order_by(column, direction);
    }
}
