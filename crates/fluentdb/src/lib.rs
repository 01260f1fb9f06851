//! # fluentdb
//!
//! Tag-driven model mapping and a fluent CRUD builder for PostgreSQL and MySQL.
//!
//! ## Features
//!
//! - **Tagged models**: `#[derive(Model)]` reads `#[orm(model = "...")]` tags for keys,
//!   references and relations
//! - **Fluent builder**: [`DbModel`] accumulates clauses and runs one terminal operation
//! - **Write-back**: generated primary keys land back in the inserted model
//! - **Safe defaults**: UPDATE and DELETE refuse to run without a predicate
//! - **Transactions**: [`transaction!`] commits on `Ok` and rolls back on `Err`
//! - **SQL tracing**: `DB_DEBUG=true` logs every statement through `tracing`
//!
//! ## Example
//!
//! ```ignore
//! use fluentdb::prelude::*;
//!
//! #[derive(Debug, Default, Model)]
//! struct User {
//!     #[orm(model = "table:users")]
//!     meta: MetaData,
//!     #[orm(model = "type:serial,primary")]
//!     id: i64,
//!     name: String,
//!     age: i32,
//! }
//!
//! let conn = PostgresDriver::from_env()?.load().await?;
//! let mut db = DbModel::new(conn);
//!
//! let mut user = User { name: "alice".into(), age: 30, ..Default::default() };
//! db.create(&mut user).await?;
//! assert!(user.id > 0);
//!
//! let (adults, total) = db
//!     .and_where("age", WhereOpt::GrEq, 18)
//!     .order_by("name", OrderByDir::Asc)
//!     .limit(10, 0)
//!     .find::<User>()
//!     .await?;
//! ```

extern crate self as fluentdb;

pub mod client;
pub mod coerce;
pub mod condition;
pub mod config;
pub mod db;
pub mod driver;
pub mod error;
pub mod model;
pub mod prelude;
pub mod qb;
pub mod reflect;
pub mod repository;
pub mod trace;
pub mod transaction;
pub mod value;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{Connection, ExecResult, Executor, Record, Transaction};
pub use coerce::{set_value, to_str};
pub use condition::{
    AndOr, Condition, Fetch, JoinItem, JoinType, Limit, Operand, OrderByDir, SortItem,
    ValueField, WhereBuilder, WhereOpt,
};
pub use config::DbConfig;
pub use db::{Creatable, DbModel, GetOne, Updatable, ValueMap};
pub use driver::Driver;
pub use error::{OrmError, OrmResult};
pub use model::{Entity, FieldDef, MetaData, Model, Schema};
pub use reflect::{Column, Table, reflect, reflect_type, snake_case};
pub use repository::{AcceptedOrders, process_order_by};
pub use trace::SqlTracer;
pub use value::{FieldType, Kind, Value};

pub use qb::{
    DeleteQb, Dialect, InsertQb, SelectQb, SqlQb, UpdateQb, delete_from, insert_into, select_from,
    update,
};

#[cfg(feature = "pool")]
pub use driver::PostgresDriver;

#[cfg(feature = "pool")]
pub use pool::{PgConnection, PgTransaction, create_pool, create_pool_with_config};

#[cfg(feature = "mysql")]
pub use driver::MySqlDriver;

#[cfg(feature = "mysql")]
pub use mysql::{MySqlConnection, MySqlTransaction};

#[cfg(feature = "derive")]
pub use fluentdb_derive::Model;
