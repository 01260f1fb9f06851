//! Convenient imports for typical `fluentdb` usage.
//!
//! ```ignore
//! use fluentdb::prelude::*;
//! ```

pub use crate::{
    Condition, Connection, DbConfig, DbModel, Driver, Entity, GetOne, MetaData, Model, OrderByDir,
    OrmError, OrmResult, Value, ValueMap, WhereBuilder, WhereOpt,
};

#[cfg(feature = "pool")]
pub use crate::{PgConnection, PostgresDriver};

#[cfg(feature = "mysql")]
pub use crate::{MySqlConnection, MySqlDriver};

pub use crate::transaction;
