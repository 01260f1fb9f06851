//! MySQL [`Connection`] over a `mysql_async` pool.

use crate::client::{Connection, ExecResult, Executor, Record, Transaction};
use crate::error::{OrmError, OrmResult};
use crate::qb::Dialect;
use crate::value::Value;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Params, Pool};
use tokio::sync::Mutex;

fn to_mysql(value: &Value) -> mysql_async::Value {
    use mysql_async::Value as My;

    fn datetime(t: &NaiveDateTime) -> My {
        My::Date(
            t.year() as u16,
            t.month() as u8,
            t.day() as u8,
            t.hour() as u8,
            t.minute() as u8,
            t.second() as u8,
            t.nanosecond() / 1_000,
        )
    }

    match value {
        Value::Null => My::NULL,
        Value::Bool(v) => My::Int(i64::from(*v)),
        Value::I8(v) => My::Int((*v).into()),
        Value::I16(v) => My::Int((*v).into()),
        Value::I32(v) => My::Int((*v).into()),
        Value::I64(v) => My::Int(*v),
        Value::U8(v) => My::UInt((*v).into()),
        Value::U16(v) => My::UInt((*v).into()),
        Value::U32(v) => My::UInt((*v).into()),
        Value::U64(v) => My::UInt(*v),
        Value::F32(v) => My::Float(*v),
        Value::F64(v) => My::Double(*v),
        Value::String(v) => My::Bytes(v.as_bytes().to_vec()),
        Value::Bytes(v) => My::Bytes(v.clone()),
        Value::Json(v) => My::Bytes(v.to_string().into_bytes()),
        Value::Uuid(v) => My::Bytes(v.to_string().into_bytes()),
        Value::Date(d) => My::Date(d.year() as u16, d.month() as u8, d.day() as u8, 0, 0, 0, 0),
        Value::Timestamp(t) => datetime(t),
        Value::TimestampTz(t) => datetime(&t.naive_utc()),
    }
}

fn from_mysql(value: mysql_async::Value) -> Value {
    use mysql_async::Value as My;

    match value {
        My::NULL => Value::Null,
        My::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => Value::String(s),
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        My::Int(v) => Value::I64(v),
        My::UInt(v) => Value::U64(v),
        My::Float(v) => Value::F32(v),
        My::Double(v) => Value::F64(v),
        My::Date(year, month, day, hour, minute, second, micros) => {
            NaiveDate::from_ymd_opt(year.into(), month.into(), day.into())
                .and_then(|date| {
                    date.and_hms_micro_opt(hour.into(), minute.into(), second.into(), micros)
                })
                .map(Value::Timestamp)
                // Zero dates such as 0000-00-00 have no chrono equivalent.
                .unwrap_or(Value::Null)
        }
        My::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let hours = days * 24 + u32::from(hours);
            Value::String(format!(
                "{sign}{hours:02}:{minutes:02}:{seconds:02}.{micros:06}"
            ))
        }
    }
}

fn params(args: &[Value]) -> Params {
    if args.is_empty() {
        Params::Empty
    } else {
        Params::Positional(args.iter().map(to_mysql).collect())
    }
}

async fn query_on(conn: &mut Conn, sql: &str, args: &[Value]) -> OrmResult<Vec<Record>> {
    let rows: Vec<mysql_async::Row> = conn.exec(sql, params(args)).await?;
    Ok(rows
        .into_iter()
        .map(|mut row| {
            let columns: Vec<String> = row
                .columns_ref()
                .iter()
                .map(|c| c.name_str().into_owned())
                .collect();
            let values = (0..columns.len())
                .map(|idx| {
                    row.take::<mysql_async::Value, usize>(idx)
                        .map(from_mysql)
                        .unwrap_or(Value::Null)
                })
                .collect();
            Record::new(columns, values)
        })
        .collect())
}

async fn execute_on(conn: &mut Conn, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
    conn.exec_drop(sql, params(args)).await?;
    Ok(ExecResult {
        rows_affected: conn.affected_rows(),
        last_insert_id: conn.last_insert_id(),
    })
}

/// Pooled MySQL connection handle. Cheap to clone.
#[derive(Clone, Debug)]
pub struct MySqlConnection {
    pool: Pool,
}

impl MySqlConnection {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Build a pool from a `mysql://` URL.
    pub fn connect(database_url: &str) -> OrmResult<Self> {
        let opts = mysql_async::Opts::from_url(database_url)
            .map_err(|e| OrmError::Connection(e.to_string()))?;
        Ok(Self::new(Pool::new(opts)))
    }

    pub async fn ping(&self) -> OrmResult<()> {
        let mut conn = self.pool.get_conn().await?;
        conn.ping().await?;
        Ok(())
    }
}

impl Executor for MySqlConnection {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Record>> {
        let mut conn = self.pool.get_conn().await?;
        query_on(&mut conn, sql, args).await
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        let mut conn = self.pool.get_conn().await?;
        execute_on(&mut conn, sql, args).await
    }
}

impl Connection for MySqlConnection {
    type Tx = MySqlTransaction;

    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn begin(&self) -> OrmResult<MySqlTransaction> {
        let mut conn = self.pool.get_conn().await?;
        conn.query_drop("START TRANSACTION").await?;
        Ok(MySqlTransaction {
            conn: Mutex::new(Some(conn)),
        })
    }
}

/// A MySQL transaction pinned to one pooled connection.
pub struct MySqlTransaction {
    conn: Mutex<Option<Conn>>,
}

impl MySqlTransaction {
    async fn finish(mut self, statement: &str) -> OrmResult<()> {
        let mut conn = self
            .conn
            .get_mut()
            .take()
            .ok_or_else(|| OrmError::Transaction("transaction already finished".into()))?;
        conn.query_drop(statement).await?;
        Ok(())
    }
}

fn finished() -> OrmError {
    OrmError::Transaction("transaction already finished".into())
}

impl Executor for MySqlTransaction {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Record>> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(finished)?;
        query_on(conn, sql, args).await
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(finished)?;
        execute_on(conn, sql, args).await
    }
}

impl Transaction for MySqlTransaction {
    async fn commit(self) -> OrmResult<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(self) -> OrmResult<()> {
        self.finish("ROLLBACK").await
    }
}

impl Drop for MySqlTransaction {
    fn drop(&mut self) {
        let Some(mut conn) = self.conn.get_mut().take() else {
            return;
        };
        tracing::warn!(
            target: "fluentdb.tx",
            "transaction dropped without commit or rollback; rolling back"
        );
        // The connection must not re-enter the pool with the transaction open.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = conn.query_drop("ROLLBACK").await {
                    tracing::warn!(target: "fluentdb.tx", error = %e, "rollback of dropped transaction failed");
                }
            });
        }
    }
}
