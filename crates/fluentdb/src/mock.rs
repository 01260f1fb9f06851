//! Scripted in-memory connection for unit tests.

use crate::client::{Connection, ExecResult, Executor, Record, Transaction};
use crate::error::{OrmError, OrmResult};
use crate::qb::Dialect;
use crate::value::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Rows(Vec<Record>),
    Exec(ExecResult),
    Fail(String),
}

#[derive(Debug, Default)]
struct State {
    log: Vec<(String, Vec<Value>, bool)>,
    replies: VecDeque<Reply>,
}

/// Records every statement and answers from a reply queue.
///
/// With an empty queue, queries return no rows and statements report one
/// affected row.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockConnection {
    state: Arc<Mutex<State>>,
    dialect: Dialect,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    pub fn push_rows(&self, rows: Vec<Record>) -> &Self {
        self.push(Reply::Rows(rows))
    }

    pub fn push_exec(&self, rows_affected: u64, last_insert_id: Option<u64>) -> &Self {
        self.push(Reply::Exec(ExecResult {
            rows_affected,
            last_insert_id,
        }))
    }

    pub fn push_error(&self, message: &str) -> &Self {
        self.push(Reply::Fail(message.to_string()))
    }

    fn push(&self, reply: Reply) -> &Self {
        self.state.lock().unwrap().replies.push_back(reply);
        self
    }

    /// Every statement seen so far, with its arguments.
    pub fn log(&self) -> Vec<(String, Vec<Value>)> {
        let state = self.state.lock().unwrap();
        state
            .log
            .iter()
            .map(|(sql, args, _)| (sql.clone(), args.clone()))
            .collect()
    }

    pub fn statements(&self) -> Vec<String> {
        self.log().into_iter().map(|(sql, _)| sql).collect()
    }

    /// Statements that ran on a transaction.
    pub fn tx_statements(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .log
            .iter()
            .filter(|(_, _, in_tx)| *in_tx)
            .map(|(sql, _, _)| sql.clone())
            .collect()
    }

    fn record(&self, sql: &str, args: &[Value], in_tx: bool) -> Option<Reply> {
        let mut state = self.state.lock().unwrap();
        state.log.push((sql.to_string(), args.to_vec(), in_tx));
        state.replies.pop_front()
    }

    /// Transaction control statements are logged but never consume replies.
    fn control(&self, sql: &str, in_tx: bool) {
        let mut state = self.state.lock().unwrap();
        state.log.push((sql.to_string(), Vec::new(), in_tx));
    }

    fn answer_query(&self, sql: &str, args: &[Value], in_tx: bool) -> OrmResult<Vec<Record>> {
        match self.record(sql, args, in_tx) {
            None | Some(Reply::Exec(_)) => Ok(Vec::new()),
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Fail(message)) => Err(OrmError::Other(message)),
        }
    }

    fn answer_execute(&self, sql: &str, args: &[Value], in_tx: bool) -> OrmResult<ExecResult> {
        match self.record(sql, args, in_tx) {
            None => Ok(ExecResult {
                rows_affected: 1,
                last_insert_id: None,
            }),
            Some(Reply::Exec(result)) => Ok(result),
            Some(Reply::Rows(rows)) => Ok(ExecResult {
                rows_affected: rows.len() as u64,
                last_insert_id: None,
            }),
            Some(Reply::Fail(message)) => Err(OrmError::Other(message)),
        }
    }
}

impl Executor for MockConnection {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Record>> {
        self.answer_query(sql, args, false)
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.answer_execute(sql, args, false)
    }
}

impl Connection for MockConnection {
    type Tx = MockTx;

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn begin(&self) -> OrmResult<MockTx> {
        self.control("BEGIN", false);
        Ok(MockTx { conn: self.clone() })
    }
}

/// Transaction sharing its connection's log and reply queue.
#[derive(Debug)]
pub(crate) struct MockTx {
    conn: MockConnection,
}

impl Executor for MockTx {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Record>> {
        self.conn.answer_query(sql, args, true)
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.conn.answer_execute(sql, args, true)
    }
}

impl Transaction for MockTx {
    async fn commit(self) -> OrmResult<()> {
        self.conn.control("COMMIT", true);
        Ok(())
    }

    async fn rollback(self) -> OrmResult<()> {
        self.conn.control("ROLLBACK", true);
        Ok(())
    }
}
