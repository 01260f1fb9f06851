//! Transactions on a [`DbModel`].
//!
//! While a transaction is attached every terminal operation runs on it.
//! Detaching happens on [`commit`](DbModel::commit) or
//! [`rollback`](DbModel::rollback); [`reset`](DbModel::reset) leaves it alone.
//!
//! For ergonomic commit/rollback handling, use the [`transaction!`](crate::transaction!) macro.
//!
//! # Example
//!
//! ```ignore
//! let mut db = fluentdb::DbModel::new(conn);
//!
//! fluentdb::transaction!(db, {
//!     db.create(&mut order).await?;
//!     db.and_where("id", WhereOpt::Eq, order.item_id).update(&mut stock).await?;
//!     Ok(())
//! })?;
//! ```

use crate::client::{Connection, Transaction};
use crate::db::DbModel;
use crate::error::{OrmError, OrmResult};

/// Runs the given block inside a transaction attached to `$db`.
///
/// - Begins with `$db.begin().await`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`.
///
/// The block must evaluate to `fluentdb::OrmResult<T>`.
#[macro_export]
macro_rules! transaction {
    ($db:expr, $body:block) => {{
        ($db).begin().await?;

        let __fluentdb_tx_body_result: $crate::OrmResult<_> = async { $body }.await;
        match __fluentdb_tx_body_result {
            Ok(value) => {
                ($db).commit().await?;
                Ok(value)
            }
            Err(error) => match ($db).rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::OrmError::Transaction(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
}

impl<C: Connection> DbModel<C> {
    /// Attach a new transaction.
    ///
    /// Fails with [`OrmError::Transaction`] if one is already attached.
    pub async fn begin(&mut self) -> OrmResult<&mut Self> {
        if self.tx.is_some() {
            return Err(OrmError::Transaction(
                "nested transactions are not supported".into(),
            ));
        }
        self.trace("BEGIN", &[]);
        let tx = self.connection().begin().await?;
        self.tx = Some(tx);
        Ok(self)
    }

    /// Commit and detach the transaction. No-op without one.
    pub async fn commit(&mut self) -> OrmResult<()> {
        match self.tx.take() {
            Some(tx) => {
                self.trace("COMMIT", &[]);
                tx.commit().await
            }
            None => Ok(()),
        }
    }

    /// Roll back and detach the transaction. No-op without one.
    pub async fn rollback(&mut self) -> OrmResult<()> {
        match self.tx.take() {
            Some(tx) => {
                self.trace("ROLLBACK", &[]);
                tx.rollback().await
            }
            None => Ok(()),
        }
    }
}
