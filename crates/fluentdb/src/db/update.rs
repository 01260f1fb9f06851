//! UPDATE executors.

use super::create::apply_map;
use super::{DbModel, ValueMap, primary_conditions};
use crate::client::Connection;
use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::qb::{SqlQb, update};
use crate::reflect::reflect_columns;
use std::future::Future;

/// Values [`DbModel::update`] can write: a model, or a [`ValueMap`] applied
/// to the registered model.
pub trait Updatable: Send {
    #[doc(hidden)]
    fn update_with<C: Connection>(
        &mut self,
        db: &mut DbModel<C>,
    ) -> impl Future<Output = OrmResult<()>> + Send;
}

impl<C: Connection> DbModel<C> {
    /// Update rows matching the explicit conditions, or else the target's
    /// non-zero primary keys.
    ///
    /// Refuses with [`OrmError::MissingPredicate`], before any SQL is sent,
    /// when neither exists.
    pub async fn update<T: Updatable + ?Sized>(&mut self, target: &mut T) -> OrmResult<()> {
        let result = if self.raw.is_some() {
            self.exec_raw().await.map(|_| ())
        } else {
            target.update_with(self).await
        };
        self.reset();
        result
    }

    async fn update_model(&self, target: &dyn Model) -> OrmResult<()> {
        let table = reflect_columns(target)?;

        let conditions = if self.conditions.is_empty() {
            primary_conditions(&table)
        } else {
            self.conditions.clone()
        };
        if conditions.is_empty() {
            return Err(OrmError::MissingPredicate("UPDATE"));
        }

        let mut qb = update(&table.name).conditions(conditions);
        for column in table.data_columns() {
            if column.primary || column.is_not_data() || !self.keeps_column(&column.name) {
                continue;
            }
            qb = qb.set(&column.name, table.value(&column.name).clone());
        }

        let (sql, args) = qb.sql(self.dialect())?;
        self.exec(&sql, &args).await?;
        Ok(())
    }
}

impl<M: Model> Updatable for M {
    async fn update_with<C: Connection>(&mut self, db: &mut DbModel<C>) -> OrmResult<()> {
        db.update_model(self).await
    }
}

impl Updatable for ValueMap {
    async fn update_with<C: Connection>(&mut self, db: &mut DbModel<C>) -> OrmResult<()> {
        let mut target = db.model.take().ok_or(OrmError::MissingModel("update"))?;
        apply_map(target.as_mut(), self)?;
        db.update_model(target.as_ref()).await
    }
}
