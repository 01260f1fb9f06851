//! DELETE executors.

use super::{DbModel, primary_conditions};
use crate::client::Connection;
use crate::condition::{Condition, Operand, WhereOpt};
use crate::error::{OrmError, OrmResult};
use crate::model::{Entity, Model};
use crate::qb::{SqlQb, delete_from};
use crate::reflect::{reflect_columns, reflect_type};

impl<C: Connection> DbModel<C> {
    /// Delete rows matching the target's non-zero primary keys and the
    /// explicit conditions. Refuses when there are neither.
    pub async fn delete(&mut self, target: &dyn Model) -> OrmResult<()> {
        let result = self.delete_inner(target).await;
        self.reset();
        result
    }

    /// Delete by primary key: a list operand matches with `IN`, anything
    /// else with `=`.
    pub async fn delete_by_key<M: Entity>(&mut self, key: impl Into<Operand>) -> OrmResult<()> {
        let result = self.delete_by_key_inner::<M>(key.into()).await;
        self.reset();
        result
    }

    async fn delete_inner(&self, target: &dyn Model) -> OrmResult<()> {
        if self.raw.is_some() {
            return self.exec_raw().await.map(|_| ());
        }

        let table = reflect_columns(target)?;
        let mut conditions = primary_conditions(&table);
        conditions.extend(self.conditions.iter().cloned());
        self.delete_where(&table.name, conditions).await
    }

    async fn delete_by_key_inner<M: Entity>(&self, key: Operand) -> OrmResult<()> {
        if self.raw.is_some() {
            return self.exec_raw().await.map(|_| ());
        }

        let table = reflect_type::<M>()?;
        let pk = table.primaries.first().ok_or_else(|| {
            OrmError::shape(format!("{} has no primary key", M::descriptor().name))
        })?;
        let opt = match key {
            Operand::List(_) => WhereOpt::In,
            _ => WhereOpt::Eq,
        };

        let mut conditions = vec![Condition::new(pk.name.clone(), opt, key)];
        conditions.extend(self.conditions.iter().cloned());
        self.delete_where(&table.name, conditions).await
    }

    async fn delete_where(&self, table: &str, conditions: Vec<Condition>) -> OrmResult<()> {
        if conditions.is_empty() {
            return Err(OrmError::MissingPredicate("DELETE"));
        }
        let (sql, args) = delete_from(table).conditions(conditions).sql(self.dialect())?;
        self.exec(&sql, &args).await?;
        Ok(())
    }
}
