//! INSERT executors.

use super::{DbModel, ValueMap};
use crate::client::Connection;
use crate::coerce::set_value;
use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::qb::{SqlQb, insert_into};
use crate::reflect::{Table, reflect, reflect_columns};
use std::future::Future;

/// Values [`DbModel::create`] can insert: a model, a slice or vector of
/// models, or a [`ValueMap`] applied to the registered model.
pub trait Creatable: Send {
    #[doc(hidden)]
    fn insert_with<C: Connection>(
        &mut self,
        db: &mut DbModel<C>,
    ) -> impl Future<Output = OrmResult<()>> + Send;

    /// Raw mode: run the raw statement as-is.
    #[doc(hidden)]
    fn insert_raw<C: Connection>(
        &mut self,
        db: &mut DbModel<C>,
    ) -> impl Future<Output = OrmResult<()>> + Send {
        async move { db.exec_raw().await.map(|_| ()) }
    }
}

impl<C: Connection> DbModel<C> {
    /// Insert `target`, writing a generated primary key back into it.
    pub async fn create<T: Creatable + ?Sized>(&mut self, target: &mut T) -> OrmResult<()> {
        let result = if self.raw.is_some() {
            target.insert_raw(self).await
        } else {
            target.insert_with(self).await
        };
        self.reset();
        result
    }

    /// Insert one model. Primary keys, relation and reference columns, and
    /// columns filtered out by select/omit are left to the database.
    async fn insert_model(&self, target: &mut dyn Model) -> OrmResult<()> {
        let table = reflect_columns(&*target)?;
        let pk = single_primary(&table);

        let mut qb = insert_into(&table.name);
        for column in table.data_columns() {
            if column.primary || column.is_not_data() || !self.keeps_column(&column.name) {
                continue;
            }
            qb = qb.set(&column.name, table.value(&column.name).clone());
        }
        if let Some((_, name)) = &pk {
            qb = qb.returning(name);
        }

        let (sql, args) = qb.sql(self.dialect())?;
        let id = self.add(&sql, &args, pk.is_some()).await?;
        if let (Some((key, _)), Some(id)) = (pk, id) {
            set_value(target, &key, id)?;
        }
        Ok(())
    }
}

/// `(key, column name)` of the primary key when there is exactly one.
fn single_primary(table: &Table) -> Option<(String, String)> {
    match table.primaries.as_slice() {
        [pk] => Some((pk.key.clone(), pk.name.clone())),
        _ => None,
    }
}

impl<M: Model> Creatable for M {
    async fn insert_with<C: Connection>(&mut self, db: &mut DbModel<C>) -> OrmResult<()> {
        db.insert_model(self).await
    }

    /// Raw INSERT; the single primary key is read back like a built insert.
    async fn insert_raw<C: Connection>(&mut self, db: &mut DbModel<C>) -> OrmResult<()> {
        let table = reflect(&*self)?;
        let Some((key, name)) = single_primary(&table) else {
            return db.exec_raw().await.map(|_| ());
        };
        let Some(raw) = db.raw.as_ref() else {
            return Ok(());
        };

        let mut sql = raw.sql.clone();
        if db.dialect().supports_returning() {
            sql.push_str(&format!(" RETURNING {name}"));
        }
        if let Some(id) = db.add(&sql, &raw.args, true).await? {
            set_value(self, &key, id)?;
        }
        Ok(())
    }
}

/// Every element is attempted; the last failure is returned.
impl<M: Model> Creatable for [M] {
    async fn insert_with<C: Connection>(&mut self, db: &mut DbModel<C>) -> OrmResult<()> {
        let mut result = Ok(());
        for item in self.iter_mut() {
            if let Err(e) = db.insert_model(item).await {
                tracing::warn!(target: "fluentdb.sql", error = %e, "insert failed");
                result = Err(e);
            }
        }
        result
    }
}

impl<M: Model> Creatable for Vec<M> {
    async fn insert_with<C: Connection>(&mut self, db: &mut DbModel<C>) -> OrmResult<()> {
        self.as_mut_slice().insert_with(db).await
    }
}

/// `None` entries are skipped.
impl<M: Model> Creatable for Vec<Option<M>> {
    async fn insert_with<C: Connection>(&mut self, db: &mut DbModel<C>) -> OrmResult<()> {
        let mut result = Ok(());
        for item in self.iter_mut().flatten() {
            if let Err(e) = db.insert_model(item).await {
                tracing::warn!(target: "fluentdb.sql", error = %e, "insert failed");
                result = Err(e);
            }
        }
        result
    }
}

/// Applies the map onto the registered model, inserts it, and stores the
/// generated key back into the map under the key's field name.
impl Creatable for ValueMap {
    async fn insert_with<C: Connection>(&mut self, db: &mut DbModel<C>) -> OrmResult<()> {
        let mut target = db.model.take().ok_or(OrmError::MissingModel("create"))?;
        apply_map(target.as_mut(), self)?;
        db.insert_model(target.as_mut()).await?;

        let table = reflect(target.as_ref())?;
        if let Some((key, name)) = single_primary(&table) {
            let id = table.value(&name);
            if !id.is_null() {
                self.insert(key, id.clone());
            }
        }
        Ok(())
    }
}

/// Coerce every non-zero map entry into `target`. Keys may name a field or
/// its column.
pub(super) fn apply_map(target: &mut dyn Model, map: &ValueMap) -> OrmResult<()> {
    let table = reflect(&*target)?;
    for (key, value) in map {
        if value.is_zero() {
            continue;
        }
        let field = match target.schema().field(key) {
            Some(_) => key.as_str(),
            None => table.key_of(key).unwrap_or(key.as_str()),
        };
        set_value(target, field, value.clone())?;
    }
    Ok(())
}
