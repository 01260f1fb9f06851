//! Multi-row fetch with a total count.

use super::{DbModel, assign_record, where_from_model};
use crate::client::Connection;
use crate::error::{OrmError, OrmResult};
use crate::model::Entity;
use crate::qb::SqlQb;
use crate::reflect::{Table, reflect_type};

impl<C: Connection> DbModel<C> {
    /// Load every matching row, plus the number of rows matching without
    /// LIMIT/FETCH.
    pub async fn find<M: Entity>(&mut self) -> OrmResult<(Vec<M>, i64)> {
        let result = self.find_inner::<M>().await;
        self.reset();
        result
    }

    async fn find_inner<M: Entity>(&self) -> OrmResult<(Vec<M>, i64)> {
        let table = reflect_type::<M>()?;

        if let Some(raw) = &self.raw {
            let rows = self.fetch_rows(&raw.sql, &raw.args).await?;
            let models = into_models(&table, rows)?;
            let total = self.count_raw(&raw.sql, &raw.args).await?;
            return Ok((models, total));
        }

        if table.data_columns().next().is_none() {
            return Err(OrmError::shape(format!(
                "{} maps no columns",
                M::descriptor().name
            )));
        }

        let qb = self
            .select_qb(&table)
            .conditions(self.conditions.iter().cloned());
        let qb = where_from_model(&table, qb).order_by_items(self.order_by.iter().cloned());
        let qb = self.paginate(qb);

        let (sql, args) = qb.sql(self.dialect())?;
        let rows = self.fetch_rows(&sql, &args).await?;
        let models = into_models(&table, rows)?;
        let total = self.count(&qb).await?;
        Ok((models, total))
    }
}

fn into_models<M: Entity>(table: &Table, rows: Vec<crate::client::Record>) -> OrmResult<Vec<M>> {
    rows.into_iter()
        .map(|row| {
            let mut model = M::default();
            assign_record(&mut model, table, row)?;
            Ok(model)
        })
        .collect()
}
