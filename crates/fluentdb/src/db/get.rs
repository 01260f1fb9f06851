//! Single-row fetch.

use super::{DbModel, assign_record, primary_conditions, where_from_model};
use crate::client::Connection;
use crate::condition::{Limit, OrderByDir, SortItem};
use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::qb::SqlQb;
use crate::reflect::{Table, reflect, reflect_columns};
use rand::Rng;
use rand::rngs::OsRng;

/// Row selection strategy for [`DbModel::get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetOne {
    /// Lowest primary key (or first column) first.
    First,
    /// Highest primary key (or first column) first.
    Last,
    /// Order by a random column in a random direction.
    Take,
}

impl<C: Connection> DbModel<C> {
    /// Load one row into `target`.
    ///
    /// Non-zero primary keys and data fields already set on `target` become
    /// equality filters. Returns [`OrmError::NotFound`] when nothing matches.
    pub async fn get(&mut self, target: &mut dyn Model, strategy: GetOne) -> OrmResult<()> {
        let result = self.get_inner(target, strategy).await;
        self.reset();
        result
    }

    pub async fn first(&mut self, target: &mut dyn Model) -> OrmResult<()> {
        self.get(target, GetOne::First).await
    }

    pub async fn last(&mut self, target: &mut dyn Model) -> OrmResult<()> {
        self.get(target, GetOne::Last).await
    }

    pub async fn take(&mut self, target: &mut dyn Model) -> OrmResult<()> {
        self.get(target, GetOne::Take).await
    }

    async fn get_inner(&self, target: &mut dyn Model, strategy: GetOne) -> OrmResult<()> {
        if let Some(raw) = &self.raw {
            let table = reflect(&*target)?;
            let row = self
                .fetch_rows(&raw.sql, &raw.args)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| OrmError::not_found(format!("no {} row matched", table.name)))?;
            return assign_record(target, &table, row);
        }

        let table = reflect_columns(&*target)?;

        let qb = self
            .select_qb(&table)
            .conditions(primary_conditions(&table))
            .conditions(self.conditions.iter().cloned());
        let qb = where_from_model(&table, qb)
            .order_by_items(self.order_by.iter().cloned())
            .order_by(strategy_order(&table, strategy));
        let qb = if self.has_pagination() {
            self.paginate(qb)
        } else {
            qb.limit(Limit { limit: 1, offset: 0 })
        };

        let (sql, args) = qb.sql(self.dialect())?;
        let row = self
            .fetch_rows(&sql, &args)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OrmError::not_found(format!("no {} row matched", table.name)))?;
        assign_record(target, &table, row)
    }
}

/// `table` is known to have at least one data column.
fn strategy_order(table: &Table, strategy: GetOne) -> SortItem {
    let anchor = table
        .primaries
        .first()
        .or_else(|| table.data_columns().next())
        .map(|c| c.name.clone())
        .unwrap_or_default();

    match strategy {
        GetOne::First => SortItem {
            field: anchor,
            direction: OrderByDir::Asc,
        },
        GetOne::Last => SortItem {
            field: anchor,
            direction: OrderByDir::Desc,
        },
        GetOne::Take => {
            let columns: Vec<&str> = table.data_columns().map(|c| c.name.as_str()).collect();
            let field = columns[OsRng.gen_range(0..columns.len())].to_string();
            let direction = if OsRng.gen_range(0..10) % 2 == 1 {
                OrderByDir::Asc
            } else {
                OrderByDir::Desc
            };
            SortItem { field, direction }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::Column;

    fn table(primary: bool) -> Table {
        let id = Column {
            key: "id".into(),
            name: "id".into(),
            primary,
            ..Column::default()
        };
        let name = Column {
            key: "name".into(),
            name: "name".into(),
            ..Column::default()
        };
        let posts = Column {
            key: "posts".into(),
            name: "posts".into(),
            relation: "post".into(),
            ..Column::default()
        };
        Table {
            name: "users".into(),
            primaries: if primary { vec![id.clone()] } else { Vec::new() },
            columns: vec![id, name, posts],
            ..Table::default()
        }
    }

    #[test]
    fn first_and_last_anchor_on_primary_key() {
        let t = table(true);
        assert_eq!(
            strategy_order(&t, GetOne::First),
            SortItem {
                field: "id".into(),
                direction: OrderByDir::Asc
            }
        );
        assert_eq!(strategy_order(&t, GetOne::Last).direction, OrderByDir::Desc);
    }

    #[test]
    fn falls_back_to_first_column_without_primary() {
        let t = table(false);
        assert_eq!(strategy_order(&t, GetOne::First).field, "id");
    }

    #[test]
    fn take_never_orders_by_relation() {
        let t = table(true);
        for _ in 0..64 {
            let item = strategy_order(&t, GetOne::Take);
            assert!(item.field == "id" || item.field == "name");
        }
    }
}
