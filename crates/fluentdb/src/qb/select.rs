//! SELECT query builder.

use crate::condition::{Condition, Fetch, JoinItem, JoinType, Limit, SortItem};
use crate::error::OrmResult;
use crate::qb::Dialect;
use crate::qb::expr::render_conditions;
use crate::qb::param::ParamList;
use crate::qb::traits::SqlQb;

#[derive(Clone, Debug)]
enum FromItem {
    Table(String),
    Subquery(Box<SelectQb>, String),
}

/// SELECT query builder.
#[derive(Clone, Debug)]
pub struct SelectQb {
    /// SELECT columns (empty means `*`)
    columns: Vec<String>,
    from: FromItem,
    joins: Vec<JoinItem>,
    conditions: Vec<Condition>,
    group_by: Vec<String>,
    having: Vec<Condition>,
    order_by: Vec<SortItem>,
    limit: Limit,
    fetch: Fetch,
}

impl SelectQb {
    /// Create a new SELECT query builder for a table.
    pub fn new(table: &str) -> Self {
        Self::with_from(FromItem::Table(table.to_string()))
    }

    /// Select from a parenthesized subquery: `FROM (<inner>) AS alias`.
    pub fn from_subquery(inner: SelectQb, alias: &str) -> Self {
        Self::with_from(FromItem::Subquery(Box::new(inner), alias.to_string()))
    }

    fn with_from(from: FromItem) -> Self {
        Self {
            columns: Vec::new(),
            from,
            joins: Vec::new(),
            conditions: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            limit: Limit::default(),
            fetch: Fetch::default(),
        }
    }

    /// Set the SELECT columns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn join(mut self, join: JoinItem) -> Self {
        self.joins.push(join);
        self
    }

    pub fn joins(mut self, joins: impl IntoIterator<Item = JoinItem>) -> Self {
        self.joins.extend(joins);
        self
    }

    pub fn and_where(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn conditions(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    pub fn group_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn having(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.having.extend(conditions);
        self
    }

    pub fn order_by(mut self, item: SortItem) -> Self {
        self.order_by.push(item);
        self
    }

    pub fn order_by_items(mut self, items: impl IntoIterator<Item = SortItem>) -> Self {
        self.order_by.extend(items);
        self
    }

    pub fn limit(mut self, limit: Limit) -> Self {
        self.limit = limit;
        self
    }

    pub fn fetch(mut self, fetch: Fetch) -> Self {
        self.fetch = fetch;
        self
    }

    /// Clear LIMIT/OFFSET and return what was set.
    pub fn remove_limit(&mut self) -> Limit {
        std::mem::take(&mut self.limit)
    }

    /// Clear OFFSET/FETCH and return what was set.
    pub fn remove_fetch(&mut self) -> Fetch {
        std::mem::take(&mut self.fetch)
    }

    /// `SELECT COUNT(*) AS total FROM (<self without pagination>) AS alias`.
    pub fn count_wrapper(&self, alias: &str) -> SelectQb {
        let mut inner = self.clone();
        inner.remove_limit();
        inner.remove_fetch();
        SelectQb::from_subquery(inner, alias).columns(["COUNT(*) AS total"])
    }

    fn render_pagination(&self, dialect: Dialect, out: &mut String) {
        if self.limit.is_set() {
            out.push_str(&format!(" LIMIT {}", self.limit.limit));
            if self.limit.offset > 0 {
                out.push_str(&format!(" OFFSET {}", self.limit.offset));
            }
        }
        if self.fetch.is_set() {
            match dialect {
                Dialect::Postgres => out.push_str(&format!(
                    " OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
                    self.fetch.offset, self.fetch.fetch
                )),
                // MySQL has no FETCH clause.
                Dialect::MySql => out.push_str(&format!(
                    " LIMIT {} OFFSET {}",
                    self.fetch.fetch, self.fetch.offset
                )),
            }
        }
    }
}

impl SqlQb for SelectQb {
    fn render(&self, params: &mut ParamList, out: &mut String) -> OrmResult<()> {
        out.push_str("SELECT ");
        if self.columns.is_empty() {
            out.push('*');
        } else {
            out.push_str(&self.columns.join(", "));
        }

        out.push_str(" FROM ");
        match &self.from {
            FromItem::Table(table) => out.push_str(table),
            FromItem::Subquery(inner, alias) => {
                out.push('(');
                inner.render(params, out)?;
                out.push_str(&format!(") AS {alias}"));
            }
        }

        for join in &self.joins {
            out.push_str(&format!(" {} {}", join.join.as_sql(), join.table));
            if join.join != JoinType::Cross {
                out.push_str(" ON ");
                render_conditions(std::slice::from_ref(&join.condition), params, out)?;
            }
        }

        if !self.conditions.is_empty() {
            out.push_str(" WHERE ");
            render_conditions(&self.conditions, params, out)?;
        }

        if !self.group_by.is_empty() {
            out.push_str(" GROUP BY ");
            out.push_str(&self.group_by.join(", "));
        }

        if !self.having.is_empty() {
            out.push_str(" HAVING ");
            render_conditions(&self.having, params, out)?;
        }

        if !self.order_by.is_empty() {
            let items: Vec<String> = self
                .order_by
                .iter()
                .map(|item| format!("{} {}", item.field, item.direction.as_sql()))
                .collect();
            out.push_str(" ORDER BY ");
            out.push_str(&items.join(", "));
        }

        self.render_pagination(params.dialect(), out);
        Ok(())
    }
}
