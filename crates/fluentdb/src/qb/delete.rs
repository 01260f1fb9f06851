//! DELETE query builder.

use crate::condition::Condition;
use crate::error::{OrmError, OrmResult};
use crate::qb::expr::render_conditions;
use crate::qb::param::ParamList;
use crate::qb::traits::SqlQb;

/// DELETE builder. Refuses to render without a WHERE that filters rows.
#[derive(Clone, Debug)]
pub struct DeleteQb {
    table: String,
    conditions: Vec<Condition>,
}

impl DeleteQb {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            conditions: Vec::new(),
        }
    }

    pub fn and_where(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn conditions(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.extend(conditions);
        self
    }
}

impl SqlQb for DeleteQb {
    fn render(&self, params: &mut ParamList, out: &mut String) -> OrmResult<()> {
        if Condition::matches_everything(&self.conditions) {
            return Err(OrmError::MissingPredicate("DELETE"));
        }
        out.push_str(&format!("DELETE FROM {} WHERE ", self.table));
        render_conditions(&self.conditions, params, out)
    }
}
