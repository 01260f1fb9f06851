//! UPDATE query builder.

use crate::condition::Condition;
use crate::error::{OrmError, OrmResult};
use crate::qb::expr::render_conditions;
use crate::qb::param::ParamList;
use crate::qb::traits::SqlQb;
use crate::value::Value;

/// UPDATE builder. Refuses to render without SET or a WHERE that filters rows.
#[derive(Clone, Debug)]
pub struct UpdateQb {
    table: String,
    sets: Vec<(String, Value)>,
    conditions: Vec<Condition>,
}

impl UpdateQb {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            sets: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// Add SET column = value.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.sets.push((column.to_string(), value.into()));
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
}

impl SqlQb for UpdateQb {
    fn render(&self, params: &mut ParamList, out: &mut String) -> OrmResult<()> {
        if self.sets.is_empty() {
            return Err(OrmError::validation(format!(
                "UPDATE {} has no columns to set",
                self.table
            )));
        }
        if Condition::matches_everything(&self.conditions) {
            return Err(OrmError::MissingPredicate("UPDATE"));
        }

        let assignments: Vec<String> = self
            .sets
            .iter()
            .map(|(column, value)| format!("{column} = {}", params.push(value.clone())))
            .collect();
        out.push_str(&format!(
            "UPDATE {} SET {} WHERE ",
            self.table,
            assignments.join(", ")
        ));
        render_conditions(&self.conditions, params, out)
    }
}
