//! Structured clause objects: conditions, joins, ordering and pagination.
//!
//! These are plain data. Rendering into SQL text happens in [`crate::qb`].

use crate::value::Value;

/// Comparison operator of a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhereOpt {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `!=`
    Diff,
    /// `>`
    Greater,
    /// `<`
    Lesser,
    /// `>=`
    GrEq,
    /// `<=`
    LeEq,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
    NotBetween,
    /// `IS NULL`, takes no value
    Null,
    /// `IS NOT NULL`, takes no value
    NotNull,
}

impl WhereOpt {
    pub fn as_sql(self) -> &'static str {
        match self {
            WhereOpt::Eq => "=",
            WhereOpt::NotEq => "<>",
            WhereOpt::Diff => "!=",
            WhereOpt::Greater => ">",
            WhereOpt::Lesser => "<",
            WhereOpt::GrEq => ">=",
            WhereOpt::LeEq => "<=",
            WhereOpt::Like => "LIKE",
            WhereOpt::NotLike => "NOT LIKE",
            WhereOpt::In => "IN",
            WhereOpt::NotIn => "NOT IN",
            WhereOpt::Between => "BETWEEN",
            WhereOpt::NotBetween => "NOT BETWEEN",
            WhereOpt::Null => "IS NULL",
            WhereOpt::NotNull => "IS NOT NULL",
        }
    }
}

/// Logical connector to the previous condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AndOr {
    #[default]
    And,
    Or,
}

/// A column reference used as the right-hand side of a condition.
///
/// `Condition::new("posts.user_id", WhereOpt::Eq, ValueField::new("users.id"))`
/// renders `posts.user_id = users.id` instead of binding a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueField(pub String);

impl ValueField {
    pub fn new(column: impl Into<String>) -> Self {
        Self(column.into())
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Operand {
    #[default]
    None,
    Value(Value),
    Field(ValueField),
    List(Vec<Value>),
    Range(Value, Value),
}

macro_rules! impl_operand_from_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl From<$ty> for Operand {
            fn from(v: $ty) -> Self {
                Operand::Value(Value::from(v))
            }
        }
    )*};
}

impl_operand_from_scalar!(
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    &str,
    serde_json::Value,
    uuid::Uuid,
    chrono::NaiveDate,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
);

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

impl From<ValueField> for Operand {
    fn from(v: ValueField) -> Self {
        Operand::Field(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(v: Vec<T>) -> Self {
        Operand::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<(T, T)> for Operand {
    fn from((low, high): (T, T)) -> Self {
        Operand::Range(low.into(), high.into())
    }
}

impl From<()> for Operand {
    fn from(_: ()) -> Self {
        Operand::None
    }
}

/// One WHERE/HAVING/ON predicate, or a parenthesized group of them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Condition {
    pub field: String,
    pub opt: Option<WhereOpt>,
    pub value: Operand,
    pub and_or: AndOr,
    /// Non-empty for a group; `field`/`opt`/`value` are then unused.
    pub group: Vec<Condition>,
}

impl Condition {
    pub fn new(field: impl Into<String>, opt: WhereOpt, value: impl Into<Operand>) -> Self {
        Self {
            field: field.into(),
            opt: Some(opt),
            value: value.into(),
            and_or: AndOr::And,
            group: Vec::new(),
        }
    }

    pub fn or(mut self) -> Self {
        self.and_or = AndOr::Or;
        self
    }

    pub fn group(conditions: Vec<Condition>, and_or: AndOr) -> Self {
        Self {
            and_or,
            group: conditions,
            ..Self::default()
        }
    }

    pub fn is_group(&self) -> bool {
        !self.group.is_empty()
    }

    /// `NOT IN` over an empty list holds for every row.
    fn is_trivially_true(&self) -> bool {
        if self.is_group() {
            return Condition::matches_everything(&self.group);
        }
        matches!(
            (self.opt, &self.value),
            (Some(WhereOpt::NotIn), Operand::List(values)) if values.is_empty()
        )
    }

    /// Whether `conditions` filter nothing out: the list is empty, or one
    /// OR-separated run of AND-ed conditions is made only of trivially true ones.
    pub fn matches_everything(conditions: &[Condition]) -> bool {
        let mut run_is_trivial = true;
        for (i, condition) in conditions.iter().enumerate() {
            if i > 0 && condition.and_or == AndOr::Or {
                if run_is_trivial {
                    return true;
                }
                run_is_trivial = true;
            }
            run_is_trivial &= condition.is_trivially_true();
        }
        run_is_trivial
    }
}

/// Nested condition builder handed to `where_group` and `when` callbacks.
#[derive(Debug, Clone, Default)]
pub struct WhereBuilder {
    conditions: Vec<Condition>,
}

impl WhereBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and_where(
        mut self,
        field: impl Into<String>,
        opt: WhereOpt,
        value: impl Into<Operand>,
    ) -> Self {
        self.conditions.push(Condition::new(field, opt, value));
        self
    }

    pub fn or_where(
        mut self,
        field: impl Into<String>,
        opt: WhereOpt,
        value: impl Into<Operand>,
    ) -> Self {
        self.conditions.push(Condition::new(field, opt, value).or());
        self
    }

    /// Nested parenthesized group, joined with AND.
    pub fn where_group(self, build: impl FnOnce(WhereBuilder) -> WhereBuilder) -> Self {
        self.push_group(build, AndOr::And)
    }

    /// Nested parenthesized group, joined with OR.
    pub fn or_where_group(self, build: impl FnOnce(WhereBuilder) -> WhereBuilder) -> Self {
        self.push_group(build, AndOr::Or)
    }

    fn push_group(
        mut self,
        build: impl FnOnce(WhereBuilder) -> WhereBuilder,
        and_or: AndOr,
    ) -> Self {
        let nested = build(WhereBuilder::new()).conditions;
        if !nested.is_empty() {
            self.conditions.push(Condition::group(nested, and_or));
        }
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn into_conditions(self) -> Vec<Condition> {
        self.conditions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    FullOuter,
    Cross,
}

impl JoinType {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::FullOuter => "FULL OUTER JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinItem {
    pub join: JoinType,
    pub table: String,
    /// Ignored for `CROSS JOIN`.
    pub condition: Condition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderByDir {
    #[default]
    Asc,
    Desc,
}

impl OrderByDir {
    pub fn as_sql(self) -> &'static str {
        match self {
            OrderByDir::Asc => "ASC",
            OrderByDir::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortItem {
    pub field: String,
    pub direction: OrderByDir,
}

/// `LIMIT limit OFFSET offset`; a zero limit means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limit {
    pub limit: u64,
    pub offset: u64,
}

impl Limit {
    pub fn is_set(&self) -> bool {
        self.limit > 0
    }
}

/// `OFFSET offset ROWS FETCH NEXT fetch ROWS ONLY`; a zero fetch means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fetch {
    pub offset: u64,
    pub fetch: u64,
}

impl Fetch {
    pub fn is_set(&self) -> bool {
        self.fetch > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_holds_nested_conditions() {
        let builder = WhereBuilder::new()
            .and_where("status", WhereOpt::Eq, "active")
            .where_group(|w| {
                w.and_where("age", WhereOpt::Greater, 18)
                    .or_where("vip", WhereOpt::Eq, true)
            });

        let conditions = builder.into_conditions();
        assert_eq!(conditions.len(), 2);
        let group = &conditions[1];
        assert!(group.is_group());
        assert_eq!(group.and_or, AndOr::And);
        assert_eq!(group.group.len(), 2);
        assert_eq!(group.group[0].field, "age");
        assert_eq!(group.group[1].and_or, AndOr::Or);
    }

    #[test]
    fn detects_conditions_that_filter_nothing() {
        let everything = Condition::new("id", WhereOpt::NotIn, Vec::<i64>::new());
        let id = Condition::new("id", WhereOpt::Eq, 1);

        assert!(Condition::matches_everything(&[]));
        assert!(Condition::matches_everything(&[everything.clone()]));
        assert!(Condition::matches_everything(&[id.clone(), everything.clone().or()]));
        assert!(Condition::matches_everything(&[Condition::group(
            vec![everything.clone()],
            AndOr::And,
        )]));

        assert!(!Condition::matches_everything(&[id.clone()]));
        assert!(!Condition::matches_everything(&[everything.clone(), id.clone()]));
        assert!(!Condition::matches_everything(&[Condition::new(
            "id",
            WhereOpt::In,
            Vec::<i64>::new(),
        )]));
    }

    #[test]
    fn empty_group_is_dropped() {
        let conditions = WhereBuilder::new().where_group(|w| w).into_conditions();
        assert!(conditions.is_empty());
    }

    #[test]
    fn operands_from_rust_values() {
        assert_eq!(Operand::from(5), Operand::Value(Value::I32(5)));
        assert_eq!(
            Operand::from(vec![1i64, 2]),
            Operand::List(vec![Value::I64(1), Value::I64(2)])
        );
        assert_eq!(
            Operand::from((1, 9)),
            Operand::Range(Value::I32(1), Value::I32(9))
        );
        assert_eq!(
            Operand::from(ValueField::new("users.id")),
            Operand::Field(ValueField("users.id".into()))
        );
        assert_eq!(Operand::from(()), Operand::None);
    }
}
