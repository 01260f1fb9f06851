//! Rendering tests for the qb module.

use crate::condition::{
    Condition, Fetch, JoinItem, JoinType, Limit, OrderByDir, SortItem, ValueField, WhereBuilder,
    WhereOpt,
};
use crate::error::OrmError;
use crate::qb::{Dialect, SqlQb, delete_from, insert_into, select_from, update};
use crate::value::Value;

#[test]
fn test_select_basic() {
    let qb = select_from("users");
    assert_eq!(qb.to_sql(), "SELECT * FROM users");
}

#[test]
fn test_select_with_conditions() {
    let (sql, args) = select_from("users")
        .columns(["id", "name"])
        .and_where(Condition::new("status", WhereOpt::Eq, "active"))
        .and_where(Condition::new("age", WhereOpt::Greater, 18).or())
        .limit(Limit { limit: 10, offset: 20 })
        .sql(Dialect::Postgres)
        .unwrap();

    assert_eq!(
        sql,
        "SELECT id, name FROM users WHERE status = $1 OR age > $2 LIMIT 10 OFFSET 20"
    );
    assert_eq!(args, vec![Value::String("active".into()), Value::I32(18)]);
}

#[test]
fn test_select_mysql_placeholders() {
    let (sql, _) = select_from("users")
        .and_where(Condition::new("a", WhereOpt::Eq, 1))
        .and_where(Condition::new("b", WhereOpt::In, vec![2, 3]))
        .sql(Dialect::MySql)
        .unwrap();
    assert_eq!(sql, "SELECT * FROM users WHERE a = ? AND b IN (?, ?)");
}

#[test]
fn test_groups_render_parenthesized() {
    let nested = WhereBuilder::new()
        .and_where("age", WhereOpt::GrEq, 18)
        .or_where("vip", WhereOpt::Eq, true)
        .into_conditions();
    let (sql, args) = select_from("users")
        .and_where(Condition::new("active", WhereOpt::Eq, true))
        .and_where(Condition::group(nested, Default::default()))
        .sql(Dialect::Postgres)
        .unwrap();

    assert_eq!(
        sql,
        "SELECT * FROM users WHERE active = $1 AND (age >= $2 OR vip = $3)"
    );
    assert_eq!(args.len(), 3);
}

#[test]
fn test_operators_without_and_with_ranges() {
    let (sql, args) = select_from("t")
        .and_where(Condition::new("deleted_at", WhereOpt::Null, ()))
        .and_where(Condition::new("score", WhereOpt::Between, (1, 5)))
        .and_where(Condition::new("name", WhereOpt::NotLike, "%x%"))
        .and_where(Condition::new("id", WhereOpt::NotIn, Vec::<i64>::new()))
        .sql(Dialect::Postgres)
        .unwrap();

    assert_eq!(
        sql,
        "SELECT * FROM t WHERE deleted_at IS NULL AND score BETWEEN $1 AND $2 AND name NOT LIKE $3 AND 1=1"
    );
    assert_eq!(args.len(), 3);
}

#[test]
fn test_empty_in_list_matches_nothing() {
    let sql = select_from("t")
        .and_where(Condition::new("id", WhereOpt::In, Vec::<i64>::new()))
        .to_sql();
    assert_eq!(sql, "SELECT * FROM t WHERE 1=0");
}

#[test]
fn test_operator_needs_value() {
    let err = select_from("t")
        .and_where(Condition::new("id", WhereOpt::Eq, ()))
        .sql(Dialect::Postgres)
        .unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
}

#[test]
fn test_joins_group_having_order() {
    let (sql, args) = select_from("users")
        .columns(["users.id", "COUNT(posts.id) AS posts"])
        .join(JoinItem {
            join: JoinType::Left,
            table: "posts".into(),
            condition: Condition::new("posts.user_id", WhereOpt::Eq, ValueField::new("users.id")),
        })
        .join(JoinItem {
            join: JoinType::Cross,
            table: "settings".into(),
            condition: Condition::default(),
        })
        .group_by(["users.id"])
        .having([Condition::new("COUNT(posts.id)", WhereOpt::Greater, 2)])
        .order_by(SortItem {
            field: "users.id".into(),
            direction: OrderByDir::Desc,
        })
        .sql(Dialect::Postgres)
        .unwrap();

    assert_eq!(
        sql,
        "SELECT users.id, COUNT(posts.id) AS posts FROM users \
         LEFT JOIN posts ON posts.user_id = users.id CROSS JOIN settings \
         GROUP BY users.id HAVING COUNT(posts.id) > $1 ORDER BY users.id DESC"
    );
    assert_eq!(args, vec![Value::I32(2)]);
}

#[test]
fn test_fetch_per_dialect() {
    let qb = select_from("t").fetch(Fetch { offset: 5, fetch: 10 });
    assert_eq!(
        qb.sql(Dialect::Postgres).unwrap().0,
        "SELECT * FROM t OFFSET 5 ROWS FETCH NEXT 10 ROWS ONLY"
    );
    assert_eq!(
        qb.sql(Dialect::MySql).unwrap().0,
        "SELECT * FROM t LIMIT 10 OFFSET 5"
    );
}

#[test]
fn test_count_wrapper_strips_pagination() {
    let mut qb = select_from("users")
        .and_where(Condition::new("age", WhereOpt::Greater, 18))
        .limit(Limit { limit: 10, offset: 0 })
        .fetch(Fetch { offset: 0, fetch: 5 });

    let (sql, args) = qb.count_wrapper("_result_out_").sql(Dialect::Postgres).unwrap();
    assert_eq!(
        sql,
        "SELECT COUNT(*) AS total FROM (SELECT * FROM users WHERE age > $1) AS _result_out_"
    );
    assert_eq!(args, vec![Value::I32(18)]);

    // The wrapped builder keeps its pagination.
    assert_eq!(qb.remove_limit(), Limit { limit: 10, offset: 0 });
    assert_eq!(qb.remove_fetch(), Fetch { offset: 0, fetch: 5 });
    assert_eq!(qb.remove_limit(), Limit::default());
}

#[test]
fn test_insert_basic() {
    let (sql, args) = insert_into("users")
        .set("name", "Ann")
        .set("age", 30)
        .returning("id")
        .sql(Dialect::Postgres)
        .unwrap();
    assert_eq!(sql, "INSERT INTO users (name, age) VALUES ($1, $2) RETURNING id");
    assert_eq!(args, vec![Value::String("Ann".into()), Value::I32(30)]);

    let (sql, _) = insert_into("users")
        .set("name", "Ann")
        .returning("id")
        .sql(Dialect::MySql)
        .unwrap();
    assert_eq!(sql, "INSERT INTO users (name) VALUES (?)");
}

#[test]
fn test_insert_defaults() {
    assert_eq!(
        insert_into("logs").sql(Dialect::Postgres).unwrap().0,
        "INSERT INTO logs DEFAULT VALUES"
    );
    assert_eq!(
        insert_into("logs").sql(Dialect::MySql).unwrap().0,
        "INSERT INTO logs () VALUES ()"
    );
}

#[test]
fn test_update_basic() {
    let (sql, args) = update("users")
        .set("status", "inactive")
        .and_where(Condition::new("id", WhereOpt::Eq, 1i64))
        .sql(Dialect::Postgres)
        .unwrap();
    assert_eq!(sql, "UPDATE users SET status = $1 WHERE id = $2");
    assert_eq!(args.len(), 2);
}

#[test]
fn test_update_requires_where_and_set() {
    let err = update("users").set("status", "x").sql(Dialect::Postgres).unwrap_err();
    assert!(matches!(err, OrmError::MissingPredicate("UPDATE")));

    let err = update("users")
        .and_where(Condition::new("id", WhereOpt::Eq, 1))
        .sql(Dialect::Postgres)
        .unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
}

#[test]
fn test_delete_basic() {
    let sql = delete_from("users")
        .and_where(Condition::new("id", WhereOpt::Eq, 1i64))
        .to_sql();
    assert_eq!(sql, "DELETE FROM users WHERE id = $1");
}

#[test]
fn test_delete_requires_where() {
    let err = delete_from("users").sql(Dialect::Postgres).unwrap_err();
    assert!(matches!(err, OrmError::MissingPredicate("DELETE")));
    assert_eq!(delete_from("users").to_sql(), "");
}

#[test]
fn test_empty_not_in_is_not_a_predicate() {
    let err = delete_from("users")
        .and_where(Condition::new("id", WhereOpt::NotIn, Vec::<i64>::new()))
        .sql(Dialect::Postgres)
        .unwrap_err();
    assert!(matches!(err, OrmError::MissingPredicate("DELETE")));

    let err = update("users")
        .set("status", "x")
        .and_where(Condition::new("id", WhereOpt::NotIn, Vec::<i64>::new()))
        .sql(Dialect::Postgres)
        .unwrap_err();
    assert!(matches!(err, OrmError::MissingPredicate("UPDATE")));

    let (sql, _) = select_from("users")
        .and_where(Condition::new("id", WhereOpt::NotIn, Vec::<i64>::new()))
        .sql(Dialect::Postgres)
        .unwrap();
    assert_eq!(sql, "SELECT * FROM users WHERE 1=1");
}
