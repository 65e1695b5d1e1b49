use super::pg;
use crate::ast::{
    BooleanOperator, CompareOp, ComparisonOperator, ConstantValue, Direction, FieldName,
    JoinClause, JoinKind, Node, Select, SourceSubQuery, SourceTableClause, SqlFunction, SubQuery,
    UnaryOperator, Value, count_query,
};
use crate::error::SqlError;
use crate::transpiler::{Driver, PostgresDriver};
use pretty_assertions::assert_eq;

#[test]
fn test_where_pairs_are_parenthesized() {
    let q = pg(Select::from("users").where_eq("foo", 1).where_eq("bar", "x"));
    assert_eq!(
        q.sql,
        "SELECT * FROM \"users\" WHERE (\"foo\" = :c0) AND (\"bar\" = :c1)"
    );
    assert_eq!(q.param("c0"), Some(&Value::Int(1)));
    assert_eq!(q.param("c1"), Some(&Value::from("x")));
}

#[test]
fn test_null_comparison_rewrite() {
    let q = pg(Select::from("users").where_eq("deleted_at", Value::Null));
    assert_eq!(q.sql, "SELECT * FROM \"users\" WHERE \"deleted_at\" IS NULL");
    assert!(q.params.is_empty());

    let not_null = ComparisonOperator::field("deleted_at", CompareOp::Ne, Value::Null);
    let q = pg(Select::from("users").filter(not_null).unwrap());
    assert_eq!(q.sql, "SELECT * FROM \"users\" WHERE \"deleted_at\" IS NOT NULL");
}

#[test]
fn test_fresh_binders_render_identically() {
    let node: Node = Select::from("users")
        .field("name")
        .where_eq("age", 30)
        .where_eq("city", "Oslo")
        .into();
    let driver = PostgresDriver::new();
    let first = driver.compile(&node).unwrap();
    let second = driver.compile(&node).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.params[0].key, "c0");
}

#[test]
fn test_shared_constant_reuses_key() {
    let value = ConstantValue::new(5);
    let either = BooleanOperator::or([
        Node::from(ComparisonOperator::compare(CompareOp::Eq, FieldName::new("a"), value.clone()).unwrap()),
        Node::from(ComparisonOperator::compare(CompareOp::Eq, FieldName::new("b"), value).unwrap()),
    ])
    .unwrap();
    let q = pg(Select::from("t").filter(either).unwrap());
    assert_eq!(q.sql, "SELECT * FROM \"t\" WHERE (\"a\" = :c0) OR (\"b\" = :c0)");
    assert_eq!(q.params.len(), 1);
}

#[test]
fn test_generated_projection_aliases() {
    let q = pg(Select::from(SourceTableClause::aliased("users", "u"))
        .field("u.id")
        .field("u.id")
        .field("name"));
    assert_eq!(
        q.sql,
        "SELECT \"u\".\"id\" AS \"u_id\", \"u\".\"id\" AS \"u_id_1\", \"name\" FROM \"users\" AS \"u\""
    );

    let q = pg(Select::from("orders")
        .expr(SqlFunction::count_all(), None)
        .unwrap()
        .field_as("total", "count"));
    assert_eq!(
        q.sql,
        "SELECT COUNT(*) AS \"count_1\", \"total\" AS \"count\" FROM \"orders\""
    );
}

#[test]
fn test_joins() {
    let q = pg(Select::from(SourceTableClause::aliased("users", "u"))
        .field("u.name")
        .join(
            JoinClause::on(
                JoinKind::Left,
                SourceTableClause::aliased("orders", "o"),
                "o.user_id",
                "u.id",
            )
            .unwrap(),
        )
        .join(JoinClause::with_kind(JoinKind::Cross, "tags", None).unwrap()));
    assert_eq!(
        q.sql,
        "SELECT \"u\".\"name\" AS \"u_name\" FROM \"users\" AS \"u\" \
         LEFT JOIN \"orders\" AS \"o\" ON \"o\".\"user_id\" = \"u\".\"id\" \
         CROSS JOIN \"tags\""
    );
}

#[test]
fn test_join_condition_rules() {
    assert!(matches!(
        JoinClause::new("INNER", "t", None),
        Err(SqlError::InvalidJoin(_))
    ));
    assert!(matches!(
        JoinClause::new("OUTER", "t", None),
        Err(SqlError::InvalidJoin(_)) | Err(SqlError::InvalidOperator(_))
    ));
}

#[test]
fn test_unaliased_self_join_is_ambiguous() {
    let select = Select::from("users").join(
        JoinClause::on(JoinKind::Inner, "users", "users.id", "users.parent_id").unwrap(),
    );
    let err = PostgresDriver::new().compile(&select.into()).unwrap_err();
    assert!(matches!(err, SqlError::AmbiguousTable(_)));
}

#[test]
fn test_unknown_owner_is_unresolved() {
    let select = Select::from("users").field("accounts.id");
    let err = PostgresDriver::new().compile(&select.into()).unwrap_err();
    assert!(matches!(err, SqlError::UnresolvedTable(ref t) if t == "accounts"));
}

#[test]
fn test_correlated_sub_query() {
    let inner = Select::from("orders")
        .expr(SqlFunction::count_all(), None)
        .unwrap()
        .filter(
            ComparisonOperator::compare(
                CompareOp::Eq,
                FieldName::from("orders.user_id"),
                FieldName::of("u", "id"),
            )
            .unwrap(),
        )
        .unwrap();
    let outer = Select::from(SourceTableClause::aliased("users", "u"))
        .field("u.name")
        .filter(
            ComparisonOperator::compare(CompareOp::Gt, SubQuery::new(inner), ConstantValue::new(0))
                .unwrap(),
        )
        .unwrap();
    let q = pg(outer);
    assert_eq!(
        q.sql,
        "SELECT \"u\".\"name\" AS \"u_name\" FROM \"users\" AS \"u\" WHERE \
         (SELECT COUNT(*) AS \"count\" FROM \"orders\" WHERE \"orders\".\"user_id\" = \"u\".\"id\") > :c0"
    );
    assert_eq!(q.param("c0"), Some(&Value::Int(0)));
}

#[test]
fn test_sub_query_alias_may_not_shadow() {
    let inner = Select::from(SourceTableClause::aliased("admins", "u")).field("u.id");
    let outer = Select::from(SourceTableClause::aliased("users", "u"))
        .filter(
            ComparisonOperator::compare(CompareOp::Eq, FieldName::of("u", "id"), SubQuery::new(inner))
                .unwrap(),
        )
        .unwrap();
    let err = PostgresDriver::new().compile(&outer.into()).unwrap_err();
    assert!(matches!(err, SqlError::AliasShadowing(ref a) if a == "u"));
}

#[test]
fn test_derived_table_source() {
    let recent = Select::from("orders").field("user_id").where_eq("status", "open");
    let q = pg(Select::from(SourceSubQuery::new(recent, "r").unwrap()).field("r.user_id"));
    assert_eq!(
        q.sql,
        "SELECT \"r\".\"user_id\" AS \"r_user_id\" FROM \
         (SELECT \"user_id\" FROM \"orders\" WHERE \"status\" = :c0) AS \"r\""
    );
}

#[test]
fn test_union_branches_have_their_own_scope() {
    let q = pg(Select::from("users")
        .field("id")
        .where_eq("active", true)
        .union_all(Select::from("users").field("id").where_eq("admin", true)));
    assert_eq!(
        q.sql,
        "SELECT \"id\" FROM \"users\" WHERE \"active\" = :c0 \
         UNION ALL SELECT \"id\" FROM \"users\" WHERE \"admin\" = :c1"
    );
    assert_eq!(q.param("c0"), Some(&Value::Bool(true)));
}

#[test]
fn test_unary_and_arithmetic_nesting() {
    let price = crate::ast::ArithmeticOperator::new("*", FieldName::new("price"), ConstantValue::new(2)).unwrap();
    let cmp = ComparisonOperator::compare(CompareOp::Gt, price, FieldName::new("budget")).unwrap();
    let q = pg(Select::from("items").filter(UnaryOperator::not(cmp).unwrap()).unwrap());
    assert_eq!(
        q.sql,
        "SELECT * FROM \"items\" WHERE NOT ((\"price\" * :c0) > \"budget\")"
    );
}

#[test]
fn test_order_limit_offset() {
    let q = pg(Select::from("users")
        .order_by("name", Direction::Asc)
        .order_by("id", Direction::Desc)
        .limit(10)
        .offset(20));
    assert_eq!(
        q.sql,
        "SELECT * FROM \"users\" ORDER BY \"name\" ASC, \"id\" DESC LIMIT 10 OFFSET 20"
    );
}

#[test]
fn test_count_query_rendering() {
    let select = Select::from("users")
        .field("name")
        .where_eq("active", true)
        .order_by("name", Direction::Asc)
        .limit(10);
    let q = pg(count_query(&select).unwrap());
    assert_eq!(
        q.sql,
        "SELECT COUNT(*) AS \"count\" FROM \"users\" WHERE \"active\" = :c0"
    );
}

#[test]
fn test_count_query_over_union_all() {
    let select = Select::from("a")
        .field("id")
        .union_all(Select::from("b").field("id"))
        .union_all(Select::from("c").field("id"));
    let q = pg(count_query(&select).unwrap());
    assert_eq!(
        q.sql,
        "SELECT ((SELECT COUNT(*) AS \"count\" FROM \"a\") + \
         (SELECT COUNT(*) AS \"count\" FROM \"b\")) + \
         (SELECT COUNT(*) AS \"count\" FROM \"c\") AS \"count\""
    );
}

#[test]
fn test_table_prefix_applies_to_physical_names_only() {
    let driver = PostgresDriver::with_prefix("app_");
    let select = Select::from(SourceTableClause::aliased("users", "u"))
        .field("u.id")
        .join(JoinClause::on(JoinKind::Inner, "teams", "teams.id", "u.team_id").unwrap());
    let q = driver.compile(&select.into()).unwrap();
    assert_eq!(
        q.sql,
        "SELECT \"u\".\"id\" AS \"u_id\" FROM \"app_users\" AS \"u\" \
         INNER JOIN \"app_teams\" ON \"app_teams\".\"id\" = \"u\".\"team_id\""
    );
}
