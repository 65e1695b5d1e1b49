use super::pg;
use crate::ast::{
    BooleanOperator, CompareOp, ComparisonOperator, ConstantArray, ConstantValue, Delete,
    Direction, DuplicateKey, EqualsOneOf, FieldName, Insert, JoinClause, JoinKind, Node, Select,
    Update, UpdateField, Value,
};
use crate::error::SqlError;
use crate::transpiler::{Driver, PlaceholderStyle, PostgresDriver};
use pretty_assertions::assert_eq;

#[test]
fn test_insert_with_upsert() {
    let insert = Insert::into_table("users")
        .value("name", "Ann")
        .value("age", 30)
        .on_duplicate(DuplicateKey::new(["name"]).unwrap().update(UpdateField::value("age", 31)));
    let q = pg(insert);
    assert_eq!(
        q.sql,
        "INSERT INTO \"users\" (\"name\", \"age\") VALUES (:c0, :c1) \
         ON CONFLICT (\"name\") DO UPDATE SET \"age\" = :c2"
    );
    assert_eq!(q.param("c2"), Some(&Value::Int(31)));
}

#[test]
fn test_upsert_without_assignments_does_nothing() {
    let insert = Insert::into_table("tags")
        .value("slug", "rust")
        .on_duplicate(DuplicateKey::new(["slug"]).unwrap());
    assert_eq!(
        pg(insert).sql,
        "INSERT INTO \"tags\" (\"slug\") VALUES (:c0) ON CONFLICT (\"slug\") DO NOTHING"
    );
}

#[test]
fn test_insert_defaults() {
    assert_eq!(
        pg(Insert::into_table("events")).sql,
        "INSERT INTO \"events\" DEFAULT VALUES"
    );
}

#[test]
fn test_insert_without_table_is_incomplete() {
    let err = PostgresDriver::new()
        .compile(&Insert::new().value("a", 1).into())
        .unwrap_err();
    assert!(matches!(err, SqlError::Incomplete(_)));
}

#[test]
fn test_equals_one_of_binds_array_literal() {
    let ids = ConstantArray::new([1, 2, 3]).unwrap();
    let q = pg(Select::from("users").filter(EqualsOneOf::new("id", ids)).unwrap());
    assert_eq!(
        q.sql,
        "SELECT * FROM \"users\" WHERE \"id\" = ANY(CAST(:c0 AS bigint[]))"
    );
    assert_eq!(q.param("c0"), Some(&Value::from("{1,2,3}")));

    let names = ConstantArray::new(["a\"b", "c"]).unwrap();
    let q = pg(Select::from("users").filter(EqualsOneOf::new("name", names)).unwrap());
    assert_eq!(
        q.sql,
        "SELECT * FROM \"users\" WHERE \"name\" = ANY(CAST(:c0 AS text[]))"
    );
    assert_eq!(q.param("c0"), Some(&Value::from(r#"{"a\"b","c"}"#)));
}

#[test]
fn test_empty_list_is_constant_false() {
    let none = ConstantArray::new(Vec::<i64>::new()).unwrap();
    let q = pg(Select::from("users").filter(EqualsOneOf::new("id", none)).unwrap());
    assert_eq!(q.sql, "SELECT * FROM \"users\" WHERE 1 = 0");
    assert!(q.params.is_empty());
}

#[test]
fn test_booleans_bind_natively() {
    let q = pg(Select::from("users").where_eq("active", true));
    assert_eq!(q.params[0].value, Value::Bool(true));
}

#[test]
fn test_ilike_is_native() {
    let cmp = ComparisonOperator::new("ILIKE", FieldName::new("name"), ConstantValue::new("a%")).unwrap();
    assert_eq!(
        pg(Select::from("users").filter(cmp).unwrap()).sql,
        "SELECT * FROM \"users\" WHERE \"name\" ILIKE :c0"
    );
}

#[test]
fn test_full_join_is_supported() {
    let q = pg(Select::from("a").join(
        JoinClause::on(JoinKind::Full, "b", "a.id", "b.a_id").unwrap(),
    ));
    assert_eq!(
        q.sql,
        "SELECT * FROM \"a\" FULL JOIN \"b\" ON \"a\".\"id\" = \"b\".\"a_id\""
    );
}

#[test]
fn test_update_and_delete() {
    let update = Update::table("users")
        .set("name", "Bo")
        .where_eq("id", 7);
    assert_eq!(
        pg(update).sql,
        "UPDATE \"users\" SET \"name\" = :c0 WHERE \"id\" = :c1"
    );

    let delete = Delete::from("sessions").where_eq("expired", true);
    assert_eq!(
        pg(delete).sql,
        "DELETE FROM \"sessions\" WHERE \"expired\" = :c0"
    );
}

#[test]
fn test_update_without_assignments_is_incomplete() {
    let err = PostgresDriver::new()
        .compile(&Update::table("users").where_eq("id", 1).into())
        .unwrap_err();
    assert!(matches!(err, SqlError::Incomplete(_)));
}

#[test]
fn test_ordered_mutations_are_not_implemented() {
    let driver = PostgresDriver::new();
    let update = Update::table("jobs")
        .set("state", "done")
        .order_by("id", Direction::Asc);
    assert!(driver.compile(&update.into()).unwrap_err().is_not_implemented());

    let delete = Delete::from("jobs").limit(10);
    let err = driver.compile(&delete.into()).unwrap_err();
    assert!(matches!(
        err,
        SqlError::NotImplemented { backend: "postgres", .. }
    ));
}

#[test]
fn test_positional_placeholders() {
    let q = pg(Select::from("users").where_eq("a", 1).where_eq("b", "x"));
    let positional = q.to_positional(PlaceholderStyle::Dollar);
    assert_eq!(
        positional.sql,
        "SELECT * FROM \"users\" WHERE (\"a\" = $1) AND (\"b\" = $2)"
    );
    assert_eq!(positional.params, vec![Value::Int(1), Value::from("x")]);
}

#[test]
fn test_positional_reuses_number_for_repeated_key() {
    let shared = ConstantValue::new(9);
    let either = BooleanOperator::or([
        Node::from(ComparisonOperator::compare(CompareOp::Eq, FieldName::new("a"), shared.clone()).unwrap()),
        Node::from(ComparisonOperator::compare(CompareOp::Eq, FieldName::new("b"), shared).unwrap()),
    ])
    .unwrap();
    let q = pg(Select::from("t").filter(either).unwrap());

    let dollar = q.to_positional(PlaceholderStyle::Dollar);
    assert_eq!(dollar.sql, "SELECT * FROM \"t\" WHERE (\"a\" = $1) OR (\"b\" = $1)");
    assert_eq!(dollar.params, vec![Value::Int(9)]);

    let question = q.to_positional(PlaceholderStyle::QuestionMark);
    assert_eq!(question.sql, "SELECT * FROM \"t\" WHERE (\"a\" = ?) OR (\"b\" = ?)");
    assert_eq!(question.params, vec![Value::Int(9), Value::Int(9)]);
}

#[test]
fn test_positional_skips_quoted_text_and_casts() {
    let mut q = crate::transpiler::CompiledQuery::new(
        "SELECT ':c0', x::text FROM \"t:c0\" WHERE a = :c0",
    );
    q.params.push(crate::binder::BoundParam {
        key: "c0".to_string(),
        value: Value::Int(1),
        kind: crate::ast::ValueKind::Integer,
    });
    let positional = q.to_positional(PlaceholderStyle::Dollar);
    assert_eq!(
        positional.sql,
        "SELECT ':c0', x::text FROM \"t:c0\" WHERE a = $1"
    );
}
