//! Expression nodes: anything producing a scalar, row or boolean value.

use super::operators::{ArithOp, BoolOp, CompareOp};
use super::statements::Select;
use super::values::{Value, ValueKind};
use super::Node;
use crate::error::{SqlError, SqlResult};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a constant node, stable across clones.
///
/// A binder keys its node → placeholder associations by this id, so the same
/// node rendered twice against one binder reuses its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Column reference, optionally qualified by a table name or alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldName {
    pub column: String,
    pub table: Option<String>,
}

impl FieldName {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            table: None,
        }
    }

    /// Column owned by `table` (a table name or an alias).
    pub fn of(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            table: Some(table.into()),
        }
    }
}

impl From<&str> for FieldName {
    /// `"t.col"` is read as a qualified reference.
    fn from(s: &str) -> Self {
        match s.split_once('.') {
            Some((table, column)) => FieldName::of(table, column),
            None => FieldName::new(s),
        }
    }
}

/// A scalar constant, bound as a placeholder when rendered.
#[derive(Debug, Clone)]
pub struct ConstantValue {
    id: NodeId,
    value: Value,
}

impl ConstantValue {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            id: NodeId::next(),
            value: value.into(),
        }
    }

    /// Build from dynamic input; arrays and objects are rejected.
    pub fn from_json(json: serde_json::Value) -> SqlResult<Self> {
        Ok(Self::new(Value::from_json(json)?))
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }
}

impl PartialEq for ConstantValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Homogeneous list of scalars.
#[derive(Debug, Clone)]
pub struct ConstantArray {
    id: NodeId,
    items: Vec<Value>,
    kind: Option<ValueKind>,
}

impl ConstantArray {
    /// Every element must be a non-null, non-binary scalar of the same kind.
    pub fn new<I, V>(items: I) -> SqlResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let items: Vec<Value> = items.into_iter().map(Into::into).collect();
        let mut kind = None;
        for item in &items {
            let item_kind = item.kind();
            if matches!(item_kind, ValueKind::Null | ValueKind::Binary) {
                return Err(SqlError::InvalidValue(format!(
                    "array elements must be scalar, got {:?}",
                    item_kind
                )));
            }
            match kind {
                None => kind = Some(item_kind),
                Some(k) if k != item_kind => {
                    return Err(SqlError::InvalidValue(format!(
                        "array elements must share one kind, got {:?} and {:?}",
                        k, item_kind
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(Self {
            id: NodeId::next(),
            items,
            kind,
        })
    }

    /// Build from a JSON array; nested arrays and objects are rejected.
    pub fn from_json(json: serde_json::Value) -> SqlResult<Self> {
        match json {
            serde_json::Value::Array(items) => {
                let values = items
                    .into_iter()
                    .map(Value::from_json)
                    .collect::<SqlResult<Vec<_>>>()?;
                Self::new(values)
            }
            other => Err(SqlError::InvalidValue(format!(
                "expected a JSON array, got {}",
                other
            ))),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Element kind, `None` for an empty list.
    pub fn kind(&self) -> Option<ValueKind> {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PartialEq for ConstantArray {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

/// Binary comparison. `=`/`!=` against NULL renders as `IS [NOT] NULL`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOperator {
    pub op: CompareOp,
    pub left: Node,
    pub right: Node,
}

impl ComparisonOperator {
    pub fn new(op: &str, left: impl Into<Node>, right: impl Into<Node>) -> SqlResult<Self> {
        Self::compare(op.parse()?, left, right)
    }

    pub fn compare(op: CompareOp, left: impl Into<Node>, right: impl Into<Node>) -> SqlResult<Self> {
        Ok(Self {
            op,
            left: expect_expression(left.into(), "comparison operand")?,
            right: expect_expression(right.into(), "comparison operand")?,
        })
    }

    /// `field <op> value`, the shape most predicates take.
    pub fn field(column: impl Into<FieldName>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            op,
            left: Node::FieldName(column.into()),
            right: constant_or_null(value.into()),
        }
    }

    /// True when one side is NULL and the operator is `=` or `!=`.
    pub fn is_null_check(&self) -> bool {
        matches!(self.op, CompareOp::Eq | CompareOp::Ne)
            && (self.left.is_null_literal() || self.right.is_null_literal())
    }
}

/// N-ary `AND` / `OR`.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanOperator {
    pub op: BoolOp,
    pub operands: Vec<Node>,
}

impl BooleanOperator {
    pub fn new<I, N>(op: &str, operands: I) -> SqlResult<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        Self::combine(op.parse()?, operands)
    }

    pub fn combine<I, N>(op: BoolOp, operands: I) -> SqlResult<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        let operands = operands
            .into_iter()
            .map(|n| expect_expression(n.into(), "boolean operand"))
            .collect::<SqlResult<Vec<_>>>()?;
        if operands.is_empty() {
            return Err(SqlError::InvalidValue(format!(
                "{} needs at least one operand",
                op.sql_symbol()
            )));
        }
        Ok(Self { op, operands })
    }

    pub fn and<I, N>(operands: I) -> SqlResult<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        Self::combine(BoolOp::And, operands)
    }

    pub fn or<I, N>(operands: I) -> SqlResult<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        Self::combine(BoolOp::Or, operands)
    }
}

/// `NOT <operand>`
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOperator {
    pub operand: Node,
}

impl UnaryOperator {
    pub fn new(op: &str, operand: impl Into<Node>) -> SqlResult<Self> {
        if !op.trim().eq_ignore_ascii_case("NOT") {
            return Err(SqlError::InvalidOperator(op.to_string()));
        }
        Self::not(operand)
    }

    pub fn not(operand: impl Into<Node>) -> SqlResult<Self> {
        Ok(Self {
            operand: expect_expression(operand.into(), "NOT operand")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArithmeticOperator {
    pub op: ArithOp,
    pub left: Node,
    pub right: Node,
}

impl ArithmeticOperator {
    pub fn new(op: &str, left: impl Into<Node>, right: impl Into<Node>) -> SqlResult<Self> {
        Self::apply(op.parse()?, left, right)
    }

    pub fn apply(op: ArithOp, left: impl Into<Node>, right: impl Into<Node>) -> SqlResult<Self> {
        Ok(Self {
            op,
            left: expect_expression(left.into(), "arithmetic operand")?,
            right: expect_expression(right.into(), "arithmetic operand")?,
        })
    }
}

/// Function call. `COUNT` over a wildcard renders as `COUNT(*)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFunction {
    pub name: String,
    pub args: Vec<Node>,
}

impl SqlFunction {
    pub fn new<I, N>(name: &str, args: I) -> SqlResult<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        let valid = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(SqlError::InvalidValue(format!(
                "'{}' is not a valid function name",
                name
            )));
        }
        let args = args
            .into_iter()
            .map(|a| expect_expression(a.into(), "function argument"))
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(Self {
            name: name.to_string(),
            args,
        })
    }

    /// `COUNT(*)`
    pub fn count_all() -> Self {
        Self {
            name: "COUNT".to_string(),
            args: vec![Node::Wildcard(Wildcard::all())],
        }
    }

    pub fn is_count(&self) -> bool {
        self.name.eq_ignore_ascii_case("count")
    }
}

/// A nested SELECT used as a value.
#[derive(Debug, Clone, PartialEq)]
pub struct SubQuery {
    pub query: Select,
}

impl SubQuery {
    pub fn new(query: Select) -> Self {
        Self { query }
    }
}

/// A nested SELECT used as a row source; always aliased.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSubQuery {
    pub query: Select,
    pub alias: String,
}

impl SourceSubQuery {
    pub fn new(query: Select, alias: impl Into<String>) -> SqlResult<Self> {
        let alias = alias.into();
        if alias.trim().is_empty() {
            return Err(SqlError::InvalidValue(
                "a sub-query used as a row source needs an alias".to_string(),
            ));
        }
        Ok(Self { query, alias })
    }
}

/// `field` matches any element of a constant list.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualsOneOf {
    pub field: FieldName,
    pub values: ConstantArray,
}

impl EqualsOneOf {
    pub fn new(field: impl Into<FieldName>, values: ConstantArray) -> Self {
        Self {
            field: field.into(),
            values,
        }
    }
}

/// `*` or `table.*`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Wildcard {
    pub table: Option<String>,
}

impl Wildcard {
    pub fn all() -> Self {
        Self { table: None }
    }

    pub fn of(table: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
        }
    }
}

/// Raw SQL fragment rendered verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSql {
    pub sql: String,
}

impl CustomSql {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }
}

fn constant_or_null(value: Value) -> Node {
    if value.is_null() {
        Node::Null
    } else {
        Node::Constant(ConstantValue::new(value))
    }
}

/// Reject statement and clause nodes where an expression is required.
pub(crate) fn expect_expression(node: Node, context: &str) -> SqlResult<Node> {
    if node.is_expression() {
        Ok(node)
    } else {
        Err(SqlError::InvalidValue(format!(
            "{} must be an expression, got {}",
            context,
            node.kind_name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_identity_survives_clone() {
        let c = ConstantValue::new(5);
        let copy = c.clone();
        assert_eq!(c.id(), copy.id());
        assert_ne!(c.id(), ConstantValue::new(5).id());
    }

    #[test]
    fn test_constant_array_is_homogeneous() {
        assert!(ConstantArray::new([1, 2, 3]).is_ok());
        assert!(ConstantArray::new(vec![Value::Int(1), Value::from("a")]).is_err());
        assert!(ConstantArray::new(vec![Value::Int(1), Value::Null]).is_err());
        assert!(ConstantArray::from_json(serde_json::json!([[1], [2]])).is_err());
        assert!(ConstantArray::new(Vec::<i64>::new()).unwrap().kind().is_none());
    }

    #[test]
    fn test_operator_construction_errors() {
        assert!(matches!(
            ComparisonOperator::new("===", FieldName::new("a"), ConstantValue::new(1)),
            Err(SqlError::InvalidOperator(_))
        ));
        assert!(ArithmeticOperator::new("%", FieldName::new("a"), ConstantValue::new(1)).is_err());
        assert!(BooleanOperator::new("XOR", [FieldName::new("a")]).is_err());
        assert!(UnaryOperator::new("NEG", FieldName::new("a")).is_err());
    }

    #[test]
    fn test_operands_must_be_expressions() {
        let err = ComparisonOperator::new(
            "=",
            FieldName::new("a"),
            Node::Limit(crate::ast::LimitClause::new(1)),
        )
        .unwrap_err();
        assert!(err.to_string().contains("must be an expression"));
    }

    #[test]
    fn test_function_name_is_identifier() {
        assert!(SqlFunction::new("lower", [FieldName::new("a")]).is_ok());
        assert!(SqlFunction::new("drop table x; --", Vec::<Node>::new()).is_err());
    }

    #[test]
    fn test_null_check_detection() {
        let cmp = ComparisonOperator::field("a", CompareOp::Eq, Value::Null);
        assert!(cmp.is_null_check());
        let cmp = ComparisonOperator::field("a", CompareOp::Lt, Value::Null);
        assert!(!cmp.is_null_check());
    }

    #[test]
    fn test_qualified_field_from_str() {
        assert_eq!(FieldName::from("u.id"), FieldName::of("u", "id"));
        assert_eq!(FieldName::from("id"), FieldName::new("id"));
    }
}
