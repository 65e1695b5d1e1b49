//! Clause nodes: table references, joins, predicates, ordering, paging, unions.

use super::expr::{ComparisonOperator, FieldName, SourceSubQuery, expect_expression};
use super::operators::{CompareOp, Direction, JoinKind, UnionKind};
use super::statements::Select;
use super::values::Value;
use super::Node;
use crate::error::{SqlError, SqlResult};

/// Bare table reference outside of a source position (INSERT target).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableClause {
    pub name: String,
}

impl TableClause {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Table reference that binds a name (and optional alias) into the scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTableClause {
    pub name: String,
    pub alias: Option<String>,
}

impl SourceTableClause {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }
}

/// Where rows come from: a table or an aliased sub-query.
#[derive(Debug, Clone, PartialEq)]
pub enum RowSource {
    Table(SourceTableClause),
    SubQuery(Box<SourceSubQuery>),
}

impl From<SourceTableClause> for RowSource {
    fn from(t: SourceTableClause) -> Self {
        RowSource::Table(t)
    }
}

impl From<SourceSubQuery> for RowSource {
    fn from(q: SourceSubQuery) -> Self {
        RowSource::SubQuery(Box::new(q))
    }
}

impl From<&str> for RowSource {
    fn from(name: &str) -> Self {
        RowSource::Table(SourceTableClause::new(name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub target: RowSource,
    pub condition: Option<Node>,
}

impl JoinClause {
    /// `kind` is one of LEFT, RIGHT, FULL, INNER, CROSS.
    pub fn new(kind: &str, target: impl Into<RowSource>, condition: Option<Node>) -> SqlResult<Self> {
        Self::with_kind(kind.parse()?, target, condition)
    }

    /// CROSS joins take no condition, every other kind requires one.
    pub fn with_kind(
        kind: JoinKind,
        target: impl Into<RowSource>,
        condition: Option<Node>,
    ) -> SqlResult<Self> {
        let condition = match (kind, condition) {
            (JoinKind::Cross, Some(_)) => {
                return Err(SqlError::InvalidJoin("CROSS JOIN takes no condition".to_string()));
            }
            (JoinKind::Cross, None) => None,
            (kind, None) => {
                return Err(SqlError::InvalidJoin(format!(
                    "{} requires a condition",
                    kind.sql_keyword()
                )));
            }
            (_, Some(cond)) => Some(expect_expression(cond, "join condition")?),
        };
        Ok(Self {
            kind,
            target: target.into(),
            condition,
        })
    }

    /// Equi-join on `left = right`.
    pub fn on(
        kind: JoinKind,
        target: impl Into<RowSource>,
        left: impl Into<FieldName>,
        right: impl Into<FieldName>,
    ) -> SqlResult<Self> {
        let cond = ComparisonOperator::compare(
            CompareOp::Eq,
            Node::FieldName(left.into()),
            Node::FieldName(right.into()),
        )?;
        Self::with_kind(kind, target, Some(cond.into()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub condition: Node,
}

impl WhereClause {
    pub fn new(condition: impl Into<Node>) -> SqlResult<Self> {
        Ok(Self {
            condition: expect_expression(condition.into(), "WHERE condition")?,
        })
    }

    /// Equality on every `(field, value)` pair, ANDed in the given order.
    pub fn from_pairs<I, K, V>(pairs: I) -> SqlResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<FieldName>,
        V: Into<Value>,
    {
        let mut conditions: Vec<Node> = pairs
            .into_iter()
            .map(|(k, v)| ComparisonOperator::field(k, CompareOp::Eq, v).into())
            .collect();
        match conditions.len() {
            0 => Err(SqlError::InvalidValue(
                "WHERE needs at least one condition".to_string(),
            )),
            1 => Self::new(conditions.remove(0)),
            _ => Self::new(super::BooleanOperator::and(conditions)?),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HavingClause {
    pub condition: Node,
}

impl HavingClause {
    pub fn new(condition: impl Into<Node>) -> SqlResult<Self> {
        Ok(Self {
            condition: expect_expression(condition.into(), "HAVING condition")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupByClause {
    pub fields: Vec<Node>,
}

impl GroupByClause {
    pub fn new<I, N>(fields: I) -> SqlResult<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        let fields = fields
            .into_iter()
            .map(|f| expect_expression(f.into(), "GROUP BY item"))
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(Self { fields })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderClause {
    pub items: Vec<(Node, Direction)>,
}

impl OrderClause {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn by(mut self, expr: impl Into<Node>, direction: Direction) -> SqlResult<Self> {
        self.items
            .push((expect_expression(expr.into(), "ORDER BY item")?, direction));
        Ok(self)
    }

    pub fn asc(self, column: impl Into<FieldName>) -> Self {
        self.push_field(column.into(), Direction::Asc)
    }

    pub fn desc(self, column: impl Into<FieldName>) -> Self {
        self.push_field(column.into(), Direction::Desc)
    }

    fn push_field(mut self, field: FieldName, direction: Direction) -> Self {
        self.items.push((Node::FieldName(field), direction));
        self
    }
}

impl Default for OrderClause {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitClause(pub u64);

impl LimitClause {
    pub fn new(n: u64) -> Self {
        Self(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetClause(pub u64);

impl OffsetClause {
    pub fn new(n: u64) -> Self {
        Self(n)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionClause {
    pub kind: UnionKind,
    pub query: Select,
}

impl UnionClause {
    /// `kind` is ALL or DISTINCT.
    pub fn new(kind: &str, query: Select) -> SqlResult<Self> {
        Ok(Self {
            kind: kind.parse()?,
            query,
        })
    }

    pub fn all(query: Select) -> Self {
        Self {
            kind: UnionKind::All,
            query,
        }
    }

    pub fn distinct(query: Select) -> Self {
        Self {
            kind: UnionKind::Distinct,
            query,
        }
    }
}

/// Assignment `column = value` for UPDATE, INSERT and upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateField {
    pub column: String,
    pub value: Node,
}

impl UpdateField {
    pub fn new(column: impl Into<String>, value: impl Into<Node>) -> SqlResult<Self> {
        Ok(Self {
            column: column.into(),
            value: expect_expression(value.into(), "assigned value")?,
        })
    }

    pub fn value(column: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            column: column.into(),
            value: if value.is_null() {
                Node::Null
            } else {
                Node::Constant(super::ConstantValue::new(value))
            },
        }
    }
}

/// Upsert: conflict columns plus the assignments applied on conflict.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateKey {
    pub columns: Vec<String>,
    pub assignments: Vec<UpdateField>,
}

impl DuplicateKey {
    pub fn new<I, S>(columns: I) -> SqlResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(SqlError::InvalidValue(
                "upsert needs at least one conflict column".to_string(),
            ));
        }
        Ok(Self {
            columns,
            assignments: Vec::new(),
        })
    }

    pub fn update(mut self, assignment: UpdateField) -> Self {
        self.assignments.push(assignment);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_condition_rules() {
        assert!(matches!(
            JoinClause::new("INNER", "posts", None),
            Err(SqlError::InvalidJoin(_))
        ));
        assert!(JoinClause::new("cross", "posts", None).is_ok());
        let cond = ComparisonOperator::field("a", CompareOp::Eq, 1);
        assert!(matches!(
            JoinClause::new("CROSS", "posts", Some(cond.into())),
            Err(SqlError::InvalidJoin(_))
        ));
        assert!(JoinClause::new("SIDEWAYS", "posts", None).is_err());
    }

    #[test]
    fn test_where_from_pairs_shapes() {
        let single = WhereClause::from_pairs([("foo", 1)]).unwrap();
        assert!(matches!(single.condition, Node::Comparison(_)));
        let many = WhereClause::from_pairs([("foo", Value::from(1)), ("bar", Value::from("baz"))])
            .unwrap();
        match many.condition {
            Node::Boolean(b) => assert_eq!(b.operands.len(), 2),
            other => panic!("expected AND, got {:?}", other),
        }
        assert!(WhereClause::from_pairs(Vec::<(&str, i64)>::new()).is_err());
    }

    #[test]
    fn test_union_kind_validation() {
        assert!(UnionClause::new("ALL", Select::new()).is_ok());
        assert!(matches!(
            UnionClause::new("INTERSECT", Select::new()),
            Err(SqlError::InvalidUnion(_))
        ));
    }

    #[test]
    fn test_duplicate_key_requires_columns() {
        assert!(DuplicateKey::new(Vec::<String>::new()).is_err());
        let dk = DuplicateKey::new(["id"]).unwrap().update(UpdateField::value("name", "x"));
        assert_eq!(dk.assignments.len(), 1);
    }
}
