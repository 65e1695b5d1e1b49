//! Abstract statement tree.
//!
//! Nodes are plain data with no dialect knowledge. A driver renders them
//! against a [`Binder`](crate::binder::Binder); see [`crate::transpiler`].

pub mod clauses;
pub mod count;
pub mod expr;
pub mod operators;
pub mod statements;
pub mod values;

pub use self::clauses::{
    DuplicateKey, GroupByClause, HavingClause, JoinClause, LimitClause, OffsetClause,
    OrderClause, RowSource, SourceTableClause, TableClause, UnionClause, UpdateField,
    WhereClause,
};
pub use self::count::count_query;
pub use self::expr::{
    ArithmeticOperator, BooleanOperator, ComparisonOperator, ConstantArray, ConstantValue,
    CustomSql, EqualsOneOf, FieldName, NodeId, SourceSubQuery, SqlFunction, SubQuery,
    UnaryOperator, Wildcard,
};
pub use self::operators::{ArithOp, BoolOp, CompareOp, Direction, JoinKind, UnionKind};
pub use self::statements::{Delete, Insert, Select, SelectField, Update};
pub use self::values::{Value, ValueKind};

use crate::binder::Binder;
use crate::error::SqlResult;

/// Every node kind the drivers know how to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    // Statements
    Select(Box<Select>),
    Insert(Box<Insert>),
    Update(Box<Update>),
    Delete(Box<Delete>),

    // Expressions
    FieldName(FieldName),
    Constant(ConstantValue),
    ConstantArray(ConstantArray),
    Comparison(Box<ComparisonOperator>),
    Boolean(BooleanOperator),
    Unary(Box<UnaryOperator>),
    Arithmetic(Box<ArithmeticOperator>),
    Function(SqlFunction),
    SubQuery(Box<SubQuery>),
    EqualsOneOf(EqualsOneOf),
    Wildcard(Wildcard),
    Null,
    Custom(CustomSql),

    // Clauses
    Table(TableClause),
    SourceTable(SourceTableClause),
    SourceSubQuery(Box<SourceSubQuery>),
    Join(Box<JoinClause>),
    Where(Box<WhereClause>),
    Having(Box<HavingClause>),
    GroupBy(GroupByClause),
    Order(OrderClause),
    Limit(LimitClause),
    Offset(OffsetClause),
    Union(Box<UnionClause>),
    UpdateField(Box<UpdateField>),
    DuplicateKey(DuplicateKey),
}

impl Node {
    /// True for nodes that produce a scalar, row or boolean value.
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            Node::FieldName(_)
                | Node::Constant(_)
                | Node::ConstantArray(_)
                | Node::Comparison(_)
                | Node::Boolean(_)
                | Node::Unary(_)
                | Node::Arithmetic(_)
                | Node::Function(_)
                | Node::SubQuery(_)
                | Node::EqualsOneOf(_)
                | Node::Wildcard(_)
                | Node::Null
                | Node::Custom(_)
        )
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            Node::Select(_) | Node::Insert(_) | Node::Update(_) | Node::Delete(_)
        )
    }

    /// NULL literal, either the dedicated node or a constant holding NULL.
    pub fn is_null_literal(&self) -> bool {
        match self {
            Node::Null => true,
            Node::Constant(c) => c.is_null(),
            _ => false,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Select(_) => "SELECT",
            Node::Insert(_) => "INSERT",
            Node::Update(_) => "UPDATE",
            Node::Delete(_) => "DELETE",
            Node::FieldName(_) => "field name",
            Node::Constant(_) => "constant",
            Node::ConstantArray(_) => "constant array",
            Node::Comparison(_) => "comparison",
            Node::Boolean(_) => "boolean operator",
            Node::Unary(_) => "unary operator",
            Node::Arithmetic(_) => "arithmetic operator",
            Node::Function(_) => "function",
            Node::SubQuery(_) => "sub-query",
            Node::EqualsOneOf(_) => "equals-one-of",
            Node::Wildcard(_) => "wildcard",
            Node::Null => "NULL",
            Node::Custom(_) => "custom SQL",
            Node::Table(_) => "table clause",
            Node::SourceTable(_) => "source table",
            Node::SourceSubQuery(_) => "source sub-query",
            Node::Join(_) => "JOIN",
            Node::Where(_) => "WHERE",
            Node::Having(_) => "HAVING",
            Node::GroupBy(_) => "GROUP BY",
            Node::Order(_) => "ORDER BY",
            Node::Limit(_) => "LIMIT",
            Node::Offset(_) => "OFFSET",
            Node::Union(_) => "UNION",
            Node::UpdateField(_) => "assignment",
            Node::DuplicateKey(_) => "ON DUPLICATE KEY",
        }
    }

    /// Bind the table references this node introduces into the active scope.
    pub fn register_tables(&self, binder: &mut Binder) -> SqlResult<()> {
        match self {
            Node::SourceTable(t) => binder.register_table(&t.name, t.alias.as_deref()),
            Node::SourceSubQuery(q) => binder.register_derived(&q.alias),
            Node::Join(j) => j.target.register_tables(binder),
            _ => Ok(()),
        }
    }
}

impl RowSource {
    pub fn register_tables(&self, binder: &mut Binder) -> SqlResult<()> {
        match self {
            RowSource::Table(t) => binder.register_table(&t.name, t.alias.as_deref()),
            RowSource::SubQuery(q) => binder.register_derived(&q.alias),
        }
    }
}

macro_rules! node_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Node {
            fn from(n: $ty) -> Self {
                Node::$variant(n)
            }
        })*
    };
}

macro_rules! node_from_boxed {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Node {
            fn from(n: $ty) -> Self {
                Node::$variant(Box::new(n))
            }
        })*
    };
}

node_from! {
    FieldName => FieldName,
    ConstantValue => Constant,
    ConstantArray => ConstantArray,
    BooleanOperator => Boolean,
    SqlFunction => Function,
    EqualsOneOf => EqualsOneOf,
    Wildcard => Wildcard,
    CustomSql => Custom,
    TableClause => Table,
    SourceTableClause => SourceTable,
    GroupByClause => GroupBy,
    OrderClause => Order,
    LimitClause => Limit,
    OffsetClause => Offset,
    DuplicateKey => DuplicateKey,
}

node_from_boxed! {
    Select => Select,
    Insert => Insert,
    Update => Update,
    Delete => Delete,
    ComparisonOperator => Comparison,
    UnaryOperator => Unary,
    ArithmeticOperator => Arithmetic,
    SubQuery => SubQuery,
    SourceSubQuery => SourceSubQuery,
    JoinClause => Join,
    WhereClause => Where,
    HavingClause => Having,
    UnionClause => Union,
    UpdateField => UpdateField,
}

impl From<Value> for Node {
    /// A NULL value becomes the NULL node, anything else a bound constant.
    fn from(value: Value) -> Self {
        if value.is_null() {
            Node::Null
        } else {
            Node::Constant(ConstantValue::new(value))
        }
    }
}
