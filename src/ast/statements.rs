//! Statement roots: SELECT, INSERT, UPDATE, DELETE.
//!
//! Each root takes heterogeneous children through [`add`](Select::add),
//! which routes a node into its slot or rejects it. The fluent builders are
//! thin wrappers over the same slots.

use super::clauses::{
    DuplicateKey, GroupByClause, HavingClause, JoinClause, LimitClause, OffsetClause,
    OrderClause, RowSource, SourceTableClause, TableClause, UnionClause, UpdateField,
};
use super::expr::{BooleanOperator, ComparisonOperator, FieldName, expect_expression};
use super::operators::{BoolOp, CompareOp, Direction};
use super::values::Value;
use super::Node;
use crate::error::{SqlError, SqlResult};

/// One projected expression with its optional explicit alias.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectField {
    pub expr: Node,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    pub fields: Vec<SelectField>,
    pub distinct: bool,
    pub source: Option<RowSource>,
    pub joins: Vec<JoinClause>,
    pub predicate: Option<Node>,
    pub group_by: Option<GroupByClause>,
    pub having: Option<Node>,
    pub order: Option<OrderClause>,
    pub limit: Option<LimitClause>,
    pub offset: Option<OffsetClause>,
    pub unions: Vec<UnionClause>,
}

impl Select {
    pub fn new() -> Self {
        Self::default()
    }

    /// `SELECT … FROM source`
    pub fn from(source: impl Into<RowSource>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }

    pub fn add(&mut self, node: impl Into<Node>) -> SqlResult<()> {
        let node = node.into();
        match node {
            Node::SourceTable(t) => self.set_source(RowSource::Table(t)),
            Node::SourceSubQuery(q) => self.set_source(RowSource::SubQuery(q)),
            Node::Join(j) => {
                self.joins.push(*j);
                Ok(())
            }
            Node::Where(w) => {
                merge_and(&mut self.predicate, w.condition);
                Ok(())
            }
            Node::Having(h) => {
                merge_and(&mut self.having, h.condition);
                Ok(())
            }
            Node::GroupBy(g) => {
                match &mut self.group_by {
                    Some(existing) => existing.fields.extend(g.fields),
                    None => self.group_by = Some(g),
                }
                Ok(())
            }
            Node::Order(o) => {
                match &mut self.order {
                    Some(existing) => existing.items.extend(o.items),
                    None => self.order = Some(o),
                }
                Ok(())
            }
            Node::Limit(l) => {
                self.limit = Some(l);
                Ok(())
            }
            Node::Offset(o) => {
                self.offset = Some(o);
                Ok(())
            }
            Node::Union(u) => {
                self.unions.push(*u);
                Ok(())
            }
            expr if expr.is_expression() => {
                self.fields.push(SelectField { expr, alias: None });
                Ok(())
            }
            other => Err(unsupported("SELECT", &other)),
        }
    }

    fn set_source(&mut self, source: RowSource) -> SqlResult<()> {
        if self.source.is_some() {
            return Err(SqlError::UnsupportedClause {
                statement: "SELECT",
                clause: "a second source table",
            });
        }
        self.source = Some(source);
        Ok(())
    }

    pub fn field(mut self, column: impl Into<FieldName>) -> Self {
        self.fields.push(SelectField {
            expr: Node::FieldName(column.into()),
            alias: None,
        });
        self
    }

    pub fn fields<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<FieldName>,
    {
        for column in columns {
            self = self.field(column);
        }
        self
    }

    /// Project any expression, optionally under an explicit alias.
    pub fn expr(mut self, expr: impl Into<Node>, alias: Option<&str>) -> SqlResult<Self> {
        self.fields.push(SelectField {
            expr: expect_expression(expr.into(), "projected item")?,
            alias: alias.map(str::to_string),
        });
        Ok(self)
    }

    pub fn field_as(mut self, column: impl Into<FieldName>, alias: &str) -> Self {
        self.fields.push(SelectField {
            expr: Node::FieldName(column.into()),
            alias: Some(alias.to_string()),
        });
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn join(mut self, join: JoinClause) -> Self {
        self.joins.push(join);
        self
    }

    /// AND `condition` into the predicate.
    pub fn filter(mut self, condition: impl Into<Node>) -> SqlResult<Self> {
        let condition = expect_expression(condition.into(), "WHERE condition")?;
        merge_and(&mut self.predicate, condition);
        Ok(self)
    }

    pub fn where_eq(mut self, column: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        merge_and(
            &mut self.predicate,
            ComparisonOperator::field(column, CompareOp::Eq, value).into(),
        );
        self
    }

    pub fn group_by(mut self, group: GroupByClause) -> Self {
        match &mut self.group_by {
            Some(existing) => existing.fields.extend(group.fields),
            None => self.group_by = Some(group),
        }
        self
    }

    pub fn having(mut self, condition: impl Into<Node>) -> SqlResult<Self> {
        let h = HavingClause::new(condition)?;
        merge_and(&mut self.having, h.condition);
        Ok(self)
    }

    pub fn order_by(mut self, column: impl Into<FieldName>, direction: Direction) -> Self {
        let order = self.order.take().unwrap_or_default();
        self.order = Some(match direction {
            Direction::Asc => order.asc(column),
            Direction::Desc => order.desc(column),
        });
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(LimitClause::new(n));
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(OffsetClause::new(n));
        self
    }

    pub fn union_all(mut self, other: Select) -> Self {
        self.unions.push(UnionClause::all(other));
        self
    }

    pub fn union_distinct(mut self, other: Select) -> Self {
        self.unions.push(UnionClause::distinct(other));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Insert {
    pub table: Option<TableClause>,
    pub fields: Vec<UpdateField>,
    pub on_duplicate: Option<DuplicateKey>,
}

impl Insert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_table(table: impl Into<String>) -> Self {
        Self {
            table: Some(TableClause::new(table)),
            ..Self::default()
        }
    }

    pub fn add(&mut self, node: impl Into<Node>) -> SqlResult<()> {
        match node.into() {
            Node::Table(t) => {
                if self.table.is_some() {
                    return Err(SqlError::UnsupportedClause {
                        statement: "INSERT",
                        clause: "a second target table",
                    });
                }
                self.table = Some(t);
                Ok(())
            }
            Node::UpdateField(f) => {
                self.fields.push(*f);
                Ok(())
            }
            Node::DuplicateKey(d) => {
                self.on_duplicate = Some(d);
                Ok(())
            }
            other => Err(unsupported("INSERT", &other)),
        }
    }

    pub fn value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(UpdateField::value(column, value));
        self
    }

    pub fn set(mut self, field: UpdateField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn on_duplicate(mut self, key: DuplicateKey) -> Self {
        self.on_duplicate = Some(key);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Update {
    pub table: Option<SourceTableClause>,
    pub assignments: Vec<UpdateField>,
    pub predicate: Option<Node>,
    pub order: Option<OrderClause>,
    pub limit: Option<LimitClause>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: Some(SourceTableClause::new(table)),
            ..Self::default()
        }
    }

    pub fn add(&mut self, node: impl Into<Node>) -> SqlResult<()> {
        match node.into() {
            Node::SourceTable(t) => {
                if self.table.is_some() {
                    return Err(SqlError::UnsupportedClause {
                        statement: "UPDATE",
                        clause: "a second source table",
                    });
                }
                self.table = Some(t);
                Ok(())
            }
            Node::UpdateField(f) => {
                self.assignments.push(*f);
                Ok(())
            }
            Node::Where(w) => {
                merge_and(&mut self.predicate, w.condition);
                Ok(())
            }
            Node::Order(o) => {
                match &mut self.order {
                    Some(existing) => existing.items.extend(o.items),
                    None => self.order = Some(o),
                }
                Ok(())
            }
            Node::Limit(l) => {
                self.limit = Some(l);
                Ok(())
            }
            other => Err(unsupported("UPDATE", &other)),
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments.push(UpdateField::value(column, value));
        self
    }

    pub fn assign(mut self, field: UpdateField) -> Self {
        self.assignments.push(field);
        self
    }

    pub fn filter(mut self, condition: impl Into<Node>) -> SqlResult<Self> {
        let condition = expect_expression(condition.into(), "WHERE condition")?;
        merge_and(&mut self.predicate, condition);
        Ok(self)
    }

    pub fn where_eq(mut self, column: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        merge_and(
            &mut self.predicate,
            ComparisonOperator::field(column, CompareOp::Eq, value).into(),
        );
        self
    }

    pub fn order_by(mut self, column: impl Into<FieldName>, direction: Direction) -> Self {
        let order = self.order.take().unwrap_or_default();
        self.order = Some(match direction {
            Direction::Asc => order.asc(column),
            Direction::Desc => order.desc(column),
        });
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(LimitClause::new(n));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Delete {
    pub table: Option<SourceTableClause>,
    pub predicate: Option<Node>,
    pub order: Option<OrderClause>,
    pub limit: Option<LimitClause>,
}

impl Delete {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: Some(SourceTableClause::new(table)),
            ..Self::default()
        }
    }

    pub fn add(&mut self, node: impl Into<Node>) -> SqlResult<()> {
        match node.into() {
            Node::SourceTable(t) => {
                if self.table.is_some() {
                    return Err(SqlError::UnsupportedClause {
                        statement: "DELETE",
                        clause: "a second source table",
                    });
                }
                self.table = Some(t);
                Ok(())
            }
            Node::Where(w) => {
                merge_and(&mut self.predicate, w.condition);
                Ok(())
            }
            Node::Order(o) => {
                match &mut self.order {
                    Some(existing) => existing.items.extend(o.items),
                    None => self.order = Some(o),
                }
                Ok(())
            }
            Node::Limit(l) => {
                self.limit = Some(l);
                Ok(())
            }
            other => Err(unsupported("DELETE", &other)),
        }
    }

    pub fn filter(mut self, condition: impl Into<Node>) -> SqlResult<Self> {
        let condition = expect_expression(condition.into(), "WHERE condition")?;
        merge_and(&mut self.predicate, condition);
        Ok(self)
    }

    pub fn where_eq(mut self, column: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        merge_and(
            &mut self.predicate,
            ComparisonOperator::field(column, CompareOp::Eq, value).into(),
        );
        self
    }

    pub fn order_by(mut self, column: impl Into<FieldName>, direction: Direction) -> Self {
        let order = self.order.take().unwrap_or_default();
        self.order = Some(match direction {
            Direction::Asc => order.asc(column),
            Direction::Desc => order.desc(column),
        });
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(LimitClause::new(n));
        self
    }
}

/// AND `condition` into `slot`, flattening into an existing AND.
fn merge_and(slot: &mut Option<Node>, condition: Node) {
    *slot = Some(match slot.take() {
        None => condition,
        Some(Node::Boolean(mut existing)) if existing.op == BoolOp::And => {
            existing.operands.push(condition);
            Node::Boolean(existing)
        }
        Some(existing) => Node::Boolean(BooleanOperator {
            op: BoolOp::And,
            operands: vec![existing, condition],
        }),
    });
}

fn unsupported(statement: &'static str, node: &Node) -> SqlError {
    SqlError::UnsupportedClause {
        statement,
        clause: node.kind_name(),
    }
}
