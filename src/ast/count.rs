//! Row-count derivation for SELECT statements.

use super::expr::{ArithmeticOperator, SqlFunction, SubQuery};
use super::operators::{ArithOp, UnionKind};
use super::statements::{Select, SelectField};
use super::Node;
use crate::error::{SqlError, SqlResult};

/// Derive a statement counting the rows `select` would return.
///
/// Source, joins, predicate and HAVING are kept; the projection becomes
/// `COUNT(*)` and ordering / paging are dropped. Grouped or DISTINCT queries
/// have no count by substitution and are rejected. `UNION ALL` branches are
/// counted one by one and summed as scalar sub-queries.
pub fn count_query(select: &Select) -> SqlResult<Select> {
    if select.group_by.is_some() {
        return Err(SqlError::CountUnsupported(
            "query has a GROUP BY clause".to_string(),
        ));
    }
    if select.distinct {
        return Err(SqlError::CountUnsupported("query is DISTINCT".to_string()));
    }
    if select.unions.iter().any(|u| u.kind == UnionKind::Distinct) {
        return Err(SqlError::CountUnsupported(
            "query has a DISTINCT union".to_string(),
        ));
    }

    let base = Select {
        fields: vec![SelectField {
            expr: Node::Function(SqlFunction::count_all()),
            alias: None,
        }],
        distinct: false,
        source: select.source.clone(),
        joins: select.joins.clone(),
        predicate: select.predicate.clone(),
        group_by: None,
        having: select.having.clone(),
        order: None,
        limit: None,
        offset: None,
        unions: Vec::new(),
    };
    if select.unions.is_empty() {
        return Ok(base);
    }

    let mut total: Node = SubQuery::new(base).into();
    for union in &select.unions {
        let branch = count_query(&union.query)?;
        total = ArithmeticOperator::apply(ArithOp::Add, total, SubQuery::new(branch))?.into();
    }
    Ok(Select {
        fields: vec![SelectField {
            expr: total,
            alias: Some("count".to_string()),
        }],
        ..Select::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FieldName, GroupByClause, JoinClause, JoinKind};

    #[test]
    fn test_group_by_is_rejected() {
        let select = Select::from("orders")
            .field("status")
            .group_by(GroupByClause::new([FieldName::new("status")]).unwrap());
        assert!(matches!(
            count_query(&select),
            Err(SqlError::CountUnsupported(_))
        ));
    }

    #[test]
    fn test_distinct_union_is_rejected() {
        let select = Select::from("a").union_distinct(Select::from("b"));
        assert!(count_query(&select).is_err());
        assert!(count_query(&Select::from("a").distinct()).is_err());
    }

    #[test]
    fn test_plain_query_keeps_source_and_predicate() {
        let join =
            JoinClause::on(JoinKind::Inner, "posts", "posts.user_id", "users.id").unwrap();
        let select = Select::from("users")
            .field("name")
            .join(join)
            .where_eq("active", true)
            .limit(10)
            .offset(20);
        let count = count_query(&select).unwrap();
        assert_eq!(count.source, select.source);
        assert_eq!(count.joins, select.joins);
        assert_eq!(count.predicate, select.predicate);
        assert_eq!(count.limit, None);
        assert_eq!(count.offset, None);
        assert_eq!(count.fields.len(), 1);
        assert!(matches!(&count.fields[0].expr, Node::Function(f) if f.is_count()));
    }

    #[test]
    fn test_union_all_chain_is_summed() {
        let select = Select::from("a")
            .union_all(Select::from("b"))
            .union_all(Select::from("c"));
        let count = count_query(&select).unwrap();
        assert!(count.source.is_none());
        assert_eq!(count.fields[0].alias.as_deref(), Some("count"));
        match &count.fields[0].expr {
            Node::Arithmetic(outer) => {
                assert!(matches!(outer.left, Node::Arithmetic(_)));
                assert!(matches!(outer.right, Node::SubQuery(_)));
            }
            other => panic!("expected a sum, got {:?}", other),
        }
    }
}
