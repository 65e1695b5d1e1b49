//! Rendering shared by every driver.
//!
//! Drivers dispatch on the node kind and call into these helpers, passing
//! themselves so quoting, binding and the backend hooks stay theirs.

use super::traits::Driver;
use crate::ast::{
    ArithmeticOperator, BooleanOperator, CompareOp, ComparisonOperator, ConstantArray,
    ConstantValue, Delete, FieldName, GroupByClause, Insert, JoinClause, Node, OrderClause,
    RowSource, Select, SelectField, SourceSubQuery, SourceTableClause, SqlFunction, SubQuery,
    UnaryOperator, UnionClause, Update, UpdateField, Value, Wildcard,
};
use crate::binder::{Binder, TableRef};
use crate::error::{SqlError, SqlResult};

pub fn render_select<D: Driver + ?Sized>(
    d: &D,
    select: &Select,
    b: &mut Binder,
) -> SqlResult<String> {
    if let Some(source) = &select.source {
        source.register_tables(b)?;
    }
    for join in &select.joins {
        join.target.register_tables(b)?;
    }
    for field in &select.fields {
        if let Some(alias) = &field.alias {
            b.reserve_alias(alias);
        }
    }

    let mut sql = String::from("SELECT ");
    if select.distinct {
        sql.push_str("DISTINCT ");
    }
    if select.fields.is_empty() {
        sql.push('*');
    } else {
        let fields = select
            .fields
            .iter()
            .map(|f| render_projection(d, f, b))
            .collect::<SqlResult<Vec<_>>>()?;
        sql.push_str(&fields.join(", "));
    }

    if let Some(source) = &select.source {
        sql.push_str(" FROM ");
        sql.push_str(&render_row_source(d, source, b)?);
    }
    for join in &select.joins {
        sql.push(' ');
        sql.push_str(&render_join(d, join, b)?);
    }
    if let Some(predicate) = &select.predicate {
        sql.push_str(" WHERE ");
        sql.push_str(&d.render(predicate, b, false)?);
    }
    if let Some(group) = &select.group_by {
        sql.push(' ');
        sql.push_str(&render_group_by(d, group, b)?);
    }
    if let Some(having) = &select.having {
        sql.push_str(" HAVING ");
        sql.push_str(&d.render(having, b, false)?);
    }
    for union in &select.unions {
        sql.push(' ');
        sql.push_str(&render_union(d, union, b)?);
    }
    if let Some(order) = &select.order {
        sql.push(' ');
        sql.push_str(&render_order(d, order, b)?);
    }
    sql.push_str(&d.limit_offset(
        select.limit.map(|l| l.0),
        select.offset.map(|o| o.0),
    ));
    Ok(sql)
}

/// Projected item with its explicit or generated alias.
pub fn render_projection<D: Driver + ?Sized>(
    d: &D,
    field: &SelectField,
    b: &mut Binder,
) -> SqlResult<String> {
    let expr = d.render(&field.expr, b, false)?;
    let alias = match &field.alias {
        Some(alias) => Some(alias.clone()),
        None => b.generate_alias(&field.expr),
    };
    Ok(match alias {
        Some(alias) => format!("{} AS {}", expr, d.quote_identifier(&alias)),
        None => expr,
    })
}

pub fn render_row_source<D: Driver + ?Sized>(
    d: &D,
    source: &RowSource,
    b: &mut Binder,
) -> SqlResult<String> {
    match source {
        RowSource::Table(t) => Ok(render_source_table(d, t)),
        RowSource::SubQuery(q) => render_source_sub_query(d, q, b),
    }
}

pub fn render_source_table<D: Driver + ?Sized>(d: &D, table: &SourceTableClause) -> String {
    match &table.alias {
        Some(alias) => format!(
            "{} AS {}",
            d.quote_table(&table.name),
            d.quote_identifier(alias)
        ),
        None => d.quote_table(&table.name),
    }
}

pub fn render_source_sub_query<D: Driver + ?Sized>(
    d: &D,
    query: &SourceSubQuery,
    b: &mut Binder,
) -> SqlResult<String> {
    let inner = b.sub_scope(|b| render_select(d, &query.query, b))?;
    Ok(format!("({}) AS {}", inner, d.quote_identifier(&query.alias)))
}

pub fn render_sub_query<D: Driver + ?Sized>(
    d: &D,
    query: &SubQuery,
    b: &mut Binder,
) -> SqlResult<String> {
    let inner = b.sub_scope(|b| render_select(d, &query.query, b))?;
    Ok(format!("({})", inner))
}

pub fn render_join<D: Driver + ?Sized>(
    d: &D,
    join: &JoinClause,
    b: &mut Binder,
) -> SqlResult<String> {
    let keyword = d.join_keyword(join.kind)?;
    let target = render_row_source(d, &join.target, b)?;
    match &join.condition {
        Some(condition) => Ok(format!(
            "{} {} ON {}",
            keyword,
            target,
            d.render(condition, b, false)?
        )),
        None => Ok(format!("{} {}", keyword, target)),
    }
}

pub fn render_union<D: Driver + ?Sized>(
    d: &D,
    union: &UnionClause,
    b: &mut Binder,
) -> SqlResult<String> {
    let branch = b.sibling_scope(|b| render_select(d, &union.query, b))?;
    Ok(format!("{} {}", union.kind.sql_keyword(), branch))
}

pub fn render_group_by<D: Driver + ?Sized>(
    d: &D,
    group: &GroupByClause,
    b: &mut Binder,
) -> SqlResult<String> {
    let fields = group
        .fields
        .iter()
        .map(|f| d.render(f, b, false))
        .collect::<SqlResult<Vec<_>>>()?;
    Ok(format!("GROUP BY {}", fields.join(", ")))
}

pub fn render_order<D: Driver + ?Sized>(
    d: &D,
    order: &OrderClause,
    b: &mut Binder,
) -> SqlResult<String> {
    let items = order
        .items
        .iter()
        .map(|(expr, dir)| Ok(format!("{} {}", d.render(expr, b, false)?, dir.sql_keyword())))
        .collect::<SqlResult<Vec<String>>>()?;
    Ok(format!("ORDER BY {}", items.join(", ")))
}

/// Column reference, qualified through the binder when it names a table.
pub fn render_field<D: Driver + ?Sized>(
    d: &D,
    field: &FieldName,
    b: &mut Binder,
) -> SqlResult<String> {
    match &field.table {
        None => Ok(d.quote_identifier(&field.column)),
        Some(owner) => Ok(format!(
            "{}.{}",
            render_table_ref(d, owner, b)?,
            d.quote_identifier(&field.column)
        )),
    }
}

fn render_table_ref<D: Driver + ?Sized>(d: &D, owner: &str, b: &mut Binder) -> SqlResult<String> {
    Ok(match b.resolve_table(owner)? {
        TableRef::Table(name) => d.quote_table(&name),
        TableRef::Alias(alias) => d.quote_identifier(&alias),
    })
}

pub fn render_wildcard<D: Driver + ?Sized>(
    d: &D,
    wildcard: &Wildcard,
    b: &mut Binder,
) -> SqlResult<String> {
    match &wildcard.table {
        None => Ok("*".to_string()),
        Some(owner) => Ok(format!("{}.*", render_table_ref(d, owner, b)?)),
    }
}

pub fn render_constant<D: Driver + ?Sized>(
    d: &D,
    constant: &ConstantValue,
    b: &mut Binder,
) -> String {
    if constant.is_null() {
        return "NULL".to_string();
    }
    let normalize = |v: &Value| d.normalize_value(v);
    let key = b.bind(constant, Some(&normalize));
    d.placeholder(&key)
}

/// `(:c0, :c1, …)`, one placeholder per element.
pub fn render_constant_list<D: Driver + ?Sized>(
    d: &D,
    array: &ConstantArray,
    b: &mut Binder,
) -> SqlResult<String> {
    let normalize = |v: &Value| d.normalize_value(v);
    let keys = (0..array.items().len())
        .map(|i| b.bind_element(array, i, Some(&normalize)).map(|k| d.placeholder(&k)))
        .collect::<SqlResult<Vec<_>>>()?;
    Ok(format!("({})", keys.join(", ")))
}

/// Comparison with the NULL rewrite applied; `op` joins the rendered sides.
pub fn render_comparison<D, F>(
    d: &D,
    cmp: &ComparisonOperator,
    b: &mut Binder,
    nested: bool,
    op: F,
) -> SqlResult<String>
where
    D: Driver + ?Sized,
    F: FnOnce(CompareOp, &str, &str) -> String,
{
    let sql = if cmp.is_null_check() {
        let operand = if cmp.left.is_null_literal() {
            &cmp.right
        } else {
            &cmp.left
        };
        let test = if cmp.op == CompareOp::Eq {
            "IS NULL"
        } else {
            "IS NOT NULL"
        };
        format!("{} {}", d.render(operand, b, true)?, test)
    } else {
        let left = d.render(&cmp.left, b, true)?;
        let right = d.render(&cmp.right, b, true)?;
        op(cmp.op, &left, &right)
    };
    Ok(wrap(sql, nested))
}

pub fn plain_comparison(op: CompareOp, left: &str, right: &str) -> String {
    format!("{} {} {}", left, op.sql_symbol(), right)
}

/// Every operand parenthesized: `(a) AND (b)`.
pub fn render_boolean<D: Driver + ?Sized>(
    d: &D,
    op: &BooleanOperator,
    b: &mut Binder,
    nested: bool,
) -> SqlResult<String> {
    let operands = op
        .operands
        .iter()
        .map(|o| Ok(format!("({})", d.render(o, b, false)?)))
        .collect::<SqlResult<Vec<String>>>()?;
    let sql = operands.join(&format!(" {} ", op.op.sql_symbol()));
    Ok(if nested && operands.len() > 1 {
        format!("({})", sql)
    } else {
        sql
    })
}

pub fn render_unary<D: Driver + ?Sized>(
    d: &D,
    op: &UnaryOperator,
    b: &mut Binder,
) -> SqlResult<String> {
    Ok(format!("NOT ({})", d.render(&op.operand, b, false)?))
}

pub fn render_arithmetic<D: Driver + ?Sized>(
    d: &D,
    op: &ArithmeticOperator,
    b: &mut Binder,
    nested: bool,
) -> SqlResult<String> {
    let sql = format!(
        "{} {} {}",
        d.render(&op.left, b, true)?,
        op.op.sql_symbol(),
        d.render(&op.right, b, true)?
    );
    Ok(wrap(sql, nested))
}

pub fn render_function<D: Driver + ?Sized>(
    d: &D,
    func: &SqlFunction,
    b: &mut Binder,
) -> SqlResult<String> {
    if func.is_count()
        && let [Node::Wildcard(w)] = func.args.as_slice()
        && w.table.is_none()
    {
        return Ok("COUNT(*)".to_string());
    }
    let args = func
        .args
        .iter()
        .map(|a| d.render(a, b, false))
        .collect::<SqlResult<Vec<_>>>()?;
    Ok(format!("{}({})", func.name, args.join(", ")))
}

pub fn render_assignment<D: Driver + ?Sized>(
    d: &D,
    field: &UpdateField,
    b: &mut Binder,
) -> SqlResult<String> {
    Ok(format!(
        "{} = {}",
        d.quote_identifier(&field.column),
        d.render(&field.value, b, false)?
    ))
}

pub fn render_insert<D: Driver + ?Sized>(
    d: &D,
    insert: &Insert,
    b: &mut Binder,
) -> SqlResult<String> {
    let table = insert
        .table
        .as_ref()
        .ok_or_else(|| SqlError::Incomplete("INSERT without a target table".to_string()))?;
    let mut sql = format!("INSERT INTO {}", d.quote_table(&table.name));
    if insert.fields.is_empty() {
        sql.push_str(d.empty_insert());
    } else {
        let columns: Vec<String> = insert
            .fields
            .iter()
            .map(|f| d.quote_identifier(&f.column))
            .collect();
        let values = insert
            .fields
            .iter()
            .map(|f| d.render(&f.value, b, false))
            .collect::<SqlResult<Vec<_>>>()?;
        sql.push_str(&format!(
            " ({}) VALUES ({})",
            columns.join(", "),
            values.join(", ")
        ));
    }
    if let Some(key) = &insert.on_duplicate {
        sql.push_str(&d.render_upsert(key, b)?);
    }
    Ok(sql)
}

pub fn render_update<D: Driver + ?Sized>(
    d: &D,
    update: &Update,
    b: &mut Binder,
) -> SqlResult<String> {
    let table = update
        .table
        .as_ref()
        .ok_or_else(|| SqlError::Incomplete("UPDATE without a target table".to_string()))?;
    if update.assignments.is_empty() {
        return Err(SqlError::Incomplete("UPDATE without assignments".to_string()));
    }
    b.register_table(&table.name, table.alias.as_deref())?;
    let assignments = update
        .assignments
        .iter()
        .map(|f| render_assignment(d, f, b))
        .collect::<SqlResult<Vec<_>>>()?;
    let mut sql = format!(
        "UPDATE {} SET {}",
        render_source_table(d, table),
        assignments.join(", ")
    );
    if let Some(predicate) = &update.predicate {
        sql.push_str(" WHERE ");
        sql.push_str(&d.render(predicate, b, false)?);
    }
    sql.push_str(&d.render_mutation_tail(
        "UPDATE",
        update.order.as_ref(),
        update.limit.as_ref(),
        b,
    )?);
    Ok(sql)
}

pub fn render_delete<D: Driver + ?Sized>(
    d: &D,
    delete: &Delete,
    b: &mut Binder,
) -> SqlResult<String> {
    let table = delete
        .table
        .as_ref()
        .ok_or_else(|| SqlError::Incomplete("DELETE without a target table".to_string()))?;
    b.register_table(&table.name, table.alias.as_deref())?;
    let mut sql = format!("DELETE FROM {}", render_source_table(d, table));
    if let Some(predicate) = &delete.predicate {
        sql.push_str(" WHERE ");
        sql.push_str(&d.render(predicate, b, false)?);
    }
    sql.push_str(&d.render_mutation_tail(
        "DELETE",
        delete.order.as_ref(),
        delete.limit.as_ref(),
        b,
    )?);
    Ok(sql)
}

/// ORDER BY / LIMIT tail for backends that accept it on mutations.
pub fn mutation_tail<D: Driver + ?Sized>(
    d: &D,
    order: Option<&OrderClause>,
    limit: Option<u64>,
    b: &mut Binder,
) -> SqlResult<String> {
    let mut sql = String::new();
    if let Some(order) = order {
        sql.push(' ');
        sql.push_str(&render_order(d, order, b)?);
    }
    sql.push_str(&d.limit_offset(limit, None));
    Ok(sql)
}

fn wrap(sql: String, nested: bool) -> String {
    if nested { format!("({})", sql) } else { sql }
}
