//! PostgreSQL catalog reading.
//!
//! Constraints and indexes come back from `pg_get_constraintdef` and
//! `pg_indexes` as definition text. The grammars below accept exactly the
//! shapes the schema model can express and reject everything else.

use super::{CatalogQuery, CatalogResults, number, rows, text};
use crate::error::{SqlError, SqlResult};
use crate::schema::{Column, ColumnType, FkAction, ForeignKey, Index, IndexKind, Table};
use crate::transpiler::traits::Driver;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case, take_until, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{all_consuming, map, opt, value},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
};
use std::collections::HashSet;

pub const COLUMNS: &str = "columns";
pub const CONSTRAINTS: &str = "constraints";
pub const INDEXES: &str = "indexes";

const COLUMNS_SQL: &str = "SELECT column_name::text AS column_name, udt_name::text AS udt_name, \
     is_nullable::text AS is_nullable, column_default::text AS column_default, \
     character_maximum_length::int AS character_maximum_length, \
     numeric_precision::int AS numeric_precision, numeric_scale::int AS numeric_scale, \
     is_identity::text AS is_identity \
     FROM information_schema.columns \
     WHERE table_schema = current_schema() AND table_name = {table} \
     ORDER BY ordinal_position";

const CONSTRAINTS_SQL: &str = "SELECT con.conname::text AS name, con.contype::text AS kind, \
     pg_get_constraintdef(con.oid) AS definition \
     FROM pg_constraint con \
     JOIN pg_class rel ON rel.oid = con.conrelid \
     JOIN pg_namespace nsp ON nsp.oid = rel.relnamespace \
     WHERE nsp.nspname = current_schema() AND rel.relname = {table} \
     ORDER BY con.conname";

const INDEXES_SQL: &str = "SELECT indexname::text AS name, indexdef AS definition \
     FROM pg_indexes \
     WHERE schemaname = current_schema() AND tablename = {table} \
     ORDER BY indexname";

pub fn queries(physical_table: &str) -> Vec<CatalogQuery> {
    vec![
        CatalogQuery::for_table(COLUMNS, COLUMNS_SQL, physical_table),
        CatalogQuery::for_table(CONSTRAINTS, CONSTRAINTS_SQL, physical_table),
        CatalogQuery::for_table(INDEXES, INDEXES_SQL, physical_table),
    ]
}

pub fn reconstruct<D: Driver + ?Sized>(
    d: &D,
    table: &str,
    results: &CatalogResults,
) -> SqlResult<Table> {
    let physical = format!("{}{}", d.table_prefix(), table);
    let mut out = Table::new(table);

    for row in rows(results, COLUMNS) {
        let name = text(row, "column_name")
            .ok_or_else(|| SqlError::catalog(format!("{:?}", row), "column without a name"))?;
        let udt = text(row, "udt_name").unwrap_or_default();
        let column_type = d.column_type_from_catalog(&udt)?;
        let mut column = Column::new(name, column_type);
        column.nullable = text(row, "is_nullable").as_deref() == Some("YES");
        column.default = text(row, "column_default").map(|d| strip_literal_cast(&d));
        let is_sequence = column
            .default
            .as_deref()
            .is_some_and(|def| def.starts_with("nextval("));
        if is_sequence || text(row, "is_identity").as_deref() == Some("YES") {
            column.serial = true;
            column.nullable = false;
            column.default = None;
        }
        if column_type.is_text() {
            column.max_length = number(row, "character_maximum_length").map(|n| n as u32);
        }
        if column_type == ColumnType::Decimal {
            column.precision = number(row, "numeric_precision").map(|n| n as u32);
            column.scale = number(row, "numeric_scale").map(|n| n as u32);
        }
        out.columns.push(column);
    }
    if out.columns.is_empty() {
        return Err(SqlError::TableNotFound(table.to_string()));
    }

    let mut constraint_names = HashSet::new();
    for row in rows(results, CONSTRAINTS) {
        let name = text(row, "name").unwrap_or_default();
        let definition = text(row, "definition").unwrap_or_default();
        match text(row, "kind").as_deref() {
            Some("p") => out.indexes.push(Index::primary(parse_primary_key(&definition)?)),
            Some("u") => out.indexes.push(Index::unique(parse_unique(&definition)?)),
            Some("f") => {
                let mut fk = parse_foreign_key(&definition)?;
                fk.ref_table = d.strip_prefix(&fk.ref_table).to_string();
                out.foreign_keys.push(fk);
            }
            Some("c") => {
                let column = name
                    .strip_prefix(&format!("{}_", physical))
                    .and_then(|rest| rest.strip_suffix("_enum"));
                if let Some(column) = column.and_then(|c| {
                    out.columns.iter_mut().find(|col| col.name == c)
                }) {
                    column.column_type = ColumnType::Enum;
                    column.enum_values = parse_check_values(&definition)?;
                    column.max_length = None;
                }
            }
            _ => {}
        }
        constraint_names.insert(name);
    }

    for row in rows(results, INDEXES) {
        let name = text(row, "name").unwrap_or_default();
        if constraint_names.contains(&name) {
            continue;
        }
        let definition = text(row, "definition").unwrap_or_default();
        let parsed = parse_index_definition(&definition)?;
        let kind = if parsed.unique {
            IndexKind::Unique
        } else {
            IndexKind::Index
        };
        out.indexes.push(Index::new(kind, parsed.columns));
    }
    Ok(out)
}

/// `'on'::text` reads back as `'on'`; other defaults are kept verbatim.
fn strip_literal_cast(default: &str) -> String {
    match default.rfind("'::") {
        Some(end) if default.starts_with('\'') => default[..=end].to_string(),
        _ => default.to_string(),
    }
}

/// `CREATE [UNIQUE] INDEX name ON [ONLY] schema.table USING method (cols)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub unique: bool,
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
}

pub fn parse_index_definition(definition: &str) -> SqlResult<IndexDefinition> {
    parse_all(definition, index_definition)
}

pub fn parse_primary_key(definition: &str) -> SqlResult<Vec<String>> {
    parse_all(
        definition,
        preceded(
            tuple((tag_no_case("PRIMARY"), multispace1, tag_no_case("KEY"))),
            column_list,
        ),
    )
}

pub fn parse_unique(definition: &str) -> SqlResult<Vec<String>> {
    parse_all(definition, preceded(tag_no_case("UNIQUE"), column_list))
}

pub fn parse_foreign_key(definition: &str) -> SqlResult<ForeignKey> {
    let (columns, ref_table, ref_columns, on_update, on_delete) =
        parse_all(definition, foreign_key)?;
    let action = |parsed: Option<Option<FkAction>>| match parsed {
        None => Ok(FkAction::Restrict),
        Some(Some(action)) => Ok(action),
        Some(None) => Err(SqlError::catalog(definition, "SET DEFAULT is not supported")),
    };
    Ok(ForeignKey::new(columns, ref_table, ref_columns)
        .on_update(action(on_update)?)
        .on_delete(action(on_delete)?))
}

/// Allowed values of an enum CHECK, e.g.
/// `CHECK ((status = ANY (ARRAY['on'::text, 'off'::text])))`.
pub fn parse_check_values(definition: &str) -> SqlResult<Vec<String>> {
    check_values(definition.trim())
        .map(|(_, values)| values)
        .map_err(|e| SqlError::catalog(definition, e.to_string()))
}

fn parse_all<'a, T>(
    definition: &'a str,
    parser: impl FnMut(&'a str) -> IResult<&'a str, T>,
) -> SqlResult<T> {
    all_consuming(terminated(parser, multispace0))(definition.trim())
        .map(|(_, parsed)| parsed)
        .map_err(|e| SqlError::catalog(definition, e.to_string()))
}

fn ws<'a, O>(
    inner: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    delimited(multispace0, inner, multispace0)
}

fn quoted_identifier(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('"'),
            many0(alt((
                map(tag("\"\""), |_| "\"".to_string()),
                map(is_not("\""), |s: &str| s.to_string()),
            ))),
            char('"'),
        ),
        |parts: Vec<String>| parts.concat(),
    )(input)
}

fn bare_identifier(input: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '$'),
        |s: &str| s.to_string(),
    )(input)
}

fn identifier(input: &str) -> IResult<&str, String> {
    alt((quoted_identifier, bare_identifier))(input)
}

/// `schema.table` or `table`; the schema is dropped.
fn qualified_name(input: &str) -> IResult<&str, String> {
    map(
        pair(identifier, opt(preceded(char('.'), identifier))),
        |(first, second)| second.unwrap_or(first),
    )(input)
}

fn column_list(input: &str) -> IResult<&str, Vec<String>> {
    delimited(
        ws(char('(')),
        separated_list1(ws(char(',')), identifier),
        ws(char(')')),
    )(input)
}

fn index_definition(input: &str) -> IResult<&str, IndexDefinition> {
    let (input, _) = tuple((tag_no_case("CREATE"), multispace1))(input)?;
    let (input, unique) = opt(terminated(tag_no_case("UNIQUE"), multispace1))(input)?;
    let (input, _) = tuple((tag_no_case("INDEX"), multispace1))(input)?;
    let (input, name) = identifier(input)?;
    let (input, _) = tuple((multispace1, tag_no_case("ON"), multispace1))(input)?;
    let (input, _) = opt(terminated(tag_no_case("ONLY"), multispace1))(input)?;
    let (input, table) = qualified_name(input)?;
    let (input, _) = opt(preceded(
        tuple((multispace1, tag_no_case("USING"), multispace1)),
        bare_identifier,
    ))(input)?;
    let (input, columns) = column_list(input)?;
    Ok((
        input,
        IndexDefinition {
            unique: unique.is_some(),
            name,
            table,
            columns,
        },
    ))
}

/// `None` stands for SET DEFAULT, which the model cannot express.
fn fk_action(input: &str) -> IResult<&str, Option<FkAction>> {
    alt((
        value(Some(FkAction::Cascade), tag_no_case("CASCADE")),
        value(Some(FkAction::Restrict), tag_no_case("RESTRICT")),
        value(
            Some(FkAction::SetNull),
            tuple((tag_no_case("SET"), multispace1, tag_no_case("NULL"))),
        ),
        value(
            Some(FkAction::Restrict),
            tuple((tag_no_case("NO"), multispace1, tag_no_case("ACTION"))),
        ),
        value(
            None,
            tuple((tag_no_case("SET"), multispace1, tag_no_case("DEFAULT"))),
        ),
    ))(input)
}

fn on_event<'a>(
    event: &'static str,
) -> impl FnMut(&'a str) -> IResult<&'a str, Option<FkAction>> {
    preceded(
        tuple((
            multispace0,
            tag_no_case("ON"),
            multispace1,
            tag_no_case(event),
            multispace1,
        )),
        fk_action,
    )
}

type ForeignKeyParts = (
    Vec<String>,
    String,
    Vec<String>,
    Option<Option<FkAction>>,
    Option<Option<FkAction>>,
);

fn foreign_key(input: &str) -> IResult<&str, ForeignKeyParts> {
    let (input, _) = tuple((tag_no_case("FOREIGN"), multispace1, tag_no_case("KEY")))(input)?;
    let (input, columns) = column_list(input)?;
    let (input, _) = tuple((tag_no_case("REFERENCES"), multispace1))(input)?;
    let (input, ref_table) = qualified_name(input)?;
    let (input, ref_columns) = column_list(input)?;
    let (input, on_update) = opt(on_event("UPDATE"))(input)?;
    let (input, on_delete) = opt(on_event("DELETE"))(input)?;
    Ok((input, (columns, ref_table, ref_columns, on_update, on_delete)))
}

fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('\''),
            many0(alt((
                map(tag("''"), |_| "'".to_string()),
                map(is_not("'"), |s: &str| s.to_string()),
            ))),
            char('\''),
        ),
        |parts: Vec<String>| parts.concat(),
    )(input)
}

fn cast_literal(input: &str) -> IResult<&str, String> {
    terminated(
        string_literal,
        opt(preceded(
            tag("::"),
            take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == ' '),
        )),
    )(input)
}

/// `CHECK ((col = ANY (ARRAY['a'::text, ...])))`, or `CHECK ((col = 'a'::text))`
/// for a single value.
fn check_values(input: &str) -> IResult<&str, Vec<String>> {
    alt((check_array_values, check_single_value))(input)
}

fn check_array_values(input: &str) -> IResult<&str, Vec<String>> {
    preceded(
        tuple((tag_no_case("CHECK"), take_until("ARRAY["), tag("ARRAY["))),
        terminated(separated_list1(ws(char(',')), cast_literal), char(']')),
    )(input)
}

fn check_single_value(input: &str) -> IResult<&str, Vec<String>> {
    let column = terminated(
        alt((delimited(char('('), identifier, char(')')), identifier)),
        opt(preceded(tag("::"), take_while1(|c: char| c.is_alphanumeric() || c == '_'))),
    );
    map(
        delimited(
            tuple((tag_no_case("CHECK"), ws(char('(')), char('('), ws(column), char('='), multispace0)),
            cast_literal,
            tuple((ws(char(')')), char(')'))),
        ),
        |value| vec![value],
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_definition() {
        let parsed = parse_index_definition(
            "CREATE UNIQUE INDEX app_users_email_key ON public.app_users USING btree (email)",
        )
        .unwrap();
        assert!(parsed.unique);
        assert_eq!(parsed.name, "app_users_email_key");
        assert_eq!(parsed.table, "app_users");
        assert_eq!(parsed.columns, vec!["email".to_string()]);

        let parsed = parse_index_definition(
            "CREATE INDEX \"Odd \"\"Name\" ON ONLY \"public\".\"t\" USING btree (a, \"B c\")",
        )
        .unwrap();
        assert!(!parsed.unique);
        assert_eq!(parsed.name, "Odd \"Name");
        assert_eq!(parsed.columns, vec!["a".to_string(), "B c".to_string()]);
    }

    #[test]
    fn test_index_outside_grammar_is_an_error() {
        let partial = "CREATE INDEX t_a_idx ON public.t USING btree (a) WHERE (a > 0)";
        assert!(matches!(
            parse_index_definition(partial),
            Err(SqlError::CatalogParse { .. })
        ));
        let expression = "CREATE INDEX t_lower_idx ON public.t USING btree (lower(a))";
        assert!(parse_index_definition(expression).is_err());
    }

    #[test]
    fn test_key_constraints() {
        assert_eq!(parse_primary_key("PRIMARY KEY (id)").unwrap(), vec!["id"]);
        assert_eq!(
            parse_unique("UNIQUE (org_id, \"email\")").unwrap(),
            vec!["org_id", "email"]
        );
    }

    #[test]
    fn test_foreign_key_actions() {
        let fk = parse_foreign_key(
            "FOREIGN KEY (team_id) REFERENCES app_teams(id) ON UPDATE CASCADE ON DELETE SET NULL",
        )
        .unwrap();
        assert_eq!(fk.columns, vec!["team_id"]);
        assert_eq!(fk.ref_table, "app_teams");
        assert_eq!(fk.ref_columns, vec!["id"]);
        assert_eq!(fk.on_update, FkAction::Cascade);
        assert_eq!(fk.on_delete, FkAction::SetNull);

        let fk = parse_foreign_key("FOREIGN KEY (a) REFERENCES public.t(b)").unwrap();
        assert_eq!(fk.on_delete, FkAction::Restrict);

        assert!(parse_foreign_key("FOREIGN KEY (a) REFERENCES t(b) ON DELETE SET DEFAULT").is_err());
        assert!(parse_foreign_key("FOREIGN KEY (a) REFERENCES t(b) MATCH FULL").is_err());
    }

    #[test]
    fn test_check_values() {
        let values = parse_check_values(
            "CHECK ((status = ANY (ARRAY['on'::text, 'it''s off'::text])))",
        )
        .unwrap();
        assert_eq!(values, vec!["on".to_string(), "it's off".to_string()]);
        assert!(parse_check_values("CHECK ((price > 0))").is_err());
    }

    #[test]
    fn test_check_single_value() {
        assert_eq!(
            parse_check_values("CHECK ((status = 'on'::text))").unwrap(),
            vec!["on".to_string()]
        );
        assert_eq!(
            parse_check_values("CHECK (((mode)::text = 'it''s'::text))").unwrap(),
            vec!["it's".to_string()]
        );
        assert!(parse_check_values("CHECK ((status = lower(status)))").is_err());
    }
}
