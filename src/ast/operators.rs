use crate::error::{SqlError, SqlResult};
use std::str::FromStr;

/// Comparison operator set: `< > <= >= = != LIKE ILIKE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Gt,
    Lte,
    Gte,
    Eq,
    Ne,
    Like,
    ILike,
}

impl CompareOp {
    pub fn sql_symbol(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Lte => "<=",
            CompareOp::Gte => ">=",
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Like => "LIKE",
            CompareOp::ILike => "ILIKE",
        }
    }
}

impl FromStr for CompareOp {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "<" => Ok(CompareOp::Lt),
            ">" => Ok(CompareOp::Gt),
            "<=" => Ok(CompareOp::Lte),
            ">=" => Ok(CompareOp::Gte),
            "=" => Ok(CompareOp::Eq),
            "!=" | "<>" => Ok(CompareOp::Ne),
            "LIKE" => Ok(CompareOp::Like),
            "ILIKE" => Ok(CompareOp::ILike),
            _ => Err(SqlError::InvalidOperator(s.to_string())),
        }
    }
}

/// Logical connective between predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoolOp {
    #[default]
    And,
    Or,
}

impl BoolOp {
    pub fn sql_symbol(&self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }
}

impl FromStr for BoolOp {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "AND" => Ok(BoolOp::And),
            "OR" => Ok(BoolOp::Or),
            _ => Err(SqlError::InvalidOperator(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn sql_symbol(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }
}

impl FromStr for ArithOp {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        match s.trim() {
            "+" => Ok(ArithOp::Add),
            "-" => Ok(ArithOp::Sub),
            "*" => Ok(ArithOp::Mul),
            "/" => Ok(ArithOp::Div),
            _ => Err(SqlError::InvalidOperator(s.to_string())),
        }
    }
}

/// Join Type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Left,
    Right,
    Full,
    Inner,
    Cross,
}

impl JoinKind {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

impl FromStr for JoinKind {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "LEFT" => Ok(JoinKind::Left),
            "RIGHT" => Ok(JoinKind::Right),
            "FULL" => Ok(JoinKind::Full),
            "INNER" => Ok(JoinKind::Inner),
            "CROSS" => Ok(JoinKind::Cross),
            _ => Err(SqlError::InvalidJoin(format!("unknown join kind '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionKind {
    All,
    Distinct,
}

impl UnionKind {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            UnionKind::All => "UNION ALL",
            UnionKind::Distinct => "UNION",
        }
    }
}

impl FromStr for UnionKind {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "ALL" => Ok(UnionKind::All),
            "DISTINCT" => Ok(UnionKind::Distinct),
            _ => Err(SqlError::InvalidUnion(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "ASC" => Ok(Direction::Asc),
            "DESC" => Ok(Direction::Desc),
            _ => Err(SqlError::InvalidOperator(s.to_string())),
        }
    }
}
