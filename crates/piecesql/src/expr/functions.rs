//! Constructors for common SQL functions.
//!
//! Column-position arguments accept anything [`IntoColumn`] (plain strings
//! become escaped column references); literal arguments accept anything
//! `Into<Value>` (plain strings become quoted literals).

use super::{Expr, GroupConcat, MatchAgainst};
use crate::value::{IntoColumn, Value};

fn call1(name: &str, arg: impl IntoColumn) -> Expr {
    Expr::Func {
        name: name.to_string(),
        args: vec![arg.into_column()],
    }
}

fn call_columns<I, C>(name: &str, args: I) -> Expr
where
    I: IntoIterator<Item = C>,
    C: IntoColumn,
{
    Expr::Func {
        name: name.to_string(),
        args: args.into_iter().map(IntoColumn::into_column).collect(),
    }
}

// ── Aggregates ──

/// `count(column)`; pass `"*"` for `count(*)`.
pub fn count(column: impl IntoColumn) -> Expr {
    Expr::aggregate("count", column, false)
}

pub fn count_distinct(column: impl IntoColumn) -> Expr {
    Expr::aggregate("count", column, true)
}

pub fn sum(column: impl IntoColumn) -> Expr {
    Expr::aggregate("sum", column, false)
}

pub fn avg(column: impl IntoColumn) -> Expr {
    Expr::aggregate("avg", column, false)
}

pub fn min(column: impl IntoColumn) -> Expr {
    Expr::aggregate("min", column, false)
}

pub fn max(column: impl IntoColumn) -> Expr {
    Expr::aggregate("max", column, false)
}

pub fn group_concat(column: impl IntoColumn) -> GroupConcat {
    GroupConcat::new(column)
}

// ── Comparison / null handling ──

pub fn coalesce<I, C>(args: I) -> Expr
where
    I: IntoIterator<Item = C>,
    C: IntoColumn,
{
    call_columns("coalesce", args)
}

pub fn greatest<I, C>(args: I) -> Expr
where
    I: IntoIterator<Item = C>,
    C: IntoColumn,
{
    call_columns("greatest", args)
}

pub fn least<I, C>(args: I) -> Expr
where
    I: IntoIterator<Item = C>,
    C: IntoColumn,
{
    call_columns("least", args)
}

pub fn if_null(column: impl IntoColumn, fallback: impl Into<Value>) -> Expr {
    Expr::if_null(column, fallback)
}

pub fn null_if(column: impl IntoColumn, other: impl Into<Value>) -> Expr {
    Expr::null_if(column, other)
}

// ── Math ──

pub fn abs(column: impl IntoColumn) -> Expr {
    call1("abs", column)
}

pub fn ceil(column: impl IntoColumn) -> Expr {
    call1("ceil", column)
}

pub fn floor(column: impl IntoColumn) -> Expr {
    call1("floor", column)
}

/// `round(column, precision)`.
pub fn round(column: impl IntoColumn, precision: i32) -> Expr {
    Expr::Func {
        name: "round".to_string(),
        args: vec![column.into_column(), Value::raw(precision.to_string())],
    }
}

/// `mod(column, divisor)`.
pub fn modulo(column: impl IntoColumn, divisor: impl Into<Value>) -> Expr {
    Expr::Func {
        name: "mod".to_string(),
        args: vec![column.into_column(), divisor.into()],
    }
}

// ── Strings ──

pub fn concat<I, V>(args: I) -> Expr
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Expr::func("concat", args)
}

pub fn lower(column: impl IntoColumn) -> Expr {
    call1("lower", column)
}

pub fn upper(column: impl IntoColumn) -> Expr {
    call1("upper", column)
}

pub fn length(column: impl IntoColumn) -> Expr {
    call1("length", column)
}

pub fn trim(column: impl IntoColumn) -> Expr {
    call1("trim", column)
}

/// `substr(column, start, len)`.
pub fn substr(column: impl IntoColumn, start: i64, len: i64) -> Expr {
    Expr::Func {
        name: "substr".to_string(),
        args: vec![
            column.into_column(),
            Value::raw(start.to_string()),
            Value::raw(len.to_string()),
        ],
    }
}

/// `replace(column, from, to)`.
pub fn replace(column: impl IntoColumn, from: impl Into<Value>, to: impl Into<Value>) -> Expr {
    Expr::Func {
        name: "replace".to_string(),
        args: vec![column.into_column(), from.into(), to.into()],
    }
}

// ── Dates ──

pub fn now() -> Expr {
    Expr::Func {
        name: "now".to_string(),
        args: Vec::new(),
    }
}

pub fn date(column: impl IntoColumn) -> Expr {
    call1("date", column)
}

/// `date_format(column, format)`; the format is quoted as a literal.
pub fn date_format(column: impl IntoColumn, format: impl Into<String>) -> Expr {
    Expr::Func {
        name: "date_format".to_string(),
        args: vec![column.into_column(), Value::scalar(format.into())],
    }
}

pub fn year(column: impl IntoColumn) -> Expr {
    call1("year", column)
}

pub fn month(column: impl IntoColumn) -> Expr {
    call1("month", column)
}

pub fn day(column: impl IntoColumn) -> Expr {
    call1("day", column)
}

pub fn hour(column: impl IntoColumn) -> Expr {
    call1("hour", column)
}

pub fn minute(column: impl IntoColumn) -> Expr {
    call1("minute", column)
}

pub fn second(column: impl IntoColumn) -> Expr {
    call1("second", column)
}

// ── Full text ──

pub fn match_against<I, C>(fields: I, expr: impl Into<Value>) -> MatchAgainst
where
    I: IntoIterator<Item = C>,
    C: IntoColumn,
{
    MatchAgainst::new(fields, expr)
}
