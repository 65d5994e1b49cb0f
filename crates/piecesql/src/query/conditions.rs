//! WHERE / HAVING / ON predicates.
//!
//! The first predicate of a clause uses the bare keyword (`where`), later
//! ones continue with `and` (or `or`). `on` tracks a per-join flag instead
//! of scanning the pieces, since every join starts its own `on`.

use super::{Operands, Query};
use crate::expr::{Expr, MatchAgainst};
use crate::value::{IntoColumn, Value};

impl Query {
    fn condition_keyword(&mut self, base: &'static str, or: bool) -> &'static str {
        let connective = if or { "or" } else { "and" };
        let defined = if base == "on" {
            std::mem::replace(&mut self.on_defined, true)
        } else {
            self.is_clause_defined(base)
        };
        let pending = self.pending_connective.take();
        if !defined {
            return base;
        }
        pending.unwrap_or(connective)
    }

    fn add_condition(&mut self, base: &'static str, or: bool, operands: Operands) -> &mut Self {
        let keyword = self.condition_keyword(base, or);
        self.add_operands(keyword, operands)
    }

    fn condition_group<F>(&mut self, or: bool, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        let saved = self.pending_connective;
        if or {
            self.pending_connective = Some("or");
        }
        let len_before = self.pieces.len();
        self.parenthesis(f);
        // The first predicate inside the group owns the connective; an empty
        // group leaves it for whatever comes next.
        self.pending_connective = if self.pieces.len() == len_before {
            saved
        } else {
            None
        };
        self
    }

    // ==================== WHERE ====================

    /// `where column = value` (`is null` for a null value).
    pub fn where_(&mut self, column: impl IntoColumn, value: impl Into<Value>) -> &mut Self {
        self.add_condition(
            "where",
            false,
            Operands::Pair(column.into_column(), value.into()),
        )
    }

    /// `where column <op> value`.
    pub fn where_cmp(
        &mut self,
        column: impl IntoColumn,
        op: &str,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.add_condition(
            "where",
            false,
            Operands::Compare(column.into_column(), op.to_string(), value.into()),
        )
    }

    /// `where <expr>` for a self-contained expression.
    pub fn where_expr(&mut self, expr: impl Into<Value>) -> &mut Self {
        self.add_condition("where", false, Operands::Single(expr.into()))
    }

    /// `where lhs <op> rhs` comparing two columns.
    pub fn where_column(&mut self, lhs: impl IntoColumn, op: &str, rhs: impl IntoColumn) -> &mut Self {
        self.add_condition(
            "where",
            false,
            Operands::Compare(lhs.into_column(), op.to_string(), rhs.into_column()),
        )
    }

    pub fn or_where(&mut self, column: impl IntoColumn, value: impl Into<Value>) -> &mut Self {
        self.add_condition(
            "where",
            true,
            Operands::Pair(column.into_column(), value.into()),
        )
    }

    pub fn or_where_cmp(
        &mut self,
        column: impl IntoColumn,
        op: &str,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.add_condition(
            "where",
            true,
            Operands::Compare(column.into_column(), op.to_string(), value.into()),
        )
    }

    /// `where column in (...)`; an empty list matches nothing.
    pub fn where_in<I, V>(&mut self, column: impl IntoColumn, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return self.where_raw("1 = 0");
        }
        self.add_condition(
            "where",
            false,
            Operands::Pair(column.into_column(), Expr::In(values).into()),
        )
    }

    /// `where column not in (...)`; an empty list matches everything.
    pub fn where_not_in<I, V>(&mut self, column: impl IntoColumn, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return self.where_raw("1 = 1");
        }
        self.add_condition(
            "where",
            false,
            Operands::Pair(column.into_column(), Expr::In(values).negate().into()),
        )
    }

    /// `where column in (sub-query)`.
    pub fn where_in_query(&mut self, column: impl IntoColumn, query: Query) -> &mut Self {
        self.add_condition(
            "where",
            false,
            Operands::Pair(column.into_column(), Expr::in_query(query).into()),
        )
    }

    pub fn where_null(&mut self, column: impl IntoColumn) -> &mut Self {
        self.add_condition(
            "where",
            false,
            Operands::Pair(column.into_column(), Expr::is_null().into()),
        )
    }

    pub fn where_not_null(&mut self, column: impl IntoColumn) -> &mut Self {
        self.add_condition(
            "where",
            false,
            Operands::Pair(column.into_column(), Expr::is_not_null().into()),
        )
    }

    pub fn where_between(
        &mut self,
        column: impl IntoColumn,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> &mut Self {
        self.add_condition(
            "where",
            false,
            Operands::Pair(column.into_column(), Expr::between(lower, upper).into()),
        )
    }

    pub fn where_not_between(
        &mut self,
        column: impl IntoColumn,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> &mut Self {
        self.add_condition(
            "where",
            false,
            Operands::Pair(column.into_column(), Expr::not_between(lower, upper).into()),
        )
    }

    pub fn where_exists(&mut self, query: Query) -> &mut Self {
        self.add_condition("where", false, Operands::Single(Expr::exists(query).into()))
    }

    pub fn where_not_exists(&mut self, query: Query) -> &mut Self {
        self.add_condition(
            "where",
            false,
            Operands::Single(Expr::not_exists(query).into()),
        )
    }

    /// Full-text predicate (`match ... against ...`).
    pub fn where_match(&mut self, predicate: MatchAgainst) -> &mut Self {
        self.add_condition("where", false, Operands::Single(predicate.into()))
    }

    /// Raw predicate text, emitted verbatim.
    pub fn where_raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.add_condition("where", false, Operands::Single(Value::raw(sql)))
    }

    /// `where (...)` / `and (...)` around the predicates added by `f`.
    pub fn where_group<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.condition_group(false, f)
    }

    /// `or (...)` around the predicates added by `f`.
    pub fn or_where_group<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.condition_group(true, f)
    }

    // ==================== HAVING ====================

    pub fn having(&mut self, column: impl IntoColumn, value: impl Into<Value>) -> &mut Self {
        self.add_condition(
            "having",
            false,
            Operands::Pair(column.into_column(), value.into()),
        )
    }

    pub fn having_cmp(
        &mut self,
        column: impl IntoColumn,
        op: &str,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.add_condition(
            "having",
            false,
            Operands::Compare(column.into_column(), op.to_string(), value.into()),
        )
    }

    pub fn or_having(&mut self, column: impl IntoColumn, value: impl Into<Value>) -> &mut Self {
        self.add_condition(
            "having",
            true,
            Operands::Pair(column.into_column(), value.into()),
        )
    }

    pub fn having_raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.add_condition("having", false, Operands::Single(Value::raw(sql)))
    }

    // ==================== ON ====================

    /// `on lhs = rhs` between two columns of the join being built.
    pub fn on(&mut self, lhs: impl IntoColumn, rhs: impl IntoColumn) -> &mut Self {
        self.add_condition(
            "on",
            false,
            Operands::Pair(lhs.into_column(), rhs.into_column()),
        )
    }

    /// `on lhs <op> rhs` between two columns.
    pub fn on_cmp(&mut self, lhs: impl IntoColumn, op: &str, rhs: impl IntoColumn) -> &mut Self {
        self.add_condition(
            "on",
            false,
            Operands::Compare(lhs.into_column(), op.to_string(), rhs.into_column()),
        )
    }

    /// `on column = value` with a bound value.
    pub fn on_value(&mut self, column: impl IntoColumn, value: impl Into<Value>) -> &mut Self {
        self.add_condition(
            "on",
            false,
            Operands::Pair(column.into_column(), value.into()),
        )
    }

    pub fn or_on(&mut self, lhs: impl IntoColumn, rhs: impl IntoColumn) -> &mut Self {
        self.add_condition(
            "on",
            true,
            Operands::Pair(lhs.into_column(), rhs.into_column()),
        )
    }
}
