//! Expression compiler: operands to SQL fragments.

use super::Query;
use crate::error::{BuildError, QueryError, QueryResult};
use crate::expr::{self, Expr};
use crate::grammar::Feature;
use crate::piece::Data;
use crate::value::{BackedValue, CustomExpression, Scalar, Value};
use std::sync::Arc;

/// The operand shapes a predicate can take.
///
/// A comparator always comes with a right-hand side, so the
/// "comparator without value" state cannot be expressed.
#[derive(Debug, Clone)]
pub enum Operands {
    /// `lhs`
    Single(Value),
    /// `lhs = rhs`, or `lhs rhs` when `rhs` supplies its own comparator.
    Pair(Value, Value),
    /// `lhs cmp rhs`
    Compare(Value, String, Value),
}

impl Operands {
    fn customs(&self) -> Vec<Arc<dyn CustomExpression>> {
        let values: Vec<&Value> = match self {
            Operands::Single(lhs) => vec![lhs],
            Operands::Pair(lhs, rhs) | Operands::Compare(lhs, _, rhs) => vec![lhs, rhs],
        };
        values
            .into_iter()
            .filter_map(|v| match v {
                Value::Custom(custom) => Some(Arc::clone(custom)),
                _ => None,
            })
            .collect()
    }
}

impl Query {
    /// Compile `lhs [cmp] [rhs]` into one piece under `clause`.
    ///
    /// Fails with [`QueryError::InvalidExpression`] when a comparator is given
    /// without a right-hand side or when `lhs` is missing.
    pub fn add_expression(
        &mut self,
        clause: &str,
        lhs: Option<Value>,
        cmp: Option<&str>,
        rhs: Option<Value>,
    ) -> QueryResult<&mut Self> {
        let operands = match (lhs, cmp, rhs) {
            (Some(lhs), None, None) => Operands::Single(lhs),
            (Some(lhs), None, Some(rhs)) => Operands::Pair(lhs, rhs),
            (Some(lhs), Some(cmp), Some(rhs)) => Operands::Compare(lhs, cmp.to_string(), rhs),
            (Some(_), Some(cmp), None) => {
                return Err(QueryError::InvalidExpression(format!(
                    "comparator `{cmp}` has no right-hand side"
                )));
            }
            (None, _, _) => {
                return Err(QueryError::InvalidExpression(
                    "expression has no left-hand side".to_string(),
                ));
            }
        };
        Ok(self.add_operands(clause, operands))
    }

    /// Compile typed operands into one piece under `clause`, running custom hooks.
    pub fn add_operands(&mut self, clause: &str, operands: Operands) -> &mut Self {
        let customs = operands.customs();
        for custom in &customs {
            custom.before(self);
        }
        let text = self.compile_operands(operands);
        self.add_piece(clause, Some(Data::Single(text)), None);
        for custom in &customs {
            custom.after(self);
        }
        self
    }

    fn compile_operands(&mut self, operands: Operands) -> String {
        match operands {
            Operands::Single(lhs) => self.resolve_operand(&lhs),
            Operands::Pair(lhs, rhs) => {
                let lhs = self.resolve_operand(&lhs);
                if rhs.supplies_comparator() {
                    let rhs = self.resolve_operand(&rhs);
                    format!("{lhs} {rhs}")
                } else if matches!(rhs, Value::Scalar(Scalar::Null)) {
                    format!("{lhs} is null")
                } else {
                    let rhs = self.resolve_operand(&rhs);
                    format!("{lhs} = {rhs}")
                }
            }
            Operands::Compare(lhs, cmp, rhs) => {
                let lhs = self.resolve_operand(&lhs);
                let rhs = self.resolve_operand(&rhs);
                format!("{lhs} {cmp} {rhs}")
            }
        }
    }

    /// Resolve a predicate side: scalars (text included) are always bound.
    pub(crate) fn resolve_operand(&mut self, value: &Value) -> String {
        match value {
            Value::Column(name) => self.escape(name),
            Value::Raw(sql) => sql.clone(),
            Value::Scalar(scalar) => self.bind_scalar(scalar),
            Value::Enum(backed) => self.enum_literal(backed),
            Value::Expr(expr) => expr.render(self),
            Value::SubQuery(sub) => format!("({})", self.embed_query(sub)),
            Value::Custom(custom) => custom.render(self),
        }
    }

    /// Compile a bare operand (function argument, list item, bound).
    ///
    /// Dispatch order: sub-query, backed enum, expression node, raw
    /// fragment, column, text, boolean, then bound parameter. Raw fragments
    /// are never quoted.
    pub fn compile_operand(&mut self, value: &Value) -> String {
        match value {
            Value::SubQuery(sub) => format!("({})", self.embed_query(sub)),
            Value::Enum(backed) => self.enum_literal(backed),
            Value::Expr(expr) => expr.render(self),
            Value::Custom(custom) => custom.render(self),
            Value::Raw(sql) => sql.clone(),
            Value::Column(name) => self.escape(name),
            Value::Scalar(Scalar::Text(text)) => self.quote_literal(text),
            Value::Scalar(Scalar::Bool(b)) => self.connection.grammar().boolean_literal(*b).to_string(),
            Value::Scalar(Scalar::Null) => "null".to_string(),
            Value::Scalar(scalar) => self.bind_scalar(scalar),
        }
    }

    /// Register `value` as a parameter (prepared) or quote it inline (unprepared).
    pub fn bind_scalar(&mut self, value: &Scalar) -> String {
        if self.is_prepared() {
            return self.params.push(value.clone());
        }
        match self.connection.quote(value) {
            Ok(literal) => literal,
            Err(err) => {
                self.defer_error(BuildError::Quote(quote_message(err)));
                "null".to_string()
            }
        }
    }

    /// Quote `text` inline regardless of mode.
    pub(crate) fn quote_literal(&mut self, text: &str) -> String {
        match self.connection.quote(&Scalar::Text(text.to_string())) {
            Ok(literal) => literal,
            Err(err) => {
                self.defer_error(BuildError::Quote(quote_message(err)));
                "''".to_string()
            }
        }
    }

    fn enum_literal(&mut self, backed: &BackedValue) -> String {
        match backed {
            BackedValue::Text(text) => self.quote_literal(text),
            BackedValue::Int(n) => n.to_string(),
        }
    }

    /// Render a nested query in place, adopting its parameters.
    pub(crate) fn embed_query(&mut self, sub: &Query) -> String {
        self.params.extend(&sub.params);
        if let Some(err) = &sub.build_error {
            self.defer_error(err.clone());
        }
        sub.to_sql()
    }

    /// Escape a (possibly qualified or aliased) identifier with the connection grammar.
    pub fn escape(&self, name: &str) -> String {
        self.connection.grammar().escape_identifier(name)
    }

    pub(crate) fn escape_alias(&self, alias: &str) -> String {
        self.connection.grammar().escape_part(alias)
    }

    pub(crate) fn column_separator(&self) -> &'static str {
        self.connection.grammar().column_separator()
    }

    pub(crate) fn supports(&self, feature: Feature) -> bool {
        self.connection.grammar().supports(feature)
    }

    /// Record an unsupported-construct error unless the grammar supports `feature`.
    pub(crate) fn require(&mut self, feature: Feature) -> bool {
        if self.supports(feature) {
            return true;
        }
        let dialect = self.connection.grammar().name();
        self.defer_error(expr::unsupported(dialect, feature));
        false
    }

    /// Like [`require`](Self::require) but fails at the call site.
    pub(crate) fn ensure(&self, feature: Feature) -> QueryResult<()> {
        if self.supports(feature) {
            Ok(())
        } else {
            Err(QueryError::unsupported(self.connection.grammar().name(), feature))
        }
    }

    /// Render an expression node against this query.
    pub fn render_expr(&mut self, expr: &Expr) -> String {
        expr.render(self)
    }
}

fn quote_message(err: QueryError) -> String {
    match err {
        QueryError::ConnectionQuote(message) => message,
        other => other.to_string(),
    }
}
