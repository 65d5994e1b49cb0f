//! Expression nodes: composable SQL fragments rendered against a [`Query`].
//!
//! Every node renders through [`Expr::render`], which delegates operand
//! rendering to the query's operand compiler so that nested values register
//! their parameters on the statement being built.
//!
//! Nodes that combine operands with an infix operator parenthesize
//! themselves, so they can be embedded anywhere without precedence surprises.

pub mod functions;

use crate::error::BuildError;
use crate::grammar::Feature;
use crate::query::Query;
use crate::value::{IntoColumn, Value};

/// A composable SQL expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    /// `between lower and upper` (supplies its own comparator).
    Between { lower: Value, upper: Value },
    /// `in (a, b, ...)` (supplies its own comparator).
    In(Vec<Value>),
    /// `is null` (supplies its own comparator).
    IsNull,
    /// `exists (sql)`.
    Exists(Box<Query>),
    /// Prefix negation of another node.
    Not(Box<Expr>),
    /// Generic function call `name(args)`.
    Func { name: String, args: Vec<Value> },
    /// Aggregate call `name([distinct ]args)`.
    Aggregate {
        name: String,
        args: Vec<Value>,
        distinct: bool,
    },
    /// `group_concat(...)`.
    GroupConcat(Box<GroupConcat>),
    /// `if(condition, then, otherwise)`.
    If {
        condition: Value,
        then: Value,
        otherwise: Value,
    },
    /// `ifnull(value, fallback)`.
    IfNull { value: Value, fallback: Value },
    /// `nullif(a, b)`.
    NullIf(Value, Value),
    /// `match (fields) against (expr ...)`.
    MatchAgainst(Box<MatchAgainst>),
    /// Infix operation, rendered parenthesized: `(lhs op rhs)`.
    Operation {
        op: String,
        lhs: Value,
        rhs: Value,
    },
    /// Nested query, rendered as `(sql)`.
    SubQuery(Box<Query>),
    /// Session variable assignment `@name := (sql)`.
    Variable { name: String, query: Box<Query> },
    /// `cast(value as ty)`.
    Cast { value: Value, ty: String },
}

impl Expr {
    pub fn between(lower: impl Into<Value>, upper: impl Into<Value>) -> Self {
        Expr::Between {
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    pub fn not_between(lower: impl Into<Value>, upper: impl Into<Value>) -> Self {
        Expr::between(lower, upper).negate()
    }

    /// `in (...)` over a list of values.
    pub fn in_list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::In(values.into_iter().map(Into::into).collect())
    }

    pub fn not_in<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::in_list(values).negate()
    }

    /// `in (sql)` over a sub-query.
    pub fn in_query(query: Query) -> Self {
        Expr::In(vec![Value::SubQuery(Box::new(query))])
    }

    pub fn is_null() -> Self {
        Expr::IsNull
    }

    pub fn is_not_null() -> Self {
        Expr::IsNull.negate()
    }

    pub fn exists(query: Query) -> Self {
        Expr::Exists(Box::new(query))
    }

    pub fn not_exists(query: Query) -> Self {
        Expr::exists(query).negate()
    }

    pub fn func<I, V>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::Func {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn aggregate(name: impl Into<String>, arg: impl IntoColumn, distinct: bool) -> Self {
        Expr::Aggregate {
            name: name.into(),
            args: vec![arg.into_column()],
            distinct,
        }
    }

    pub fn if_(
        condition: impl Into<Value>,
        then: impl Into<Value>,
        otherwise: impl Into<Value>,
    ) -> Self {
        Expr::If {
            condition: condition.into(),
            then: then.into(),
            otherwise: otherwise.into(),
        }
    }

    pub fn if_null(value: impl IntoColumn, fallback: impl Into<Value>) -> Self {
        Expr::IfNull {
            value: value.into_column(),
            fallback: fallback.into(),
        }
    }

    pub fn null_if(value: impl IntoColumn, other: impl Into<Value>) -> Self {
        Expr::NullIf(value.into_column(), other.into())
    }

    /// Infix operation between a column-position lhs and a value rhs.
    pub fn op(lhs: impl IntoColumn, op: impl Into<String>, rhs: impl Into<Value>) -> Self {
        Expr::Operation {
            op: op.into(),
            lhs: lhs.into_column(),
            rhs: rhs.into(),
        }
    }

    /// `(lhs and rhs)` over two already-built conditions.
    pub fn and(lhs: impl Into<Value>, rhs: impl Into<Value>) -> Self {
        Expr::Operation {
            op: "and".to_string(),
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    /// `(lhs or rhs)` over two already-built conditions.
    pub fn or(lhs: impl Into<Value>, rhs: impl Into<Value>) -> Self {
        Expr::Operation {
            op: "or".to_string(),
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    pub fn sub_query(query: Query) -> Self {
        Expr::SubQuery(Box::new(query))
    }

    pub fn variable(name: impl Into<String>, query: Query) -> Self {
        Expr::Variable {
            name: name.into(),
            query: Box::new(query),
        }
    }

    pub fn cast(value: impl IntoColumn, ty: impl Into<String>) -> Self {
        Expr::Cast {
            value: value.into_column(),
            ty: ty.into(),
        }
    }

    /// Wrap this node in [`Expr::Not`].
    pub fn negate(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Whether the rendered node carries its own comparator, suppressing the inferred `=`.
    pub fn supplies_comparator(&self) -> bool {
        match self {
            Expr::Between { .. } | Expr::In(_) | Expr::IsNull => true,
            Expr::Not(inner) => inner.supplies_comparator(),
            _ => false,
        }
    }

    /// Render the node, registering parameters on `query`.
    pub fn render(&self, query: &mut Query) -> String {
        match self {
            Expr::Between { lower, upper } => {
                let lower = query.compile_operand(lower);
                let upper = query.compile_operand(upper);
                format!("between {lower} and {upper}")
            }
            Expr::In(values) => render_in(query, values),
            Expr::IsNull => "is null".to_string(),
            Expr::Exists(sub) => format!("exists ({})", query.embed_query(sub)),
            Expr::Not(inner) => match inner.as_ref() {
                Expr::IsNull => "is not null".to_string(),
                other => format!("not {}", other.render(query)),
            },
            Expr::Func { name, args } => {
                let args = render_args(query, args);
                format!("{name}({args})")
            }
            Expr::Aggregate {
                name,
                args,
                distinct,
            } => {
                let args = render_args(query, args);
                if *distinct {
                    format!("{name}(distinct {args})")
                } else {
                    format!("{name}({args})")
                }
            }
            Expr::GroupConcat(gc) => gc.render(query),
            Expr::If {
                condition,
                then,
                otherwise,
            } => {
                let condition = query.compile_operand(condition);
                let then = query.compile_operand(then);
                let otherwise = query.compile_operand(otherwise);
                if query.supports(Feature::IfFunctions) {
                    format!("if({condition}, {then}, {otherwise})")
                } else {
                    format!("case when {condition} then {then} else {otherwise} end")
                }
            }
            Expr::IfNull { value, fallback } => {
                let value = query.compile_operand(value);
                let fallback = query.compile_operand(fallback);
                if query.supports(Feature::IfFunctions) {
                    format!("ifnull({value}, {fallback})")
                } else {
                    format!("coalesce({value}, {fallback})")
                }
            }
            Expr::NullIf(a, b) => {
                let a = query.compile_operand(a);
                let b = query.compile_operand(b);
                format!("nullif({a}, {b})")
            }
            Expr::MatchAgainst(m) => m.render(query),
            Expr::Operation { op, lhs, rhs } => {
                let lhs = query.compile_operand(lhs);
                let rhs = query.compile_operand(rhs);
                format!("({lhs} {op} {rhs})")
            }
            Expr::SubQuery(sub) => format!("({})", query.embed_query(sub)),
            Expr::Variable { name, query: sub } => {
                query.require(Feature::Variables);
                format!("@{name} := ({})", query.embed_query(sub))
            }
            Expr::Cast { value, ty } => {
                let value = query.compile_operand(value);
                format!("cast({value} as {ty})")
            }
        }
    }
}

fn render_args(query: &mut Query, args: &[Value]) -> String {
    let sep = query.column_separator();
    args.iter()
        .map(|arg| query.compile_operand(arg))
        .collect::<Vec<_>>()
        .join(sep)
}

fn render_in(query: &mut Query, values: &[Value]) -> String {
    match values {
        [] => "in (null)".to_string(),
        [Value::SubQuery(sub)] => format!("in ({})", query.embed_query(sub)),
        values => format!("in ({})", render_args(query, values)),
    }
}

/// `group_concat([distinct ]expr[ order by ...][ separator '...'][ limit n][ offset m])`.
#[derive(Debug, Clone)]
pub struct GroupConcat {
    expr: Value,
    distinct: bool,
    order_by: Vec<(Value, bool)>,
    separator: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl GroupConcat {
    pub fn new(expr: impl IntoColumn) -> Self {
        Self {
            expr: expr.into_column(),
            distinct: false,
            order_by: Vec::new(),
            separator: None,
            limit: None,
            offset: None,
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Order the concatenated values; `desc` selects descending order.
    pub fn order_by(mut self, column: impl IntoColumn, desc: bool) -> Self {
        self.order_by.push((column.into_column(), desc));
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn render(&self, query: &mut Query) -> String {
        if !query.require(Feature::GroupConcat) {
            return String::new();
        }
        let mut out = String::from("group_concat(");
        if self.distinct {
            out.push_str("distinct ");
        }
        out.push_str(&query.compile_operand(&self.expr));
        if !self.order_by.is_empty() {
            let sep = query.column_separator();
            let terms: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, desc)| {
                    let column = query.compile_operand(column);
                    if *desc {
                        format!("{column} desc")
                    } else {
                        format!("{column} asc")
                    }
                })
                .collect();
            out.push_str(" order by ");
            out.push_str(&terms.join(sep));
        }
        if let Some(separator) = &self.separator {
            let literal = query.quote_literal(separator);
            out.push_str(" separator ");
            out.push_str(&literal);
        }
        if let Some(limit) = self.limit {
            out.push_str(&format!(" limit {limit}"));
        }
        if let Some(offset) = self.offset {
            out.push_str(&format!(" offset {offset}"));
        }
        out.push(')');
        out
    }
}

impl From<GroupConcat> for Expr {
    fn from(gc: GroupConcat) -> Self {
        Expr::GroupConcat(Box::new(gc))
    }
}

impl From<GroupConcat> for Value {
    fn from(gc: GroupConcat) -> Self {
        Value::Expr(Box::new(gc.into()))
    }
}

/// Full-text `match (fields) against (expr)` predicate.
#[derive(Debug, Clone)]
pub struct MatchAgainst {
    fields: Vec<Value>,
    expr: Value,
    boolean_mode: bool,
    query_expansion: bool,
}

impl MatchAgainst {
    pub fn new<I, C>(fields: I, expr: impl Into<Value>) -> Self
    where
        I: IntoIterator<Item = C>,
        C: IntoColumn,
    {
        Self {
            fields: fields.into_iter().map(IntoColumn::into_column).collect(),
            expr: expr.into(),
            boolean_mode: false,
            query_expansion: false,
        }
    }

    pub fn boolean_mode(mut self) -> Self {
        self.boolean_mode = true;
        self
    }

    pub fn query_expansion(mut self) -> Self {
        self.query_expansion = true;
        self
    }

    fn render(&self, query: &mut Query) -> String {
        if !query.require(Feature::MatchAgainst) {
            return String::new();
        }
        let fields = render_args(query, &self.fields);
        let expr = query.compile_operand(&self.expr);
        let mut against = expr;
        if self.boolean_mode {
            against.push_str(" in boolean mode");
        }
        if self.query_expansion {
            against.push_str(" with query expansion");
        }
        format!("match ({fields}) against ({against})")
    }
}

impl From<MatchAgainst> for Expr {
    fn from(m: MatchAgainst) -> Self {
        Expr::MatchAgainst(Box::new(m))
    }
}

impl From<MatchAgainst> for Value {
    fn from(m: MatchAgainst) -> Self {
        Value::Expr(Box::new(m.into()))
    }
}

pub(crate) fn unsupported(dialect: &'static str, feature: Feature) -> BuildError {
    BuildError::Unsupported {
        dialect,
        feature: feature.to_string(),
    }
}
