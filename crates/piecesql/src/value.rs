//! Literal/value model.
//!
//! [`Scalar`] is what ends up in the parameter table (or quoted inline).
//! [`Value`] is the closed set of operands the expression compiler accepts:
//! it separates raw SQL and column references, which are emitted verbatim or
//! escaped, from scalars, which are always bound or quoted.

use crate::expr::Expr;
use crate::query::Query;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A bindable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    Uuid(uuid::Uuid),
    Json(serde_json::Value),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Interpret a scalar returned by an existence/count query as a boolean.
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Null => false,
            Scalar::Bool(b) => *b,
            Scalar::Int(n) => *n != 0,
            Scalar::Float(f) => *f != 0.0,
            Scalar::Text(s) => !s.is_empty() && s != "0",
            _ => true,
        }
    }

    /// Interpret a scalar as an integer (counts come back as `Int`).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            Scalar::Bool(b) => Some(i64::from(*b)),
            Scalar::Text(s) => s.parse().ok(),
            _ => None,
        }
    }
}

macro_rules! impl_scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(value.into())
                }
            }
        )*
    };
}

impl_scalar_from! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Text,
    &str => Text,
    Vec<u8> => Bytes,
    &[u8] => Bytes,
    NaiveDateTime => Timestamp,
    uuid::Uuid => Uuid,
    serde_json::Value => Json,
}

impl From<&String> for Scalar {
    fn from(value: &String) -> Self {
        Scalar::Text(value.clone())
    }
}

impl From<DateTime<Utc>> for Scalar {
    fn from(value: DateTime<Utc>) -> Self {
        Scalar::Timestamp(value.naive_utc())
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

/// The scalar a backed enum resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BackedValue {
    Text(String),
    Int(i64),
}

/// An enum whose variants are backed by a string or integer.
///
/// String-backed values render as quoted literals, integer-backed values as
/// raw numeric literals. Use `#[derive(BackedEnum)]` to implement it.
pub trait BackedEnum {
    fn backing_value(&self) -> BackedValue;
}

/// A user-defined expression with optional setup/teardown hooks.
///
/// `before` runs before the owning predicate is appended and may inject
/// pieces; `after` runs once the predicate piece is in place.
pub trait CustomExpression: Send + Sync + fmt::Debug {
    /// Render the expression against `query`, registering parameters as needed.
    fn render(&self, query: &mut Query) -> String;

    /// Whether the rendered text already carries its own comparator.
    fn supplies_comparator(&self) -> bool {
        false
    }

    fn before(&self, _query: &mut Query) {}

    fn after(&self, _query: &mut Query) {}
}

/// An operand of the expression compiler.
#[derive(Debug, Clone)]
pub enum Value {
    /// Column reference, escaped by the grammar.
    Column(String),
    /// Raw SQL fragment, emitted verbatim.
    Raw(String),
    /// Bound (or inline-quoted) value.
    Scalar(Scalar),
    /// Backed enum value, rendered as a literal.
    Enum(BackedValue),
    /// Expression node.
    Expr(Box<Expr>),
    /// Nested query, rendered as `(sql)`.
    SubQuery(Box<Query>),
    /// User-defined expression.
    Custom(Arc<dyn CustomExpression>),
}

impl Value {
    pub fn column(name: impl Into<String>) -> Self {
        Value::Column(name.into())
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Value::Raw(sql.into())
    }

    pub fn scalar(value: impl Into<Scalar>) -> Self {
        Value::Scalar(value.into())
    }

    pub fn from_enum<E: BackedEnum + ?Sized>(value: &E) -> Self {
        Value::Enum(value.backing_value())
    }

    pub fn custom(expr: impl CustomExpression + 'static) -> Self {
        Value::Custom(Arc::new(expr))
    }

    /// Whether this operand supplies its own comparator (`is null`, `in (...)`, `between`).
    pub fn supplies_comparator(&self) -> bool {
        match self {
            Value::Expr(expr) => expr.supplies_comparator(),
            Value::Custom(custom) => custom.supplies_comparator(),
            _ => false,
        }
    }
}

macro_rules! impl_value_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Scalar(value.into())
                }
            }
        )*
    };
}

impl_value_from_scalar!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    String,
    &String,
    &str,
    Vec<u8>,
    &[u8],
    NaiveDateTime,
    DateTime<Utc>,
    uuid::Uuid,
    serde_json::Value,
    Scalar,
);

impl<T: Into<Scalar>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        Value::Scalar(value.into())
    }
}

impl From<Expr> for Value {
    fn from(expr: Expr) -> Self {
        Value::Expr(Box::new(expr))
    }
}

impl From<Query> for Value {
    fn from(query: Query) -> Self {
        Value::SubQuery(Box::new(query))
    }
}

/// Conversion for column-position operands: strings become column references.
pub trait IntoColumn {
    fn into_column(self) -> Value;
}

impl IntoColumn for &str {
    fn into_column(self) -> Value {
        Value::Column(self.to_string())
    }
}

impl IntoColumn for String {
    fn into_column(self) -> Value {
        Value::Column(self)
    }
}

impl IntoColumn for &String {
    fn into_column(self) -> Value {
        Value::Column(self.clone())
    }
}

impl IntoColumn for Value {
    fn into_column(self) -> Value {
        self
    }
}

impl IntoColumn for Expr {
    fn into_column(self) -> Value {
        Value::Expr(Box::new(self))
    }
}

impl IntoColumn for Query {
    fn into_column(self) -> Value {
        Value::SubQuery(Box::new(self))
    }
}

/// Column reference operand.
pub fn col(name: impl Into<String>) -> Value {
    Value::column(name)
}

/// Raw SQL operand.
pub fn raw(sql: impl Into<String>) -> Value {
    Value::raw(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_become_text_values_but_columns_in_column_position() {
        assert!(matches!(Value::from("id"), Value::Scalar(Scalar::Text(_))));
        assert!(matches!("id".into_column(), Value::Column(_)));
    }

    #[test]
    fn options_map_to_null() {
        assert_eq!(Scalar::from(None::<i32>), Scalar::Null);
        assert_eq!(Scalar::from(Some(3_i32)), Scalar::Int(3));
    }

    #[test]
    fn truthiness_of_driver_scalars() {
        assert!(Scalar::Int(1).is_truthy());
        assert!(!Scalar::Int(0).is_truthy());
        assert!(Scalar::Bool(true).is_truthy());
        assert!(!Scalar::Null.is_truthy());
        assert_eq!(Scalar::Text("42".into()).as_i64(), Some(42));
    }

    #[test]
    fn scalars_serialize_untagged() {
        let json = serde_json::to_string(&vec![
            Scalar::Int(5),
            Scalar::Text("a".into()),
            Scalar::Null,
        ])
        .unwrap();
        assert_eq!(json, r#"[5,"a",null]"#);
    }
}
