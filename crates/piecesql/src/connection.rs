//! Connection collaborator: owns the grammar and quotes literals inline.

use crate::config::QueryConfig;
use crate::error::{QueryError, QueryResult};
use crate::grammar::{Dialect, Grammar};
use crate::value::Scalar;
use std::fmt;
use std::sync::Arc;

/// What the query builder needs from a database connection.
///
/// Execution lives on [`Executor`](crate::Executor); a `Connection` only
/// provides the grammar, the configuration and inline literal quoting for
/// unprepared mode.
pub trait Connection: Send + Sync + fmt::Debug {
    fn grammar(&self) -> &dyn Grammar;

    fn config(&self) -> &QueryConfig;

    /// Quote `value` as an inline SQL literal.
    fn quote(&self, value: &Scalar) -> QueryResult<String>;
}

/// A connection that quotes literals using the grammar's escaping rules.
#[derive(Debug, Clone)]
pub struct LiteralConnection {
    grammar: Arc<dyn Grammar>,
    config: QueryConfig,
}

impl LiteralConnection {
    /// Create a connection for the dialect named in `config`.
    pub fn new(config: QueryConfig) -> Self {
        Self {
            grammar: config.dialect.grammar(),
            config,
        }
    }

    /// Create a connection with a custom grammar.
    pub fn with_grammar(grammar: Arc<dyn Grammar>, config: QueryConfig) -> Self {
        Self { grammar, config }
    }

    pub fn mysql() -> Self {
        Self::new(QueryConfig::new().dialect(Dialect::MySql))
    }

    pub fn postgres() -> Self {
        Self::new(QueryConfig::new().dialect(Dialect::Postgres))
    }

    pub fn sqlite() -> Self {
        Self::new(QueryConfig::new().dialect(Dialect::Sqlite))
    }

    /// Switch to unprepared mode (values quoted inline).
    pub fn unprepared(mut self) -> Self {
        self.config.prepared = false;
        self
    }

    pub fn into_shared(self) -> Arc<dyn Connection> {
        Arc::new(self)
    }

    fn quote_text(&self, value: &str) -> QueryResult<String> {
        if value.contains('\0') {
            return Err(QueryError::ConnectionQuote(
                "string literal cannot contain NUL character".to_string(),
            ));
        }
        let escaped = self.grammar.escape_string(value);
        let mut out = String::with_capacity(escaped.len() + 2);
        out.push('\'');
        out.push_str(&escaped);
        out.push('\'');
        Ok(out)
    }
}

impl Default for LiteralConnection {
    fn default() -> Self {
        Self::new(QueryConfig::default())
    }
}

impl Connection for LiteralConnection {
    fn grammar(&self) -> &dyn Grammar {
        self.grammar.as_ref()
    }

    fn config(&self) -> &QueryConfig {
        &self.config
    }

    fn quote(&self, value: &Scalar) -> QueryResult<String> {
        match value {
            Scalar::Null => Ok("null".to_string()),
            Scalar::Bool(b) => Ok(self.grammar.boolean_literal(*b).to_string()),
            Scalar::Int(n) => Ok(n.to_string()),
            Scalar::Float(f) if f.is_finite() => Ok(f.to_string()),
            Scalar::Float(f) => Err(QueryError::ConnectionQuote(format!(
                "non-finite float {f} has no SQL literal"
            ))),
            Scalar::Text(s) => self.quote_text(s),
            Scalar::Bytes(b) => Ok(self.grammar.bytes_literal(b)),
            Scalar::Timestamp(ts) => {
                self.quote_text(&ts.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            }
            Scalar::Uuid(u) => self.quote_text(&u.to_string()),
            Scalar::Json(v) => self.quote_text(&v.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_text_per_dialect() {
        let mysql = LiteralConnection::mysql();
        let pg = LiteralConnection::postgres();
        let value = Scalar::Text(r"O'Brien\".into());
        assert_eq!(mysql.quote(&value).unwrap(), r"'O''Brien\\'");
        assert_eq!(pg.quote(&value).unwrap(), r"'O''Brien\'");
    }

    #[test]
    fn quotes_numbers_and_booleans() {
        let mysql = LiteralConnection::mysql();
        assert_eq!(mysql.quote(&Scalar::Int(-4)).unwrap(), "-4");
        assert_eq!(mysql.quote(&Scalar::Bool(true)).unwrap(), "1");
        assert_eq!(
            LiteralConnection::postgres()
                .quote(&Scalar::Bool(false))
                .unwrap(),
            "false"
        );
        assert_eq!(mysql.quote(&Scalar::Null).unwrap(), "null");
    }

    #[test]
    fn refuses_unquotable_values() {
        let conn = LiteralConnection::default();
        assert!(matches!(
            conn.quote(&Scalar::Text("a\0b".into())),
            Err(QueryError::ConnectionQuote(_))
        ));
        assert!(matches!(
            conn.quote(&Scalar::Float(f64::NAN)),
            Err(QueryError::ConnectionQuote(_))
        ));
    }

    #[test]
    fn quotes_bytes() {
        let bytes = Scalar::Bytes(vec![0xde, 0xad]);
        assert_eq!(LiteralConnection::mysql().quote(&bytes).unwrap(), "X'DEAD'");
        assert_eq!(
            LiteralConnection::postgres().quote(&bytes).unwrap(),
            r"'\xdead'::bytea"
        );
    }
}
