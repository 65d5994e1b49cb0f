//! Statement execution.
//!
//! [`Executor`] is the seam between the builder and a database driver. The
//! crate implements it for `tokio_postgres::Client` and
//! `tokio_postgres::Transaction`, rewriting named placeholders into `$n`.

use crate::config::QueryConfig;
use crate::error::{QueryError, QueryResult};
use crate::statement::{Statement, StatementKind};
use crate::value::Scalar;
use std::future::Future;
use tokio_postgres::types::ToSql;

/// Runs rendered statements.
pub trait Executor: Send + Sync {
    type Row: Send;

    /// Execute a query and return all rows.
    fn fetch_all(
        &self,
        statement: &Statement,
    ) -> impl Future<Output = QueryResult<Vec<Self::Row>>> + Send;

    /// Execute a query and return the first column of the first row.
    ///
    /// Returns [`Scalar::Null`] when the query yields no rows.
    fn fetch_scalar(&self, statement: &Statement) -> impl Future<Output = QueryResult<Scalar>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(&self, statement: &Statement) -> impl Future<Output = QueryResult<u64>> + Send;
}

fn positional(statement: &Statement) -> (String, Vec<&(dyn ToSql + Sync)>) {
    match statement.kind {
        StatementKind::Prepared => {
            let (sql, values) = statement.postgres_positional();
            let params = values
                .into_iter()
                .map(|v| v as &(dyn ToSql + Sync))
                .collect();
            (sql, params)
        }
        StatementKind::Raw => (statement.sql.clone(), Vec::new()),
    }
}

macro_rules! impl_postgres_executor {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Executor for $ty {
                type Row = tokio_postgres::Row;

                async fn fetch_all(&self, statement: &Statement) -> QueryResult<Vec<Self::Row>> {
                    let (sql, params) = positional(statement);
                    Ok(self.query(sql.as_str(), &params).await?)
                }

                async fn fetch_scalar(&self, statement: &Statement) -> QueryResult<Scalar> {
                    let (sql, params) = positional(statement);
                    let row = self.query_opt(sql.as_str(), &params).await?;
                    match row {
                        Some(row) => row
                            .try_get::<_, Scalar>(0)
                            .map_err(|e| QueryError::decode("0", e.to_string())),
                        None => Ok(Scalar::Null),
                    }
                }

                async fn execute(&self, statement: &Statement) -> QueryResult<u64> {
                    let (sql, params) = positional(statement);
                    Ok(<$ty>::execute(self, sql.as_str(), &params).await?)
                }
            }
        )*
    };
}

impl_postgres_executor!(tokio_postgres::Client, tokio_postgres::Transaction<'_>);

/// Truncate `sql` to at most `max_bytes` on a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
fn truncate_sql(config: &QueryConfig, sql: &str) -> String {
    match config.max_logged_sql_length {
        Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
        _ => sql.to_string(),
    }
}

/// Emit the statement about to run (target `piecesql.sql`).
#[cfg(feature = "tracing")]
pub(crate) fn log_statement(config: &QueryConfig, statement: &Statement) {
    use tracing::Level;

    if !config.log_sql {
        return;
    }

    macro_rules! emit_at_level {
        ($level:expr, $($field:tt)*) => {
            match $level {
                Level::ERROR => tracing::error!($($field)*),
                Level::WARN => tracing::warn!($($field)*),
                Level::INFO => tracing::info!($($field)*),
                Level::DEBUG => tracing::debug!($($field)*),
                Level::TRACE => tracing::trace!($($field)*),
            }
        };
    }

    let sql = truncate_sql(config, &statement.sql);
    emit_at_level!(
        config.log_level,
        target: "piecesql.sql",
        kind = %statement.kind,
        param_count = statement.params.len(),
        sql = %sql,
    );
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn log_statement(_config: &QueryConfig, _statement: &Statement) {}
