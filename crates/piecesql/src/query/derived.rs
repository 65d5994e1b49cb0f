//! Queries derived from a builder (counts, explain, pagination), model-aware
//! predicates and the execution entry points.

use super::{Query, is_select_family};
use crate::error::{PrimaryKeyArity, QueryError, QueryResult};
use crate::exec::{self, Executor};
use crate::piece::{Data, Piece};
use crate::statement::Statement;
use crate::value::{Scalar, Value};
use serde::Serialize;

/// Upper bound applied to `per_page`.
pub const MAX_PER_PAGE: u64 = 1000;

/// One page of results plus the totals needed to navigate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub last_page: u64,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.page < self.last_page
    }
}

fn clamp_page(page: u64, per_page: u64) -> (u64, u64) {
    (page.max(1), per_page.clamp(1, MAX_PER_PAGE))
}

impl Query {
    // ==================== Counts ====================

    /// Query counting the rows this query returns, ignoring limit/offset.
    ///
    /// Plain queries are rewritten in place to `select count(*)`; grouped,
    /// filtered-by-having, distinct or compound queries are wrapped in a
    /// sub-select.
    pub fn result_count_query(&self) -> QueryResult<Query> {
        let select = self.select_clause()?;
        let simple = select == "select"
            && !self.is_compound()
            && !self.is_clause_defined("group by")
            && !self.is_clause_defined("having");
        if !simple {
            return self.total_count_query();
        }
        let mut count = self.clone();
        count.strip_pagination();
        count.replace_clause("select", |piece| {
            Piece::new(
                piece.clause,
                Some(Data::List(vec!["count(*)".to_string()])),
                None,
            )
        })?;
        Ok(count)
    }

    /// `select count(*) from (<this query>) as __count`, ignoring limit/offset.
    pub fn total_count_query(&self) -> QueryResult<Query> {
        let select = self.select_clause()?;
        let mut inner = self.clone();
        inner.strip_pagination();
        // Union branches must keep matching select lists.
        if select == "select" && !self.is_compound() {
            let data = if inner.is_clause_defined("having") {
                "*"
            } else {
                "1"
            };
            inner.replace_clause("select", |piece| {
                Piece::new(
                    piece.clause,
                    Some(Data::List(vec![data.to_string()])),
                    None,
                )
            })?;
        }

        let mut count = self.fresh();
        count.select_raw("count(*)");
        let sql = count.embed_query(&inner);
        let target = format!("({sql}) as {}", count.escape_alias("__count"));
        count.add_piece("from", Some(Data::Single(target)), None);
        Ok(count)
    }

    fn select_clause(&self) -> QueryResult<String> {
        self.pieces
            .iter()
            .find(|p| is_select_family(&p.clause))
            .map(|p| p.clause.clone())
            .ok_or_else(|| QueryError::MissingClause("select".to_string()))
    }

    /// Whether the pieces hold more than one select (unions, merged queries).
    fn is_compound(&self) -> bool {
        self.is_clause_defined("union")
            || self.is_clause_defined("union all")
            || self.pieces.iter().filter(|p| is_select_family(&p.clause)).count() > 1
    }

    fn strip_pagination(&mut self) {
        self.remove_clause("limit")
            .remove_clause("order by")
            .remove_clause("offset");
    }

    /// `explain <this query>`.
    pub fn explain(&self) -> Query {
        let mut explain = self.clone();
        explain.pieces.insert(0, Piece::token("explain"));
        if let Some(at) = explain.splice_at.as_mut() {
            *at += 1;
        }
        explain
    }

    // ==================== Pagination ====================

    /// Restrict to one page. `page` is 1-based; `per_page` is clamped to
    /// `1..=MAX_PER_PAGE`. The offset saturates at `u64::MAX`.
    pub fn paginate(&mut self, page: u64, per_page: u64) -> &mut Self {
        let (page, per_page) = clamp_page(page, per_page);
        self.limit(per_page)
            .offset((page - 1).saturating_mul(per_page))
    }

    // ==================== Model-aware predicates ====================

    /// `where pk1 = ? and pk2 = ?` over the model's declared key columns.
    pub fn where_primary_key<I, V>(&mut self, values: I) -> QueryResult<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let (table, keys) = self.primary_key_columns("where_primary_key")?;
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        PrimaryKeyArity::check(keys.len(), values.len())?;
        for (key, value) in keys.iter().zip(values) {
            self.where_(format!("{table}.{key}"), value);
        }
        Ok(self)
    }

    /// Match any of `rows`, each holding one value per key column.
    ///
    /// A single-column key renders `in (...)`; a composite key renders
    /// `((pk1 = ? and pk2 = ?) or (pk1 = ? and pk2 = ?))`. No rows matches
    /// nothing.
    pub fn where_primary_key_in<I, R, V>(&mut self, rows: I) -> QueryResult<&mut Self>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let (table, keys) = self.primary_key_columns("where_primary_key_in")?;
        let rows: Vec<Vec<Value>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        for row in &rows {
            PrimaryKeyArity::check(keys.len(), row.len())?;
        }
        if rows.is_empty() {
            return Ok(self.where_raw("1 = 0"));
        }

        let columns: Vec<String> = keys.iter().map(|k| format!("{table}.{k}")).collect();
        if let [column] = columns.as_slice() {
            let values = rows.into_iter().flatten();
            return Ok(self.where_in(column.as_str(), values));
        }

        self.where_group(|q| {
            for (i, row) in rows.into_iter().enumerate() {
                let add_row = |q: &mut Query| {
                    for (column, value) in columns.iter().zip(row) {
                        q.where_(column.as_str(), value);
                    }
                };
                if i == 0 {
                    q.where_group(add_row);
                } else {
                    q.or_where_group(add_row);
                }
            }
        });
        Ok(self)
    }

    fn primary_key_columns(&self, helper: &str) -> QueryResult<(String, Vec<String>)> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| QueryError::MissingModel(format!("{helper} requires a bound model")))?;
        if model.primary_key.is_empty() {
            return Err(QueryError::MissingModel(format!(
                "model `{}` declares no primary key",
                model.table
            )));
        }
        Ok((model.table.clone(), model.primary_key.clone()))
    }

    /// `where exists (select 1 from related where related.fk = model.key ...)`.
    ///
    /// `f` adds further predicates to the correlated sub-query.
    pub fn where_has<F>(&mut self, relation: &str, f: F) -> QueryResult<&mut Self>
    where
        F: FnOnce(&mut Query),
    {
        let model = self.model.as_ref().ok_or_else(|| {
            QueryError::MissingModel(format!("where_has(`{relation}`) requires a bound model"))
        })?;
        let rel = model.relation(relation).ok_or_else(|| {
            QueryError::MissingModel(format!(
                "model `{}` has no relation `{relation}`",
                model.table
            ))
        })?;
        let related = format!("{}.{}", rel.table, rel.related_column);
        let local = format!("{}.{}", model.table, rel.local_column);
        let table = rel.table.clone();

        let mut sub = self.fresh();
        sub.select_raw("1")
            .from(&table)
            .where_column(related.as_str(), "=", local.as_str());
        f(&mut sub);
        Ok(self.where_exists(sub))
    }

    // ==================== Execution ====================

    fn prepare(&self) -> QueryResult<Statement> {
        let statement = self.build()?;
        exec::log_statement(self.connection.config(), &statement);
        Ok(statement)
    }

    /// Run the query and return all rows.
    pub async fn fetch_all<E: Executor>(&self, executor: &E) -> QueryResult<Vec<E::Row>> {
        let statement = self.prepare()?;
        executor.fetch_all(&statement).await
    }

    /// Run the query and return the first row, or [`QueryError::NotFound`].
    pub async fn fetch_one<E: Executor>(&self, executor: &E) -> QueryResult<E::Row> {
        let statement = self.prepare()?;
        executor
            .fetch_all(&statement)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::not_found("Expected 1 row, got 0"))
    }

    /// Run the query and return the first column of the first row.
    pub async fn fetch_scalar<E: Executor>(&self, executor: &E) -> QueryResult<Scalar> {
        let statement = self.prepare()?;
        executor.fetch_scalar(&statement).await
    }

    /// Run a mutation and return the number of affected rows.
    pub async fn execute<E: Executor>(&self, executor: &E) -> QueryResult<u64> {
        let statement = self.prepare()?;
        executor.execute(&statement).await
    }

    /// Whether the query yields at least one row.
    pub async fn exists<E: Executor>(&self, executor: &E) -> QueryResult<bool> {
        let mut probe = self.fresh();
        let sql = probe.embed_query(self);
        probe.select_raw(format!("exists ({sql})"));
        Ok(probe.fetch_scalar(executor).await?.is_truthy())
    }

    /// Count of rows this query returns, ignoring limit/offset.
    pub async fn result_count<E: Executor>(&self, executor: &E) -> QueryResult<u64> {
        let count = self.result_count_query()?;
        scalar_count(count.fetch_scalar(executor).await?)
    }

    /// Like [`result_count`](Self::result_count) but always via a sub-select.
    pub async fn total_count<E: Executor>(&self, executor: &E) -> QueryResult<u64> {
        let count = self.total_count_query()?;
        scalar_count(count.fetch_scalar(executor).await?)
    }

    /// Fetch one page of rows together with the total row count.
    pub async fn fetch_page<E: Executor>(
        &self,
        executor: &E,
        page: u64,
        per_page: u64,
    ) -> QueryResult<Page<E::Row>> {
        let (page, per_page) = clamp_page(page, per_page);
        let total = self.total_count(executor).await?;
        let mut paged = self.clone();
        paged.paginate(page, per_page);
        let items = paged.fetch_all(executor).await?;
        Ok(Page {
            items,
            total,
            page,
            per_page,
            last_page: total.div_ceil(per_page).max(1),
        })
    }
}

fn scalar_count(value: Scalar) -> QueryResult<u64> {
    match value {
        Scalar::Null => Ok(0),
        other => other
            .as_i64()
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| QueryError::decode("count", format!("expected a count, got {other:?}"))),
    }
}
