//! INSERT / REPLACE / UPDATE / DELETE clauses.

use super::Query;
use crate::error::{QueryError, QueryResult};
use crate::grammar::Feature;
use crate::piece::{Data, Piece};
use crate::value::{IntoColumn, Value};

impl Query {
    /// `insert into table (columns...)`.
    pub fn insert_into<I, S>(&mut self, table: &str, columns: I) -> QueryResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.insert_head("insert into", table, columns)
    }

    /// `replace into table (columns...)` on engines that have it.
    pub fn replace_into<I, S>(&mut self, table: &str, columns: I) -> QueryResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure(Feature::ReplaceInto)?;
        self.insert_head("replace into", table, columns)
    }

    fn insert_head<I, S>(&mut self, keyword: &str, table: &str, columns: I) -> QueryResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns: Vec<String> = columns
            .into_iter()
            .map(|c| self.escape(c.as_ref()))
            .collect();
        if columns.is_empty() {
            return Err(QueryError::incomplete(format!(
                "{keyword} {table} requires at least one column"
            )));
        }
        let target = format!(
            "{} ({})",
            self.escape(table),
            columns.join(self.column_separator())
        );
        self.add_piece(keyword, Some(Data::Single(target)), None);
        Ok(self)
    }

    /// Append one row of values; values are always bound (or quoted inline).
    pub fn values<I, V>(&mut self, row: I) -> QueryResult<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let row: Vec<Value> = row.into_iter().map(Into::into).collect();
        if row.is_empty() {
            return Err(QueryError::incomplete("values requires at least one field"));
        }
        let rendered: Vec<String> = row.iter().map(|v| self.resolve_operand(v)).collect();
        let tuple = format!("({})", rendered.join(self.column_separator()));
        let clause = if self.is_clause_defined("values") {
            ","
        } else {
            "values"
        };
        self.add_piece(clause, Some(Data::Single(tuple)), None);
        Ok(self)
    }

    /// `update table`.
    pub fn update(&mut self, table: &str) -> &mut Self {
        let target = self.escape(table);
        self.add_piece("update", Some(Data::Single(target)), None)
    }

    /// `set column = value`; later calls continue the list.
    pub fn set(&mut self, column: impl IntoColumn, value: impl Into<Value>) -> &mut Self {
        let column = column.into_column();
        let value = value.into();
        let lhs = self.resolve_operand(&column);
        let rhs = self.resolve_operand(&value);
        self.add_assignment(format!("{lhs} = {rhs}"))
    }

    /// `set column = <raw sql>`.
    pub fn set_raw(&mut self, column: &str, sql: impl Into<String>) -> &mut Self {
        let assignment = format!("{} = {}", self.escape(column), sql.into());
        self.add_assignment(assignment)
    }

    fn add_assignment(&mut self, assignment: String) -> &mut Self {
        let clause = if self.is_clause_defined("set") {
            ","
        } else {
            "set"
        };
        self.add_piece(clause, Some(Data::Single(assignment)), None)
    }

    /// `delete from table`.
    pub fn delete_from(&mut self, table: &str) -> &mut Self {
        let target = self.escape(table);
        self.add_piece("delete from", Some(Data::Single(target)), None)
    }

    /// Upsert: overwrite `update_columns` with the incoming row on a key conflict.
    ///
    /// Renders `on duplicate key update ...` on MySQL and
    /// `on conflict (...) do update set ...` where that is available.
    pub fn on_conflict_update<C, U, S, T>(
        &mut self,
        conflict_columns: C,
        update_columns: U,
    ) -> QueryResult<&mut Self>
    where
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
        U: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let updates: Vec<String> = update_columns
            .into_iter()
            .map(|c| self.escape(c.as_ref()))
            .collect();
        if updates.is_empty() {
            return Err(QueryError::incomplete(
                "upsert requires at least one column to update",
            ));
        }
        let sep = self.column_separator();

        if self.supports(Feature::OnDuplicateKey) {
            let assignments: Vec<String> = updates
                .iter()
                .map(|c| format!("{c} = values({c})"))
                .collect();
            self.add_piece(
                "on duplicate key update",
                Some(Data::Single(assignments.join(sep))),
                None,
            );
            return Ok(self);
        }

        self.ensure(Feature::OnConflict)?;
        let conflict: Vec<String> = conflict_columns
            .into_iter()
            .map(|c| self.escape(c.as_ref()))
            .collect();
        if conflict.is_empty() {
            return Err(QueryError::incomplete(
                "on conflict requires at least one conflict column",
            ));
        }
        let assignments: Vec<String> = updates
            .iter()
            .map(|c| format!("{c} = excluded.{c}"))
            .collect();
        self.add_piece(
            "on conflict",
            Some(Data::Single(format!(
                "({}) do update set {}",
                conflict.join(sep),
                assignments.join(sep)
            ))),
            None,
        );
        Ok(self)
    }

    /// `on conflict (columns) do nothing`.
    pub fn on_conflict_do_nothing<C, S>(&mut self, conflict_columns: C) -> QueryResult<&mut Self>
    where
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure(Feature::OnConflict)?;
        let conflict: Vec<String> = conflict_columns
            .into_iter()
            .map(|c| self.escape(c.as_ref()))
            .collect();
        let data = if conflict.is_empty() {
            "do nothing".to_string()
        } else {
            format!("({}) do nothing", conflict.join(self.column_separator()))
        };
        self.add_piece("on conflict", Some(Data::Single(data)), None);
        Ok(self)
    }

    /// `returning columns...` on engines that have it.
    pub fn returning<I, C>(&mut self, columns: I) -> QueryResult<&mut Self>
    where
        I: IntoIterator<Item = C>,
        C: IntoColumn,
    {
        self.ensure(Feature::Returning)?;
        let items: Vec<String> = columns
            .into_iter()
            .map(|c| {
                let value = c.into_column();
                self.resolve_operand(&value)
            })
            .collect();
        let items = if items.is_empty() {
            vec!["*".to_string()]
        } else {
            items
        };
        self.insert_piece(Piece::new("returning", Some(Data::List(items)), None));
        Ok(self)
    }
}
