//! The query builder.
//!
//! A [`Query`] owns an ordered list of [`Piece`]s plus a parameter table.
//! Builder methods take `&mut self` and return `&mut Self` (or a
//! `QueryResult<&mut Self>` when misuse is detectable at the call site), so
//! a chain always mutates the same instance.
//!
//! ```ignore
//! let conn = LiteralConnection::postgres().into_shared();
//! let mut q = Query::new(conn);
//! q.select(["id", "name"]).from("users").where_("id", 5);
//! assert_eq!(q.to_sql(), r#"select "id", "name" from "users" where "id" = :p1_0"#);
//! ```

mod compile;
mod conditions;
mod derived;
mod mutation;
mod select;


pub use compile::Operands;
pub use derived::Page;
pub use select::JoinKind;

use crate::connection::Connection;
use crate::error::{BuildError, QueryError, QueryResult};
use crate::param::{Param, ParamList};
use crate::piece::{self, Data, Piece};
use crate::statement::{DebugQuery, Statement, StatementKind};
use std::sync::Arc;

/// A relation declared on a model, used by relation-aware predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub name: String,
    /// Table holding the related rows.
    pub table: String,
    /// Column on the related table.
    pub related_column: String,
    /// Column on the model table.
    pub local_column: String,
}

/// Table and key metadata for model-aware helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMeta {
    pub table: String,
    /// Declared primary key columns, in key order.
    pub primary_key: Vec<String>,
    pub relations: Vec<Relation>,
}

impl ModelMeta {
    pub fn new<I, S>(table: impl Into<String>, primary_key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            primary_key: primary_key.into_iter().map(Into::into).collect(),
            relations: Vec::new(),
        }
    }

    /// Declare `table.foreign_key` referencing this model's first key column.
    pub fn has_many(
        mut self,
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        let local_column = self
            .primary_key
            .first()
            .cloned()
            .unwrap_or_else(|| "id".to_string());
        self.relations.push(Relation {
            name: name.into(),
            table: table.into(),
            related_column: foreign_key.into(),
            local_column,
        });
        self
    }

    /// Declare this model's `foreign_key` referencing `table.owner_key`.
    pub fn belongs_to(
        mut self,
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
        owner_key: impl Into<String>,
    ) -> Self {
        self.relations.push(Relation {
            name: name.into(),
            table: table.into(),
            related_column: owner_key.into(),
            local_column: foreign_key.into(),
        });
        self
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name == name)
    }
}

/// Query builder state.
#[derive(Debug)]
pub struct Query {
    connection: Arc<dyn Connection>,
    pieces: Vec<Piece>,
    params: ParamList,
    /// Last clause keyword added (tokens of length <= 1 never become current).
    current_clause: Option<String>,
    /// Whether the join being built already has an `on` predicate.
    on_defined: bool,
    /// Insert position for new pieces; `None` appends.
    splice_at: Option<usize>,
    /// Connective forced onto the next condition (`or` groups).
    pending_connective: Option<&'static str>,
    model: Option<ModelMeta>,
    build_error: Option<BuildError>,
}

impl Query {
    /// Create an empty builder bound to `connection`.
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            pieces: Vec::new(),
            params: ParamList::new(),
            current_clause: None,
            on_defined: false,
            splice_at: None,
            pending_connective: None,
            model: None,
            build_error: None,
        }
    }

    /// Create a builder bound to a model's table and keys.
    pub fn for_model(connection: Arc<dyn Connection>, model: ModelMeta) -> Self {
        let mut query = Self::new(connection);
        query.model = Some(model);
        query
    }

    /// Create a builder that selects everything from `table`.
    pub fn table(connection: Arc<dyn Connection>, table: &str) -> Self {
        let mut query = Self::new(connection);
        query.select_all().from(table);
        query
    }

    /// A fresh, empty builder on the same connection.
    pub fn fresh(&self) -> Self {
        Self::new(Arc::clone(&self.connection))
    }

    // ==================== Accessors ====================

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Registered parameters in registration order.
    pub fn params(&self) -> &[Param] {
        self.params.as_slice()
    }

    pub fn current_clause(&self) -> Option<&str> {
        self.current_clause.as_deref()
    }

    pub fn model(&self) -> Option<&ModelMeta> {
        self.model.as_ref()
    }

    pub fn set_model(&mut self, model: ModelMeta) -> &mut Self {
        self.model = Some(model);
        self
    }

    pub fn is_prepared(&self) -> bool {
        self.connection.config().prepared
    }

    // ==================== Piece management ====================

    /// Append (or splice at the cursor) a piece.
    ///
    /// A `select`-family piece merges into the existing select piece instead
    /// of adding a second one.
    pub fn add_piece(
        &mut self,
        clause: impl Into<String>,
        data: Option<Data>,
        separator: Option<String>,
    ) -> &mut Self {
        let clause = clause.into();
        if is_select_family(&clause) {
            if let Some(idx) = self.select_index() {
                let piece = &mut self.pieces[idx];
                merge_select_data(piece, data);
                if clause != "select" {
                    piece.clause = clause.clone();
                }
                self.current_clause = Some(clause);
                return self;
            }
            if let Some(from) = self.pieces.iter().position(|p| p.clause == "from") {
                self.pieces.insert(from, Piece::new(clause.clone(), data, separator));
                if let Some(at) = self.splice_at.as_mut().filter(|at| **at > from) {
                    *at += 1;
                }
                self.current_clause = Some(clause);
                return self;
            }
        }
        self.insert_piece(Piece::new(clause, data, separator));
        self
    }

    /// Insert a piece verbatim and return its index.
    pub(crate) fn insert_piece(&mut self, piece: Piece) -> usize {
        if piece.clause.len() > 1 {
            self.current_clause = Some(piece.clause.clone());
        }
        match self.splice_at {
            Some(at) if at <= self.pieces.len() => {
                self.pieces.insert(at, piece);
                self.splice_at = Some(at + 1);
                at
            }
            _ => {
                self.pieces.push(piece);
                self.pieces.len() - 1
            }
        }
    }

    /// Whether any piece carries `clause` as its keyword.
    pub fn is_clause_defined(&self, clause: &str) -> bool {
        self.pieces.iter().any(|p| p.clause == clause)
    }

    pub(crate) fn clause_index(&self, clause: &str) -> Option<usize> {
        self.pieces.iter().position(|p| p.clause == clause)
    }

    pub(crate) fn select_index(&self) -> Option<usize> {
        self.pieces.iter().position(|p| is_select_family(&p.clause))
    }

    /// Remove the first `clause` piece and the continuation pieces trailing it.
    pub fn remove_clause(&mut self, clause: &str) -> &mut Self {
        let Some(idx) = self.clause_index(clause) else {
            return self;
        };
        let mut end = idx + 1;
        while end < self.pieces.len() && self.pieces[end].is_continuation() {
            end += 1;
        }
        self.pieces.drain(idx..end);
        if let Some(at) = self.splice_at {
            if at > idx {
                self.splice_at = Some(at.saturating_sub(end - idx).max(idx));
            }
        }
        self.current_clause = self
            .pieces
            .iter()
            .rev()
            .find(|p| p.clause.len() > 1)
            .map(|p| p.clause.clone());
        self
    }

    /// Replace the first `clause` piece in place with `f(piece)`.
    pub fn replace_clause<F>(&mut self, clause: &str, f: F) -> QueryResult<&mut Self>
    where
        F: FnOnce(Piece) -> Piece,
    {
        let idx = self
            .clause_index(clause)
            .ok_or_else(|| QueryError::MissingClause(clause.to_string()))?;
        let piece = std::mem::replace(&mut self.pieces[idx], Piece::token(""));
        self.pieces[idx] = f(piece);
        Ok(self)
    }

    /// Append another builder's pieces and parameters verbatim.
    pub fn merge(&mut self, other: Query) -> &mut Self {
        let Query {
            pieces,
            params,
            build_error,
            ..
        } = other;
        for piece in pieces {
            self.insert_piece(piece);
        }
        self.params.extend(&params);
        if let Some(err) = build_error {
            self.defer_error(err);
        }
        self
    }

    /// Wrap whatever `f` adds in parentheses, pulling the first inner clause
    /// keyword onto the opening piece (`where (a or b)`).
    pub fn parenthesis<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.parenthesis_with(f, true)
    }

    /// Like [`parenthesis`](Self::parenthesis) with explicit control over patching.
    pub fn parenthesis_with<F>(&mut self, f: F, patch: bool) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        let open = self.insert_piece(Piece::token("("));
        let len_before = self.pieces.len();
        f(self);
        if self.pieces.len() == len_before {
            // Nothing was added; drop the opening token instead of rendering `()`.
            self.pieces.remove(open);
            if let Some(at) = self.splice_at.filter(|at| *at > open) {
                self.splice_at = Some(at - 1);
            }
            return self;
        }
        if patch {
            self.patch_open(open);
        }
        self.insert_piece(Piece::token(")"));
        self
    }

    fn patch_open(&mut self, open: usize) {
        let Some(next) = self.pieces.get(open + 1) else {
            return;
        };
        if matches!(next.clause.as_str(), "" | "(" | ")" | ",") {
            return;
        }
        let clause = std::mem::take(&mut self.pieces[open + 1].clause);
        let piece = &mut self.pieces[open];
        piece.clause = clause;
        piece.data = Some(Data::Single("(".to_string()));
    }

    /// Append a raw SQL fragment as its own token.
    pub fn raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.insert_piece(Piece::token(sql));
        self
    }

    // ==================== Rendering ====================

    /// Render the SQL text. Pure and idempotent.
    pub fn to_sql(&self) -> String {
        piece::render(&self.pieces, self.connection.grammar().column_separator())
    }

    /// Surface any error recorded while compiling chained calls.
    pub fn validate(&self) -> QueryResult<()> {
        match &self.build_error {
            Some(err) => Err(err.clone().into()),
            None => Ok(()),
        }
    }

    /// Validate and render into a [`Statement`].
    pub fn build(&self) -> QueryResult<Statement> {
        self.validate()?;
        Ok(self.statement())
    }

    fn statement(&self) -> Statement {
        Statement {
            sql: self.to_sql(),
            params: self.params.as_slice().to_vec(),
            kind: if self.is_prepared() {
                StatementKind::Prepared
            } else {
                StatementKind::Raw
            },
        }
    }

    /// Debug view `{sql, type, params}`; never fails.
    pub fn debug(&self) -> DebugQuery {
        self.statement().debug()
    }

    pub(crate) fn defer_error(&mut self, err: BuildError) {
        if self.build_error.is_none() {
            self.build_error = Some(err);
        }
    }
}

impl Clone for Query {
    /// Deep copy; the clone registers further parameters under a fresh namespace.
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            pieces: self.pieces.clone(),
            params: self.params.fork(),
            current_clause: self.current_clause.clone(),
            on_defined: self.on_defined,
            splice_at: self.splice_at,
            pending_connective: self.pending_connective,
            model: self.model.clone(),
            build_error: self.build_error.clone(),
        }
    }
}

pub(crate) fn is_select_family(clause: &str) -> bool {
    clause == "select" || clause == "select distinct"
}

fn data_items(data: Option<Data>) -> Vec<String> {
    match data {
        None => Vec::new(),
        Some(Data::Single(s)) => vec![s],
        Some(Data::List(items)) => items,
    }
}

fn merge_select_data(piece: &mut Piece, data: Option<Data>) {
    let incoming = data_items(data);
    if incoming.is_empty() {
        return;
    }
    let mut existing = data_items(piece.data.take());
    if existing.len() == 1 && existing[0] == "*" {
        existing.clear();
    }
    for item in incoming {
        if !existing.contains(&item) {
            existing.push(item);
        }
    }
    piece.data = Some(Data::List(existing));
}
