//! SELECT-side clauses: columns, FROM, joins, grouping, ordering, paging,
//! unions and common table expressions.

use super::Query;
use crate::grammar::Feature;
use crate::piece::{Data, Piece};
use crate::value::{IntoColumn, Value};

/// Join flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "inner join",
            JoinKind::Left => "left join",
            JoinKind::Right => "right join",
            JoinKind::Full => "full outer join",
            JoinKind::Cross => "cross join",
        }
    }
}

/// Clauses a join must be spliced in front of.
const AFTER_JOINS: &[&str] = &[
    "where",
    "group by",
    "having",
    "order by",
    "limit",
    "offset",
    "union",
    "union all",
    "for update",
];

impl Query {
    // ==================== SELECT ====================

    /// Add columns to the select list. Strings are column references
    /// (`"u.name as n"` is escaped on both sides); expressions render in place.
    /// An empty list selects `*`.
    pub fn select<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: IntoColumn,
    {
        let items = self.select_items(columns);
        self.add_piece("select", Some(Data::List(items)), None)
    }

    /// `select *`.
    pub fn select_all(&mut self) -> &mut Self {
        self.add_piece("select", Some(Data::List(vec!["*".to_string()])), None)
    }

    /// Like [`select`](Self::select), switching the clause to `select distinct`.
    pub fn select_distinct<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: IntoColumn,
    {
        let items = self.select_items(columns);
        self.add_piece("select distinct", Some(Data::List(items)), None)
    }

    /// `select <value> as alias`.
    pub fn select_as(&mut self, value: impl IntoColumn, alias: &str) -> &mut Self {
        let value = value.into_column();
        let rendered = self.resolve_operand(&value);
        let item = format!("{rendered} as {}", self.escape_alias(alias));
        self.add_piece("select", Some(Data::List(vec![item])), None)
    }

    /// Raw select-list item, emitted verbatim.
    pub fn select_raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.add_piece("select", Some(Data::List(vec![sql.into()])), None)
    }

    fn select_items<I, C>(&mut self, columns: I) -> Vec<String>
    where
        I: IntoIterator<Item = C>,
        C: IntoColumn,
    {
        let items: Vec<String> = columns
            .into_iter()
            .map(|c| {
                let value = c.into_column();
                self.resolve_operand(&value)
            })
            .collect();
        if items.is_empty() {
            vec!["*".to_string()]
        } else {
            items
        }
    }

    // ==================== FROM ====================

    /// `from table`; a second call replaces the source.
    pub fn from(&mut self, table: &str) -> &mut Self {
        let target = self.escape(table);
        self.set_single("from", target)
    }

    pub fn from_as(&mut self, table: &str, alias: &str) -> &mut Self {
        let target = format!("{} as {}", self.escape(table), self.escape_alias(alias));
        self.set_single("from", target)
    }

    /// `from (sub-query) as alias`.
    pub fn from_query(&mut self, query: Query, alias: &str) -> &mut Self {
        let sql = self.embed_query(&query);
        let target = format!("({sql}) as {}", self.escape_alias(alias));
        self.set_single("from", target)
    }

    /// Set the data of a single-instance clause, adding it if absent.
    fn set_single(&mut self, clause: &str, data: String) -> &mut Self {
        match self.clause_index(clause) {
            Some(idx) => self.pieces[idx].data = Some(Data::Single(data)),
            None => {
                self.add_piece(clause, Some(Data::Single(data)), None);
            }
        }
        self
    }

    // ==================== JOIN ====================

    /// Add a join and configure its `on` predicates in `f`.
    ///
    /// Joining a target (table plus alias) that is already joined is a
    /// no-op, and `f` is not called in that case. The join is spliced in front
    /// of any `where`/`group by`/`order by`/... piece already present.
    pub fn join_with<F>(&mut self, kind: JoinKind, table: &str, alias: Option<&str>, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        let target = match alias {
            Some(alias) => format!("{} as {}", self.escape(table), self.escape_alias(alias)),
            None => self.escape(table),
        };
        let duplicate = self.pieces.iter().any(|p| {
            p.clause.ends_with("join") && p.data.as_ref() == Some(&Data::Single(target.clone()))
        });
        if duplicate {
            return self;
        }

        let saved_splice = self.splice_at;
        let saved_clause = self.current_clause.clone();
        let position = self
            .pieces
            .iter()
            .position(|p| AFTER_JOINS.contains(&p.clause.as_str()));
        let len_before = self.pieces.len();
        if position.is_some() {
            self.splice_at = position;
        }

        self.insert_piece(Piece::new(kind.keyword(), Some(Data::Single(target)), None));
        self.on_defined = false;
        f(self);
        self.on_defined = false;

        let inserted = self.pieces.len() - len_before;
        self.splice_at = match (saved_splice, position) {
            (Some(at), Some(pos)) if at >= pos => Some(at + inserted),
            (saved, _) => saved,
        };
        if position.is_some() {
            self.current_clause = saved_clause;
        }
        self
    }

    pub fn join<F>(&mut self, table: &str, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.join_with(JoinKind::Inner, table, None, f)
    }

    pub fn left_join<F>(&mut self, table: &str, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.join_with(JoinKind::Left, table, None, f)
    }

    pub fn right_join<F>(&mut self, table: &str, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.join_with(JoinKind::Right, table, None, f)
    }

    pub fn full_join<F>(&mut self, table: &str, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.join_with(JoinKind::Full, table, None, f)
    }

    pub fn cross_join(&mut self, table: &str) -> &mut Self {
        self.join_with(JoinKind::Cross, table, None, |_| {})
    }

    // ==================== GROUP / ORDER ====================

    /// `group by a, b`; later calls extend the list.
    pub fn group_by<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: IntoColumn,
    {
        for column in columns {
            let value = column.into_column();
            let term = self.resolve_operand(&value);
            self.add_list_term("group by", term);
        }
        self
    }

    /// `order by a, b` (ascending); later calls extend the list.
    pub fn order_by<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: IntoColumn,
    {
        for column in columns {
            let value = column.into_column();
            let term = self.resolve_operand(&value);
            self.add_list_term("order by", term);
        }
        self
    }

    pub fn order_by_asc(&mut self, column: impl IntoColumn) -> &mut Self {
        self.order_term(column.into_column(), "asc")
    }

    pub fn order_by_desc(&mut self, column: impl IntoColumn) -> &mut Self {
        self.order_term(column.into_column(), "desc")
    }

    pub fn order_by_raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.add_list_term("order by", sql.into());
        self
    }

    fn order_term(&mut self, column: Value, direction: &str) -> &mut Self {
        let term = self.resolve_operand(&column);
        self.add_list_term("order by", format!("{term} {direction}"));
        self
    }

    /// First term under `clause`, later terms as `,` continuation pieces.
    fn add_list_term(&mut self, clause: &str, term: String) {
        let clause = if self.is_clause_defined(clause) {
            ","
        } else {
            clause
        };
        self.add_piece(clause, Some(Data::Single(term)), None);
    }

    // ==================== LIMIT / OFFSET ====================

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.set_single("limit", limit.to_string())
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.set_single("offset", offset.to_string())
    }

    // ==================== Compound ====================

    /// `union <query>`.
    pub fn union(&mut self, query: Query) -> &mut Self {
        self.insert_piece(Piece::token("union"));
        self.merge(query)
    }

    /// `union all <query>`.
    pub fn union_all(&mut self, query: Query) -> &mut Self {
        self.insert_piece(Piece::token("union all"));
        self.merge(query)
    }

    /// Prepend a common table expression `with name as (query)`.
    pub fn with(&mut self, name: &str, query: Query) -> &mut Self {
        self.add_cte("with", name, query)
    }

    /// Prepend a recursive common table expression.
    pub fn with_recursive(&mut self, name: &str, query: Query) -> &mut Self {
        self.add_cte("with recursive", name, query)
    }

    fn add_cte(&mut self, keyword: &str, name: &str, query: Query) -> &mut Self {
        let sql = self.embed_query(&query);
        let data = Data::Single(format!("{} as ({sql})", self.escape_alias(name)));
        let existing = self
            .pieces
            .iter()
            .position(|p| p.clause == "with" || p.clause == "with recursive");
        match existing {
            Some(start) => {
                let mut at = start + 1;
                while at < self.pieces.len() && self.pieces[at].clause == "," {
                    at += 1;
                }
                if keyword == "with recursive" {
                    self.pieces[start].clause = keyword.to_string();
                }
                self.pieces.insert(at, Piece::new(",", Some(data), None));
                self.shift_splice(at);
            }
            None => {
                self.pieces.insert(0, Piece::new(keyword, Some(data), None));
                self.shift_splice(0);
            }
        }
        self
    }

    fn shift_splice(&mut self, inserted_at: usize) {
        if let Some(at) = self.splice_at.as_mut().filter(|at| **at >= inserted_at) {
            *at += 1;
        }
    }

    /// `for update` row locking; recorded as unsupported on engines without it.
    pub fn for_update(&mut self) -> &mut Self {
        if self.require(Feature::LockForUpdate) {
            self.insert_piece(Piece::token("for update"));
        }
        self
    }
}
