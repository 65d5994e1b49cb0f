//! # piecesql
//!
//! A query builder that compiles chained calls into parameterized SQL.
//!
//! ## Features
//!
//! - **Piece IR**: every builder call appends `(clause, data, separator)` pieces;
//!   rendering is a pure walk over them
//! - **Dialect aware**: identifier escaping and capabilities come from a [`Grammar`]
//! - **Prepared or inline**: values become named parameters (`:p3_0`) or are
//!   quoted inline through the [`Connection`]
//! - **Composable expressions**: [`Expr`] nodes and [`functions`] nest freely,
//!   sub-queries included
//! - **Derived queries**: counts, `explain` and pagination are derived from an
//!   existing builder without touching it
//!
//! ## Example
//!
//! ```ignore
//! use piecesql::{LiteralConnection, Query, Expr};
//!
//! let conn = LiteralConnection::mysql().into_shared();
//! let mut q = Query::new(conn);
//! q.select(["id", "name"])
//!     .from("users")
//!     .where_("status", "active")
//!     .where_("age", Expr::between(18, 30))
//!     .order_by_desc("created_at")
//!     .limit(10);
//!
//! let statement = q.build()?;
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod exec;
pub mod expr;
pub mod grammar;
pub mod param;
pub mod piece;
pub mod query;
pub mod statement;
pub mod value;

mod pg_types;

pub use config::QueryConfig;
pub use connection::{Connection, LiteralConnection};
pub use error::{PrimaryKeyArity, QueryError, QueryResult};
pub use exec::Executor;
pub use expr::{Expr, GroupConcat, MatchAgainst, functions};
pub use grammar::{Dialect, Feature, Grammar, MySqlGrammar, PostgresGrammar, SqliteGrammar};
pub use param::{Param, ParamList};
pub use piece::{Data, Piece};
pub use query::{JoinKind, ModelMeta, Operands, Page, Query, Relation};
pub use statement::{DebugQuery, Statement, StatementKind};
pub use value::{
    BackedEnum, BackedValue, CustomExpression, IntoColumn, Scalar, Value, col, raw,
};

#[cfg(feature = "derive")]
pub use piecesql_derive::BackedEnum;
