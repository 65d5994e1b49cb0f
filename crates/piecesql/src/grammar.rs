//! Per-engine grammar: identifier escaping, separators and capabilities.
//!
//! A [`Grammar`] is consumed by the query builder whenever a name is turned
//! into SQL text. It never sees values; literal quoting lives on the
//! [`Connection`](crate::Connection), which asks the grammar for the
//! engine-specific escaping rules.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Constructs whose rendering is engine specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// `match (...) against (...)` full-text predicates.
    MatchAgainst,
    /// `@name := (...)` session variable assignment.
    Variables,
    /// `group_concat(...)` aggregate.
    GroupConcat,
    /// `if(...)` / `ifnull(...)` control-flow functions.
    IfFunctions,
    /// `returning ...` on mutations.
    Returning,
    /// `on duplicate key update ...`.
    OnDuplicateKey,
    /// `on conflict (...) do update set ...`.
    OnConflict,
    /// `replace into ...`.
    ReplaceInto,
    /// `for update` row locking.
    LockForUpdate,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::MatchAgainst => "match against",
            Feature::Variables => "variable assignment",
            Feature::GroupConcat => "group_concat",
            Feature::IfFunctions => "if functions",
            Feature::Returning => "returning",
            Feature::OnDuplicateKey => "on duplicate key update",
            Feature::OnConflict => "on conflict",
            Feature::ReplaceInto => "replace into",
            Feature::LockForUpdate => "for update",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-engine identifier escaping and separator tokens.
pub trait Grammar: Send + Sync + fmt::Debug {
    /// Short engine name used in error messages and logs.
    fn name(&self) -> &'static str;

    /// Opening and closing identifier quote characters.
    fn identifier_quotes(&self) -> (char, char);

    /// Separator used when flattening list data (`a, b, c`).
    fn column_separator(&self) -> &'static str {
        ", "
    }

    /// Separator between qualifier and name (`table.column`).
    fn table_separator(&self) -> &'static str {
        "."
    }

    /// Whether the engine can render `feature`.
    fn supports(&self, feature: Feature) -> bool;

    /// Escape a (possibly qualified, possibly aliased) identifier.
    ///
    /// `users.id` becomes `"users"."id"`, `*` is kept as-is and
    /// `name as alias` escapes both sides. Parts that are already quoted
    /// are re-emitted in canonical form; a name that does not split into
    /// well-formed parts is quoted as one identifier.
    fn escape_identifier(&self, name: &str) -> String {
        let name = name.trim();
        let (open, close) = self.identifier_quotes();
        if let Some((expr, alias)) = split_alias(name, open, close) {
            return format!(
                "{} as {}",
                self.escape_identifier(expr),
                self.escape_part(alias)
            );
        }
        let sep = self.table_separator();
        let Some(segments) = split_qualified(name, sep, open, close) else {
            return quote_with(name, open, close);
        };
        let mut out = String::with_capacity(name.len() + 4);
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            match segment {
                Segment::Plain("*") => out.push('*'),
                Segment::Plain(part) => out.push_str(&quote_with(part, open, close)),
                Segment::Quoted(body) => out.push_str(&quote_with(body, open, close)),
            }
        }
        out
    }

    /// Escape a single identifier segment, doubling embedded closing quotes.
    fn escape_part(&self, part: &str) -> String {
        if part == "*" {
            return part.to_string();
        }
        let (open, close) = self.identifier_quotes();
        match take_quoted(part, open, close) {
            Some((body, "")) => quote_with(&body, open, close),
            _ => quote_with(part, open, close),
        }
    }

    /// Escape the body of a string literal (without surrounding quotes).
    fn escape_string(&self, value: &str) -> String {
        value.replace('\'', "''")
    }

    /// Inline boolean literal.
    fn boolean_literal(&self, value: bool) -> &'static str {
        if value { "1" } else { "0" }
    }

    /// Inline binary literal.
    fn bytes_literal(&self, value: &[u8]) -> String {
        let mut out = String::with_capacity(value.len() * 2 + 3);
        out.push_str("X'");
        for byte in value {
            out.push_str(&format!("{byte:02X}"));
        }
        out.push('\'');
        out
    }
}

/// Split `expr as alias` on the last ` as ` outside quoted text.
fn split_alias(name: &str, open: char, close: char) -> Option<(&str, &str)> {
    let mut quoted = false;
    let mut at = None;
    for (i, ch) in name.char_indices() {
        if ch == open || ch == close {
            quoted = if open == close { !quoted } else { ch == open };
        } else if !quoted
            && name
                .get(i..i + 4)
                .is_some_and(|s| s.eq_ignore_ascii_case(" as "))
        {
            at = Some(i);
        }
    }
    let idx = at?;
    let (expr, alias) = (name[..idx].trim(), name[idx + 4..].trim());
    if expr.is_empty() || alias.is_empty() {
        return None;
    }
    Some((expr, alias))
}

/// One part of a qualified identifier.
#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Plain(&'a str),
    /// Body of a quoted part, with doubled quotes already collapsed.
    Quoted(String),
}

/// Split `schema."Table".column` into parts.
///
/// Separators inside quoted parts are kept. Returns `None` for empty
/// parts, unclosed quotes or text trailing a closing quote.
fn split_qualified<'a>(
    name: &'a str,
    sep: &str,
    open: char,
    close: char,
) -> Option<Vec<Segment<'a>>> {
    let mut segments = Vec::new();
    let mut rest = name;
    loop {
        if rest.starts_with(open) {
            let (body, after) = take_quoted(rest, open, close)?;
            segments.push(Segment::Quoted(body));
            if after.is_empty() {
                return Some(segments);
            }
            rest = after.strip_prefix(sep)?;
            continue;
        }
        let (part, next) = match rest.find(sep) {
            Some(idx) => (&rest[..idx], Some(&rest[idx + sep.len()..])),
            None => (rest, None),
        };
        if part.is_empty() {
            return None;
        }
        segments.push(Segment::Plain(part));
        match next {
            Some(next) => rest = next,
            None => return Some(segments),
        }
    }
}

/// Read one quoted identifier from the start of `s`.
///
/// Returns the unescaped body and the text after the closing quote.
fn take_quoted(s: &str, open: char, close: char) -> Option<(String, &str)> {
    let mut chars = s.char_indices().peekable();
    if chars.next().map(|(_, c)| c) != Some(open) {
        return None;
    }
    let mut body = String::new();
    while let Some((i, c)) = chars.next() {
        if c != close {
            body.push(c);
            continue;
        }
        if chars.peek().map(|(_, next)| *next) == Some(close) {
            chars.next();
            body.push(close);
            continue;
        }
        if body.is_empty() {
            return None;
        }
        return Some((body, &s[i + c.len_utf8()..]));
    }
    None
}

fn quote_with(body: &str, open: char, close: char) -> String {
    let mut out = String::with_capacity(body.len() + 2);
    out.push(open);
    for ch in body.chars() {
        if ch == close {
            out.push(close);
        }
        out.push(ch);
    }
    out.push(close);
    out
}

/// MySQL / MariaDB grammar (backtick identifiers).
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlGrammar;

impl Grammar for MySqlGrammar {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('`', '`')
    }

    fn supports(&self, feature: Feature) -> bool {
        !matches!(feature, Feature::Returning | Feature::OnConflict)
    }

    fn escape_string(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for ch in value.chars() {
            match ch {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                _ => out.push(ch),
            }
        }
        out
    }
}

/// PostgreSQL grammar (double-quoted identifiers).
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresGrammar;

impl Grammar for PostgresGrammar {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('"', '"')
    }

    fn supports(&self, feature: Feature) -> bool {
        matches!(
            feature,
            Feature::Returning | Feature::OnConflict | Feature::LockForUpdate
        )
    }

    fn boolean_literal(&self, value: bool) -> &'static str {
        if value { "true" } else { "false" }
    }

    fn bytes_literal(&self, value: &[u8]) -> String {
        let mut out = String::with_capacity(value.len() * 2 + 12);
        out.push_str("'\\x");
        for byte in value {
            out.push_str(&format!("{byte:02x}"));
        }
        out.push_str("'::bytea");
        out
    }
}

/// SQLite grammar (double-quoted identifiers).
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteGrammar;

impl Grammar for SqliteGrammar {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('"', '"')
    }

    fn supports(&self, feature: Feature) -> bool {
        matches!(
            feature,
            Feature::GroupConcat
                | Feature::Returning
                | Feature::OnConflict
                | Feature::ReplaceInto
        )
    }
}

/// Supported SQL engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    MySql,
    #[default]
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Build the grammar for this dialect.
    pub fn grammar(&self) -> Arc<dyn Grammar> {
        match self {
            Dialect::MySql => Arc::new(MySqlGrammar),
            Dialect::Postgres => Arc::new(PostgresGrammar),
            Dialect::Sqlite => Arc::new(SqliteGrammar),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            other => Err(format!("unknown SQL dialect: {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_simple_and_qualified_names() {
        assert_eq!(MySqlGrammar.escape_identifier("users"), "`users`");
        assert_eq!(MySqlGrammar.escape_identifier("users.id"), "`users`.`id`");
        assert_eq!(PostgresGrammar.escape_identifier("public.users"), r#""public"."users""#);
    }

    #[test]
    fn keeps_star_and_escapes_alias() {
        assert_eq!(MySqlGrammar.escape_identifier("u.*"), "`u`.*");
        assert_eq!(
            PostgresGrammar.escape_identifier("users AS u"),
            r#""users" as "u""#
        );
    }

    #[test]
    fn doubles_embedded_quotes() {
        assert_eq!(MySqlGrammar.escape_identifier("we`ird"), "`we``ird`");
        assert_eq!(SqliteGrammar.escape_identifier(r#"a"b"#), r#""a""b""#);
    }

    #[test]
    fn does_not_double_escape() {
        assert_eq!(MySqlGrammar.escape_identifier("`users`.id"), "`users`.`id`");
        assert_eq!(
            PostgresGrammar.escape_identifier(r#"public."has""quote".id"#),
            r#""public"."has""quote"."id""#
        );
    }

    #[test]
    fn keeps_separators_inside_quoted_parts() {
        assert_eq!(PostgresGrammar.escape_identifier(r#""a.b""#), r#""a.b""#);
        assert_eq!(
            PostgresGrammar.escape_identifier(r#""a.b" as "x y""#),
            r#""a.b" as "x y""#
        );
        assert_eq!(
            PostgresGrammar.escape_identifier(r#""weird as name""#),
            r#""weird as name""#
        );
    }

    #[test]
    fn malformed_quoted_names_are_escaped_whole() {
        assert_eq!(
            MySqlGrammar.escape_identifier("`id` = 1 or `x`"),
            "```id`` = 1 or ``x```"
        );
        assert_eq!(MySqlGrammar.escape_identifier("`open"), "```open`");
        assert_eq!(MySqlGrammar.escape_part("`a` b"), "```a`` b`");
        assert_eq!(PostgresGrammar.escape_identifier("a..b"), r#""a..b""#);
    }

    #[test]
    fn splits_qualified_names() {
        assert_eq!(
            split_qualified(r#"s."T.x".c"#, ".", '"', '"'),
            Some(vec![
                Segment::Plain("s"),
                Segment::Quoted("T.x".to_string()),
                Segment::Plain("c"),
            ])
        );
        assert_eq!(split_qualified(r#""a"b"#, ".", '"', '"'), None);
        assert_eq!(split_qualified("a.", ".", '"', '"'), None);
    }

    #[test]
    fn mysql_escapes_backslashes_in_strings() {
        assert_eq!(MySqlGrammar.escape_string(r"it's \n"), r"it''s \\n");
        assert_eq!(PostgresGrammar.escape_string(r"it's \n"), r"it''s \n");
    }

    #[test]
    fn dialect_parses_aliases() {
        assert_eq!("MariaDB".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert_eq!("pg".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("sqlite3".parse::<Dialect>().unwrap(), Dialect::Sqlite);
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn capabilities_differ_per_engine() {
        assert!(MySqlGrammar.supports(Feature::MatchAgainst));
        assert!(!PostgresGrammar.supports(Feature::MatchAgainst));
        assert!(PostgresGrammar.supports(Feature::Returning));
        assert!(!MySqlGrammar.supports(Feature::Returning));
    }
}
