//! The query IR: an ordered list of `(clause, data, separator)` pieces.

use serde::Serialize;

/// Payload of a piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Data {
    Single(String),
    /// Fragments joined by the piece separator at render time.
    List(Vec<String>),
}

impl Data {
    pub fn is_empty(&self) -> bool {
        match self {
            Data::Single(s) => s.is_empty(),
            Data::List(items) => items.iter().all(String::is_empty),
        }
    }
}

impl From<String> for Data {
    fn from(value: String) -> Self {
        Data::Single(value)
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Data::Single(value.to_string())
    }
}

impl From<Vec<String>> for Data {
    fn from(value: Vec<String>) -> Self {
        Data::List(value)
    }
}

/// One ordered unit of the query IR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Piece {
    /// Keyword token (`select`, `where`, `and`, `)`, `,`) or empty for a continuation.
    pub clause: String,
    pub data: Option<Data>,
    /// Separator for list data; the grammar's column separator when `None`.
    pub separator: Option<String>,
}

impl Piece {
    pub fn new(clause: impl Into<String>, data: Option<Data>, separator: Option<String>) -> Self {
        Self {
            clause: clause.into(),
            data,
            separator,
        }
    }

    /// A bare keyword/token piece with no data.
    pub fn token(clause: impl Into<String>) -> Self {
        Self::new(clause, None, None)
    }

    /// Empty or `,` clause: renders as part of the preceding clause.
    pub fn is_continuation(&self) -> bool {
        self.clause.is_empty() || self.clause == ","
    }

    fn data_text(&self, default_separator: &str) -> Option<String> {
        match self.data.as_ref()? {
            Data::Single(s) => Some(s.clone()),
            Data::List(items) => {
                let sep = self.separator.as_deref().unwrap_or(default_separator);
                Some(
                    items
                        .iter()
                        .filter(|s| !s.is_empty())
                        .map(String::as_str)
                        .collect::<Vec<_>>()
                        .join(sep),
                )
            }
        }
    }
}

/// Render pieces into SQL text.
///
/// Tokens are joined with single spaces; empty tokens are skipped, `,`
/// attaches to the previous token and `(`/`)` hug their contents. Only a
/// token that is exactly `(` suppresses the following space, so data that
/// merely ends in `(` (a quoted literal, say) keeps its spacing.
pub fn render(pieces: &[Piece], default_separator: &str) -> String {
    let mut out = String::new();
    let mut after_open = false;
    for piece in pieces {
        push_token(&mut out, &piece.clause, &mut after_open);
        if let Some(data) = piece.data_text(default_separator) {
            push_token(&mut out, &data, &mut after_open);
        }
    }
    out
}

fn push_token(out: &mut String, token: &str, after_open: &mut bool) {
    if token.is_empty() {
        return;
    }
    let hug_previous = token == "," || token.starts_with(')');
    if !out.is_empty() && !hug_previous && !*after_open {
        out.push(' ');
    }
    out.push_str(token);
    *after_open = token == "(";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_tokens_with_spaces_and_lists_with_separator() {
        let pieces = vec![
            Piece::new(
                "select",
                Some(Data::List(vec!["a".into(), "b".into()])),
                None,
            ),
            Piece::new("from", Some("t".into()), None),
        ];
        assert_eq!(render(&pieces, ", "), "select a, b from t");
    }

    #[test]
    fn commas_and_parentheses_hug() {
        let pieces = vec![
            Piece::new("order by", Some("a".into()), None),
            Piece::new(",", Some("b".into()), None),
            Piece::new("where", Some("(".into()), None),
            Piece::new("", Some("x = 1".into()), None),
            Piece::token(")"),
        ];
        assert_eq!(render(&pieces, ", "), "order by a, b where (x = 1)");
    }

    #[test]
    fn data_ending_in_parenthesis_keeps_spacing() {
        let pieces = vec![
            Piece::new("where", Some("a = 'x('".into()), None),
            Piece::new("and", Some("b = 1".into()), None),
            Piece::token("("),
            Piece::new("", Some("c = 2".into()), None),
            Piece::token(")"),
        ];
        assert_eq!(render(&pieces, ", "), "where a = 'x(' and b = 1 (c = 2)");
    }

    #[test]
    fn skips_empty_tokens() {
        let pieces = vec![
            Piece::new("", Some("".into()), None),
            Piece::new("select", Some(Data::List(vec!["".into(), "x".into()])), None),
        ];
        assert_eq!(render(&pieces, ", "), "select x");
    }

    #[test]
    fn custom_separator() {
        let pieces = vec![Piece::new(
            "values",
            Some(Data::List(vec!["(1)".into(), "(2)".into()])),
            Some(",\n".into()),
        )];
        assert_eq!(render(&pieces, ", "), "values (1),\n(2)");
    }

    #[test]
    fn continuation_detection() {
        assert!(Piece::token("").is_continuation());
        assert!(Piece::token(",").is_continuation());
        assert!(!Piece::token("and").is_continuation());
    }
}
