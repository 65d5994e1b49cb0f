//! Rendered statements and their debug representation.

use crate::param::Param;
use crate::value::Scalar;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Whether values travel as bound parameters or are quoted inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementKind {
    Prepared,
    Raw,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Prepared => "PREPARED",
            StatementKind::Raw => "RAW",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQL text plus its ordered named parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Param>,
    pub kind: StatementKind,
}

impl Statement {
    /// Rewrite `:name` placeholders into Postgres `$n` placeholders.
    ///
    /// Returns the rewritten SQL and the values in positional order. A name
    /// referenced more than once reuses its position. Placeholders inside
    /// quoted literals or identifiers are left alone.
    pub fn postgres_positional(&self) -> (String, Vec<&Scalar>) {
        let lookup: HashMap<&str, &Scalar> = self
            .params
            .iter()
            .map(|p| (p.name.as_str(), &p.value))
            .collect();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut values: Vec<&Scalar> = Vec::new();
        let mut out = String::with_capacity(self.sql.len());

        let sql = self.sql.as_str();
        let bytes = sql.as_bytes();
        let mut quote: Option<u8> = None;
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            match quote {
                Some(q) => {
                    if b == q {
                        quote = None;
                    }
                }
                None => match b {
                    b'\'' | b'"' | b'`' => quote = Some(b),
                    b':' if i == 0 || bytes[i - 1] != b':' => {
                        let end = placeholder_end(bytes, i + 1);
                        if let Some((name, value)) = (end > i + 1)
                            .then(|| &sql[i + 1..end])
                            .and_then(|name| lookup.get(name).map(|v| (name, *v)))
                        {
                            let position = *positions.entry(name).or_insert_with(|| {
                                values.push(value);
                                values.len()
                            });
                            out.push_str(&format!("${position}"));
                            i = end;
                            continue;
                        }
                    }
                    _ => {}
                },
            }
            // Copy the current (possibly multi-byte) character.
            let ch_len = utf8_len(b);
            out.push_str(&sql[i..i + ch_len]);
            i += ch_len;
        }
        (out, values)
    }

    /// Debug representation `{sql, type, params}`.
    pub fn debug(&self) -> DebugQuery {
        DebugQuery {
            sql: self.sql.clone(),
            kind: self.kind,
            params: self
                .params
                .iter()
                .map(|p| (p.name.clone(), p.value.clone()))
                .collect(),
        }
    }
}

fn placeholder_end(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
        end += 1;
    }
    end
}

fn utf8_len(first: u8) -> usize {
    match first {
        b if b < 0x80 => 1,
        b if b >> 5 == 0b110 => 2,
        b if b >> 4 == 0b1110 => 3,
        _ => 4,
    }
}

/// Serializable view of a statement for logs and debugging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugQuery {
    pub sql: String,
    #[serde(rename = "type")]
    pub kind: StatementKind,
    pub params: Vec<(String, Scalar)>,
}

impl DebugQuery {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for DebugQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.sql)?;
        if !self.params.is_empty() {
            f.write_str(" -- ")?;
            for (i, (name, value)) in self.params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{name}={value:?}")?;
            }
        }
        Ok(())
    }
}
