//! Named parameter storage.
//!
//! Each [`ParamList`] owns a namespace taken from a process-wide counter, so
//! names generated by independently built queries never collide once their
//! pieces are merged into one statement.

use crate::value::Scalar;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NAMESPACE: AtomicU64 = AtomicU64::new(1);

fn next_namespace() -> u64 {
    NEXT_NAMESPACE.fetch_add(1, Ordering::Relaxed)
}

/// A named bound value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub value: Scalar,
}

impl Param {
    /// The placeholder that references this parameter in SQL text.
    pub fn placeholder(&self) -> String {
        format!(":{}", self.name)
    }
}

/// Ordered parameter table with a private name namespace.
#[derive(Debug, PartialEq)]
pub struct ParamList {
    namespace: u64,
    next_index: usize,
    params: Vec<Param>,
}

impl Default for ParamList {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamList {
    /// Create an empty list with a fresh namespace.
    pub fn new() -> Self {
        Self {
            namespace: next_namespace(),
            next_index: 0,
            params: Vec::new(),
        }
    }

    /// Register `value` and return its placeholder (`:p{namespace}_{index}`).
    pub fn push(&mut self, value: Scalar) -> String {
        let name = format!("p{}_{}", self.namespace, self.next_index);
        self.next_index += 1;
        let placeholder = format!(":{name}");
        self.params.push(Param { name, value });
        placeholder
    }

    /// Append parameters registered by another list, keeping their names.
    ///
    /// Names already present are skipped, so embedding the same sub-query
    /// twice binds its values once.
    pub fn extend(&mut self, other: &ParamList) {
        for param in &other.params {
            if !self.params.iter().any(|p| p.name == param.name) {
                self.params.push(param.clone());
            }
        }
    }

    /// Copy the parameters under a fresh namespace for further additions.
    pub fn fork(&self) -> Self {
        Self {
            namespace: next_namespace(),
            next_index: 0,
            params: self.params.clone(),
        }
    }

    pub fn namespace(&self) -> u64 {
        self.namespace
    }

    pub fn as_slice(&self) -> &[Param] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    pub fn into_vec(self) -> Vec<Param> {
        self.params
    }
}
