//! Filters, find options, updates and aggregation descriptors
//!
//! A small subset of document-store query semantics, evaluated in-process by
//! every backend so they agree on matching and ordering.

use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

use super::{Document, ID_FIELD};

// ============================================================================
// Filter
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    In(String, Vec<Value>),
    Gte(String, Value),
    Lt(String, Value),
}

/// Conjunction of field conditions; an empty filter matches everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new().eq(ID_FIELD, id.into())
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(field.into(), value.into()));
        self
    }

    pub fn one_of<V: Into<Value>>(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.conditions.push(Condition::In(field.into(), values));
        self
    }

    pub fn gte(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Gte(field.into(), value.into()));
        self
    }

    pub fn lt(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Lt(field.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Eq(field, expected) => {
                lookup(doc, field).is_some_and(|actual| values_equal(actual, expected))
            }
            Condition::In(field, candidates) => lookup(doc, field)
                .is_some_and(|actual| candidates.iter().any(|c| values_equal(actual, c))),
            Condition::Gte(field, bound) => lookup(doc, field)
                .and_then(|actual| compare_values(actual, bound))
                .is_some_and(|ord| ord != Ordering::Less),
            Condition::Lt(field, bound) => lookup(doc, field)
                .and_then(|actual| compare_values(actual, bound))
                .is_some_and(|ord| ord == Ordering::Less),
        })
    }
}

/// Resolve a dotted path (`customer.name`) inside a document
pub fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Numbers numerically, RFC 3339 timestamps chronologically, other strings lexically
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(tx), Some(ty)) => Some(tx.cmp(&ty)),
            _ => Some(x.cmp(y)),
        },
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

// ============================================================================
// Find options
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Option<Sort>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort_desc(mut self, field: impl Into<String>) -> Self {
        self.sort = Some(Sort {
            field: field.into(),
            descending: true,
        });
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sort, then skip, then limit
    pub fn apply(&self, mut docs: Vec<Document>) -> Vec<Document> {
        if let Some(sort) = &self.sort {
            docs.sort_by(|a, b| {
                let ord = match (lookup(a, &sort.field), lookup(b, &sort.field)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Greater,
                    (None, Some(_)) => Ordering::Less,
                    (None, None) => Ordering::Equal,
                };
                if sort.descending { ord.reverse() } else { ord }
            });
        }
        let iter = docs.into_iter().skip(self.skip);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

// ============================================================================
// Update
// ============================================================================

/// `$set`-style field assignment applied atomically to one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    set: Document,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Apply to `doc`; returns whether any field changed. `_id` is never rewritten.
    pub fn apply_to(&self, doc: &mut Document) -> bool {
        let mut changed = false;
        for (field, value) in &self.set {
            if field == ID_FIELD {
                continue;
            }
            if doc.get(field) != Some(value) {
                doc.insert(field.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Which fields to sum and which to count by value over the matched documents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub sum: Vec<String>,
    pub count_by: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateOutput {
    pub count: u64,
    pub sums: HashMap<String, f64>,
    pub counts_by: HashMap<String, HashMap<String, u64>>,
}

impl Aggregation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sum(mut self, field: impl Into<String>) -> Self {
        self.sum.push(field.into());
        self
    }

    pub fn count_by(mut self, field: impl Into<String>) -> Self {
        self.count_by.push(field.into());
        self
    }

    pub fn fold<'a>(&self, docs: impl IntoIterator<Item = &'a Document>) -> AggregateOutput {
        let mut out = AggregateOutput::default();
        for field in &self.sum {
            out.sums.insert(field.clone(), 0.0);
        }
        for doc in docs {
            out.count += 1;
            for field in &self.sum {
                let value = lookup(doc, field).and_then(Value::as_f64).unwrap_or(0.0);
                *out.sums.entry(field.clone()).or_default() += value;
            }
            for field in &self.count_by {
                let key = match lookup(doc, field) {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => "null".to_string(),
                };
                *out.counts_by
                    .entry(field.clone())
                    .or_default()
                    .entry(key)
                    .or_default() += 1;
            }
        }
        out
    }
}
