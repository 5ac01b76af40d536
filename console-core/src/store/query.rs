//! Document queries
//!
//! Filters address fields by dotted path (`customer.name`). Values compare
//! numerically, lexically, or as instants when both sides normalize to a
//! timestamp. Incomparable values never satisfy an ordering filter.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::timestamp;

use super::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    /// Field value is one of the given array
    In,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Array field contains the value, or string field contains the substring
    Contains,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Shorthand for an `Eq` filter
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Filter, sort and truncate a collection snapshot
    pub fn apply(&self, docs: Vec<Document>) -> Vec<Document> {
        let mut out: Vec<Document> = docs.into_iter().filter(|d| self.matches(d)).collect();
        if let Some((field, direction)) = &self.order_by {
            out.sort_by(|a, b| {
                let ord = match (a.field(field), b.field(field)) {
                    (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
                    // Missing values sort last in either direction
                    (Some(_), None) => return Ordering::Less,
                    (None, Some(_)) => return Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                match direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }
        if let Some(n) = self.limit {
            out.truncate(n);
        }
        out
    }
}

impl Filter {
    pub fn matches(&self, doc: &Document) -> bool {
        let field = doc.field(&self.field);
        match self.op {
            FilterOp::Eq => field.is_some_and(|v| loose_eq(v, &self.value)),
            FilterOp::Ne => !field.is_some_and(|v| loose_eq(v, &self.value)),
            FilterOp::In => match (&self.value, field) {
                (Value::Array(options), Some(v)) => options.iter().any(|o| loose_eq(v, o)),
                _ => false,
            },
            FilterOp::Gt => ordered(field, &self.value, |o| o == Ordering::Greater),
            FilterOp::Gte => ordered(field, &self.value, |o| o != Ordering::Less),
            FilterOp::Lt => ordered(field, &self.value, |o| o == Ordering::Less),
            FilterOp::Lte => ordered(field, &self.value, |o| o != Ordering::Greater),
            FilterOp::Contains => match field {
                Some(Value::Array(items)) => items.iter().any(|i| loose_eq(i, &self.value)),
                Some(Value::String(s)) => self.value.as_str().is_some_and(|needle| s.contains(needle)),
                _ => false,
            },
        }
    }
}

fn ordered(field: Option<&Value>, target: &Value, pred: impl Fn(Ordering) -> bool) -> bool {
    field.and_then(|v| compare(v, target)).is_some_and(pred)
}

/// Resolve a dotted path inside a JSON value
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.get(segment))
        .filter(|v| !v.is_null())
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Total-ish order over JSON scalars; `None` when the values are incomparable
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => {
            let x = timestamp::normalize(a)?;
            let y = timestamp::normalize(b)?;
            Some(x.cmp(&y))
        }
    }
}
