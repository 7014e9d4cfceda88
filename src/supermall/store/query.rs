//! Field-level record filters.
//!
//! A [`Filter`] is an ordered list of `(field, Predicate)` pairs evaluated against the
//! persisted (camelCase) form of a record. A record matches when every predicate
//! matches. An empty filter matches everything.
//!
//! - [`Predicate::Equals`] compares the field for exact equality. Numbers compare by
//!   value (`1` equals `1.0`); a field the record does not have never equals anything.
//! - [`Predicate::Custom`] runs a closure on the field. A missing field is passed as
//!   `Value::Null`.

use serde_json::{Map, Value};
use std::fmt;

pub enum Predicate {
    Equals(Value),
    Custom(Box<dyn Fn(&Value) -> bool>),
}

impl Predicate {
    pub fn equals(value: impl Into<Value>) -> Self {
        Predicate::Equals(value.into())
    }

    pub fn custom(f: impl Fn(&Value) -> bool + 'static) -> Self {
        Predicate::Custom(Box::new(f))
    }

    pub fn matches(&self, field: Option<&Value>) -> bool {
        match (self, field) {
            (Predicate::Equals(_), None) => false,
            (Predicate::Equals(expected), Some(actual)) => strict_eq(expected, actual),
            (Predicate::Custom(f), field) => f(field.unwrap_or(&Value::Null)),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Equals(v) => f.debug_tuple("Equals").field(v).finish(),
            Predicate::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

#[derive(Debug, Default)]
pub struct Filter {
    clauses: Vec<(String, Predicate)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`.
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((field.to_string(), Predicate::equals(value)));
        self
    }

    /// Require `f(field)` to hold.
    pub fn matching(mut self, field: &str, f: impl Fn(&Value) -> bool + 'static) -> Self {
        self.clauses.push((field.to_string(), Predicate::custom(f)));
        self
    }

    pub fn with(mut self, field: &str, predicate: Predicate) -> Self {
        self.clauses.push((field.to_string(), predicate));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.clauses.iter().map(|(field, _)| field.as_str())
    }

    pub fn matches(&self, record: &Map<String, Value>) -> bool {
        self.clauses
            .iter()
            .all(|(field, predicate)| predicate.matches(record.get(field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&record(json!({"a": 1}))));
        assert!(Filter::new().matches(&Map::new()));
    }

    #[test]
    fn equals_is_exact() {
        let r = record(json!({"shopId": "shops_1", "isActive": true}));
        assert!(Filter::new().eq("shopId", "shops_1").matches(&r));
        assert!(!Filter::new().eq("shopId", "shops_10").matches(&r));
        assert!(!Filter::new().eq("isActive", "true").matches(&r));
    }

    #[test]
    fn numbers_compare_by_value() {
        let r = record(json!({"discount": 10}));
        assert!(Filter::new().eq("discount", 10.0).matches(&r));
    }

    #[test]
    fn missing_field_never_equals() {
        let r = record(json!({"name": "x"}));
        assert!(!Filter::new().eq("floor", Value::Null).matches(&r));
    }

    #[test]
    fn custom_receives_null_for_missing_field() {
        let r = record(json!({"name": "x"}));
        assert!(Filter::new().matching("floor", Value::is_null).matches(&r));
    }

    #[test]
    fn all_clauses_must_hold() {
        let r = record(json!({"shopId": "shops_1", "discount": 40}));
        let filter = Filter::new()
            .eq("shopId", "shops_1")
            .matching("discount", |v| v.as_f64().is_some_and(|d| d >= 50.0));
        assert!(!filter.matches(&r));
    }
}
