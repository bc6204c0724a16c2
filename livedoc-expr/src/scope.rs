//! Variable and fixture scopes
//!
//! Variables belong to one document run and are written by assignments. Fixtures are supplied
//! from outside, cloned per document, and only ever read by evaluation.

use crate::error::EvalErrorKind;
use crate::value::{Function, Value};
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Mutable scope written by assignment markers.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: BTreeMap<String, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Variables sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Read-only scope of values and callables supplied to a document.
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    values: BTreeMap<String, Value>,
}

impl Fixtures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_function<F>(mut self, name: &str, call: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, EvalErrorKind> + Send + Sync + 'static,
    {
        self.insert(name, Value::Function(Function::new(name, call)));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Layer `other` on top of `self`; names in `other` win.
    pub fn merged(&self, other: &Fixtures) -> Fixtures {
        let mut values = self.values.clone();
        values.extend(other.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        Fixtures { values }
    }

    /// Load fixtures from a YAML mapping.
    ///
    /// ```yaml
    /// name: Jane Smith
    /// prices: [5, 7.5]
    /// user: { login: jane, admin: false }
    /// ```
    pub fn from_yaml_str(source: &str) -> Result<Self, serde_yaml::Error> {
        let document: serde_yaml::Value = serde_yaml::from_str(source)?;
        let mut fixtures = Fixtures::new();
        if let Value::Map(map) = from_yaml(document) {
            for (name, value) in map {
                fixtures.insert(name, value);
            }
        }
        Ok(fixtures)
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        other => from_yaml(other).to_string(),
    }
}

/// Convert a YAML document into an expression value.
pub fn from_yaml(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::None,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_yaml::Value::String(s) => Value::Str(s),
        serde_yaml::Value::Sequence(items) => Value::List(items.into_iter().map(from_yaml).collect()),
        serde_yaml::Value::Mapping(mapping) => Value::Map(
            mapping
                .into_iter()
                .map(|(k, v)| (yaml_key(k), from_yaml(v)))
                .collect::<IndexMap<_, _>>(),
        ),
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_iterate_sorted() {
        let mut vars = Variables::new();
        vars.set("b", Value::Int(2));
        vars.set("a", Value::Int(1));
        let names: Vec<&str> = vars.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_fixtures_from_yaml() {
        let fixtures = Fixtures::from_yaml_str(
            "name: Jane Smith\nprices: [5, 7.5]\nuser:\n  login: jane\n  admin: false\n",
        )
        .unwrap();
        assert_eq!(fixtures.get("name"), Some(&Value::from("Jane Smith")));
        assert_eq!(
            fixtures.get("prices").map(|v| v.to_string()),
            Some("[5, 7.5]".to_string())
        );
        assert_eq!(
            fixtures.get("user").map(|v| v.to_string()),
            Some("{'login': 'jane', 'admin': False}".to_string())
        );
    }

    #[test]
    fn test_empty_yaml_gives_empty_fixtures() {
        assert!(Fixtures::from_yaml_str("").unwrap().is_empty());
    }

    #[test]
    fn test_merged_prefers_other() {
        let base = Fixtures::new()
            .with_value("a", Value::Int(1))
            .with_value("b", Value::Int(2));
        let local = Fixtures::new().with_value("b", Value::Int(3));
        let merged = base.merged(&local);
        assert_eq!(merged.get("a"), Some(&Value::Int(1)));
        assert_eq!(merged.get("b"), Some(&Value::Int(3)));
        assert_eq!(base.get("b"), Some(&Value::Int(2)));
    }
}
