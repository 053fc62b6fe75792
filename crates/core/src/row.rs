//! Example data used to specialize patterns into concrete test cases.

use std::collections::BTreeMap;

use crate::error::ContractError;
use crate::value::Value;

/// One example: named columns with literal or `$`-reference cells, plus an
/// optional JSON example whose nested objects are reached with `step_down`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub name: String,
    column_names: Vec<String>,
    values: Vec<String>,
    variables: BTreeMap<String, String>,
    references: BTreeMap<String, BTreeMap<String, String>>,
    json_example: Option<Value>,
}

impl Row {
    pub fn new(column_names: Vec<String>, values: Vec<String>) -> Result<Self, ContractError> {
        if column_names.len() != values.len() {
            return Err(ContractError::Row(format!(
                "{} columns but {} values",
                column_names.len(),
                values.len()
            )));
        }
        Ok(Row {
            column_names,
            values,
            ..Row::default()
        })
    }

    /// Convenience for `(column, value)` pairs.
    pub fn from_pairs<K: Into<String>, V: Into<String>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        let (column_names, values) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Row {
            column_names,
            values,
            ..Row::default()
        }
    }

    /// A row backed by a JSON example. Top-level scalar keys become columns;
    /// nested objects stay reachable through `step_down`.
    pub fn from_json_example(example: Value) -> Self {
        let mut row = Row::default();
        if let Value::Object(map) = &example {
            for (k, v) in map {
                if !matches!(v, Value::Object(_) | Value::Array(_)) {
                    row.column_names.push(k.clone());
                    row.values.push(v.to_string_literal());
                }
            }
        }
        row.json_example = Some(example);
        row
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_reference(mut self, name: &str, values: BTreeMap<String, String>) -> Self {
        self.references.insert(name.to_string(), values);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.column_names.is_empty() && self.json_example.is_none()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.column_names.iter().any(|c| c == name)
    }

    /// The cell for `name`, with `$variable` and `$reference.key` resolved.
    pub fn get_field(&self, name: &str) -> Result<String, ContractError> {
        let index = self
            .column_names
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ContractError::Row(format!("no column named {}", name)))?;
        self.resolve_cell(&self.values[index])
    }

    fn resolve_cell(&self, cell: &str) -> Result<String, ContractError> {
        let Some(reference) = cell.strip_prefix('$') else {
            return Ok(cell.to_string());
        };
        if let Some((source, key)) = reference.split_once('.') {
            return self
                .references
                .get(source)
                .and_then(|values| values.get(key))
                .cloned()
                .ok_or_else(|| {
                    ContractError::Row(format!("reference {} has no value for {}", source, key))
                });
        }
        self.variables
            .get(reference)
            .cloned()
            .ok_or_else(|| ContractError::Row(format!("variable {} is not defined", reference)))
    }

    /// The typed JSON example value for a top-level null, boolean or number
    /// column. Text cells stay on the `get_field` path so `$` references
    /// still resolve.
    pub fn typed_field(&self, name: &str) -> Option<&Value> {
        match &self.json_example {
            Some(Value::Object(map)) => map
                .get(name)
                .filter(|v| matches!(v, Value::Null | Value::Boolean(_) | Value::Number(_))),
            _ => None,
        }
    }

    /// Nested example under `key`, if this row came from a JSON example.
    pub fn nested_example(&self, key: &str) -> Option<&Value> {
        match &self.json_example {
            Some(Value::Object(map)) => map
                .get(key)
                .filter(|v| matches!(v, Value::Object(_) | Value::Array(_))),
            _ => None,
        }
    }

    /// Row for the object nested under `key`; empty when there is none.
    pub fn step_down(&self, key: &str) -> Row {
        match self.nested_example(key) {
            Some(nested) => Row::from_json_example(nested.clone())
                .with_variables(self.variables.clone())
                .named(self.name.clone()),
            None => Row::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = Row::new(vec!["a".into(), "b".into()], vec!["1".into()]).unwrap_err();
        assert!(matches!(err, ContractError::Row(_)));
    }

    #[test]
    fn variables_and_references_resolve() {
        let mut vars = BTreeMap::new();
        vars.insert("customer".to_string(), "Jane".to_string());
        let mut refs = BTreeMap::new();
        refs.insert("id".to_string(), "10".to_string());
        let row = Row::from_pairs([("name", "$customer"), ("id", "$auth.id"), ("plain", "x")])
            .with_variables(vars)
            .with_reference("auth", refs);
        assert_eq!(row.get_field("name").unwrap(), "Jane");
        assert_eq!(row.get_field("id").unwrap(), "10");
        assert_eq!(row.get_field("plain").unwrap(), "x");
        assert!(row.get_field("absent").is_err());
    }

    #[test]
    fn json_examples_step_down() {
        let example = Value::object([
            ("id", Value::number(10)),
            (
                "address",
                Value::object([("street", Value::string("Baker"))]),
            ),
        ]);
        let row = Row::from_json_example(example);
        assert!(row.contains_field("id"));
        assert!(!row.contains_field("address"));
        let nested = row.step_down("address");
        assert_eq!(nested.get_field("street").unwrap(), "Baker");
        assert!(row.step_down("id").is_empty());
    }

    #[test]
    fn json_scalars_keep_their_type() {
        let example = Value::object([
            ("nick", Value::Null),
            ("age", Value::number(3)),
            ("name", Value::string("$customer")),
        ]);
        let row = Row::from_json_example(example);
        assert_eq!(row.typed_field("nick"), Some(&Value::Null));
        assert_eq!(row.typed_field("age"), Some(&Value::number(3)));
        assert_eq!(row.typed_field("name"), None);
        assert!(Row::from_pairs([("nick", "")]).typed_field("nick").is_none());
    }
}
