//! Contract documents: named types, a root shape, example rows and facts,
//! as JSON.
//!
//! ```json
//! {
//!   "types": { "Address": { "street": "(string)", "zip?": "(number)" } },
//!   "root": { "id": "(number)", "address": "(Address?)" },
//!   "examples": [ { "id": 10 } ],
//!   "facts": { "id": 42 }
//! }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::dsl::{pattern_from_json, with_pattern_delimiters};
use crate::error::ContractError;
use crate::pattern::Pattern;
use crate::resolver::Resolver;
use crate::row::Row;
use crate::value::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct ContractDocument {
    #[serde(default)]
    pub types: BTreeMap<String, serde_json::Value>,
    pub root: serde_json::Value,
    #[serde(default)]
    pub examples: Vec<serde_json::Value>,
    #[serde(default)]
    pub facts: BTreeMap<String, serde_json::Value>,
}

impl ContractDocument {
    pub fn from_json_str(text: &str) -> Result<Self, ContractError> {
        serde_json::from_str(text).map_err(|e| ContractError::Document(e.to_string()))
    }

    /// Build the root pattern and a resolver with every named type
    /// registered. Fails when any reference names an undeclared type.
    pub fn load(&self) -> Result<(Pattern, Resolver), ContractError> {
        let mut resolver = Resolver::new();
        let mut all: Vec<Pattern> = Vec::new();
        for (name, shape) in &self.types {
            let alias = with_pattern_delimiters(name);
            let pattern = match pattern_from_json(shape)? {
                Pattern::Object(object) => Pattern::Object(object.with_alias(alias.clone())),
                other => other,
            };
            tracing::debug!(name = %alias, type_name = %pattern.type_name(), "registered type");
            all.push(pattern.clone());
            resolver.register(&alias, pattern);
        }
        let root = pattern_from_json(&self.root)?;
        all.push(root.clone());

        for pattern in &all {
            for reference in pattern.references() {
                resolver.get_pattern(&reference)?;
            }
        }

        let mut facts = BTreeMap::new();
        for (name, json) in &self.facts {
            facts.insert(name.clone(), Value::from_json(json)?);
        }
        Ok((root, resolver.with_facts(facts)))
    }

    /// One row per example, named by position.
    pub fn rows(&self) -> Result<Vec<Row>, ContractError> {
        self.examples
            .iter()
            .enumerate()
            .map(|(i, json)| {
                Ok(Row::from_json_example(Value::from_json(json)?).named(format!("example {}", i + 1)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "types": {
            "Address": { "street": "(string)", "zip?": "(number)" }
        },
        "root": { "id": "(number)", "address": "(Address?)" },
        "examples": [ { "id": 10, "address": { "street": "Baker" } } ],
        "facts": { "id": 42 }
    }"#;

    #[test]
    fn loads_types_root_and_facts() {
        let document = ContractDocument::from_json_str(DOCUMENT).unwrap();
        let (root, resolver) = document.load().unwrap();
        assert_eq!(root.type_name(), "json object");
        assert_eq!(resolver.get_pattern("Address").unwrap().type_name(), "Address");
        assert_eq!(resolver.fact("id"), Some(&Value::number(42)));

        let value = Value::object([
            ("id", Value::number(1)),
            ("address", Value::object([("street", Value::string("Baker"))])),
        ]);
        assert!(root.matches(&value, &resolver).is_success());
    }

    #[test]
    fn examples_become_rows() {
        let document = ContractDocument::from_json_str(DOCUMENT).unwrap();
        let rows = document.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_field("id").unwrap(), "10");
        assert_eq!(rows[0].step_down("address").get_field("street").unwrap(), "Baker");
    }

    #[test]
    fn undeclared_references_are_rejected() {
        let document = ContractDocument::from_json_str(r#"{"root": {"a": "(Ghost)"}}"#).unwrap();
        assert!(matches!(
            document.load(),
            Err(ContractError::UnknownPattern { .. })
        ));
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(matches!(
            ContractDocument::from_json_str("{}"),
            Err(ContractError::Document(_))
        ));
    }
}
