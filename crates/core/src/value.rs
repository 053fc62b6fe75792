//! Runtime values independent of any schema.
//!
//! All numeric values use `rust_decimal::Decimal` -- never `f64`.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ContractError;

// ──────────────────────────────────────────────
// Values
// ──────────────────────────────────────────────

/// A parsed runtime datum: scalar, JSON object/array or XML node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Null,
    Boolean(bool),
    Number(Decimal),
    String(String),
    Object(BTreeMap<String, Value>),
    Array(Vec<Value>),
    Xml(XmlNode),
}

/// An XML element. Text content is held as `Value::String` children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct XmlNode {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Value>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        XmlNode {
            name: name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Value) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Value::String(text.into()))
    }

    /// Concatenated text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Value::String(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn number(n: i64) -> Self {
        Value::Number(Decimal::from(n))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Type name used in mismatch messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "json object",
            Value::Array(_) => "json array",
            Value::Xml(_) => "xml node",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Representation used when the value is embedded in a string context
    /// (query parameters, CSV cells, string-encoded sub-values).
    pub fn to_string_literal(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Convert from serde_json. Numbers go through their textual form so
    /// that no precision passes through f64.
    pub fn from_json(json: &serde_json::Value) -> Result<Value, ContractError> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => Value::Number(parse_decimal(&n.to_string())?),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(Value::from_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            serde_json::Value::Object(map) => {
                let mut obj = BTreeMap::new();
                for (k, v) in map {
                    obj.insert(k.clone(), Value::from_json(v)?);
                }
                Value::Object(obj)
            }
        })
    }

    /// Convert to serde_json. XML nodes become `{"name", "attributes", "children"}`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Number(d) => decimal_to_json(d),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Xml(node) => serde_json::json!({
                "name": node.name,
                "attributes": node.attributes,
                "children": node.children.iter().map(Value::to_json).collect::<Vec<_>>(),
            }),
        }
    }
}

/// Parse a decimal in plain or scientific notation.
pub fn parse_decimal(text: &str) -> Result<Decimal, ContractError> {
    let trimmed = text.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| ContractError::parse(text, "number", e.to_string()))
}

fn decimal_to_json(d: &Decimal) -> serde_json::Value {
    let normalized = d.normalize();
    serde_json::from_str::<serde_json::Value>(&normalized.to_string())
        .unwrap_or_else(|_| serde_json::Value::String(normalized.to_string()))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(d) => write!(f, "{}", d.normalize()),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Array(_) | Value::Object(_) => write!(f, "{}", self.to_json()),
            Value::Xml(node) => {
                write!(f, "<{}", node.name)?;
                for (k, v) in &node.attributes {
                    write!(f, " {}=\"{}\"", k, v)?;
                }
                if node.children.is_empty() {
                    return write!(f, "/>");
                }
                write!(f, ">")?;
                for child in &node.children {
                    match child {
                        Value::String(s) => write!(f, "{}", s)?,
                        other => write!(f, "{}", other)?,
                    }
                }
                write!(f, "</{}>", node.name)
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::number(n)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_numbers_keep_precision() {
        let json: serde_json::Value = serde_json::from_str("{\"price\": 10.10}").unwrap();
        let value = Value::from_json(&json).unwrap();
        match value {
            Value::Object(map) => {
                assert_eq!(map["price"], Value::Number(Decimal::from_str("10.10").unwrap()));
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn scientific_notation_parses() {
        assert_eq!(parse_decimal("1e3").unwrap(), Decimal::from(1000));
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::string("abc").to_string(), "\"abc\"");
        assert_eq!(Value::number(10).to_string(), "10");
        assert_eq!(Value::Null.to_string(), "null");
        let node = XmlNode::new("id").with_attribute("kind", "x").with_text("10");
        assert_eq!(Value::Xml(node).to_string(), "<id kind=\"x\">10</id>");
    }

    #[test]
    fn string_literal_is_unquoted() {
        assert_eq!(Value::string("abc").to_string_literal(), "abc");
        assert_eq!(Value::number(7).to_string_literal(), "7");
    }

    #[test]
    fn round_trips_through_json() {
        let value = Value::object([
            ("id", Value::number(1)),
            ("tags", Value::Array(vec![Value::string("a"), Value::Null])),
        ]);
        assert_eq!(Value::from_json(&value.to_json()).unwrap(), value);
    }
}
