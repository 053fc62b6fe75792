//! The parenthesis DSL used by contract text and example rows.
//!
//! Token grammar, checked outermost-first:
//!
//! ```text
//! (key:type)        row lookup
//! (type in string)  string-encoded sub-pattern
//! (type?)           nullable
//! (type...)         rest of an array
//! (type*)           list
//! (number) ...      built-in scalar keyword
//! (Name)            named (deferred) reference
//! ```
//!
//! JSON text describes structures, with DSL tokens as string leaves and a
//! few single-key combinator objects (`$enum`, `$oneOf`, `$dictionary`,
//! `$csv`, `$string`, `$number`).

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::ContractError;
use crate::pattern::{
    AnyPattern, CsvPattern, DictionaryPattern, EnumPattern, LookupRowPattern, NumberPattern,
    ObjectPattern, Pattern, PatternInString, ScalarPattern, StringPattern,
};
use crate::value::{parse_decimal, Value};

pub const OPTIONAL_SUFFIX: &str = "?";
pub const ELLIPSIS: &str = "...";

// ──────────────────────────────────────────────
// Names and keys
// ──────────────────────────────────────────────

pub fn is_pattern_token(text: &str) -> bool {
    let t = text.trim();
    t.len() >= 2 && t.starts_with('(') && t.ends_with(')')
}

/// `Name` -> `(Name)`; already-delimited names are returned unchanged.
pub fn with_pattern_delimiters(name: &str) -> String {
    let name = name.trim();
    if is_pattern_token(name) {
        name.to_string()
    } else {
        format!("({})", name)
    }
}

/// `(Name)` -> `Name`; other text is returned unchanged.
pub fn without_pattern_delimiters(text: &str) -> &str {
    let t = text.trim();
    if is_pattern_token(t) {
        &t[1..t.len() - 1]
    } else {
        t
    }
}

pub fn is_optional_key(key: &str) -> bool {
    key.ends_with(OPTIONAL_SUFFIX) && key != ELLIPSIS
}

/// `name?` -> `name`.
pub fn without_optionality(key: &str) -> &str {
    if is_optional_key(key) {
        &key[..key.len() - OPTIONAL_SUFFIX.len()]
    } else {
        key
    }
}

// ──────────────────────────────────────────────
// Patterns
// ──────────────────────────────────────────────

/// A pattern from DSL text: a token, a JSON shape, or a literal string.
pub fn parsed_pattern(text: &str) -> Result<Pattern, ContractError> {
    let trimmed = text.trim();
    if is_pattern_token(trimmed) {
        return parse_token(without_pattern_delimiters(trimmed), trimmed);
    }
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        let json: serde_json::Value = serde_json::from_str(trimmed)
            .map_err(|e| ContractError::dsl(trimmed, e.to_string()))?;
        return pattern_from_json(&json);
    }
    Ok(Pattern::exact(Value::string(text)))
}

fn parse_token(inner: &str, original: &str) -> Result<Pattern, ContractError> {
    let inner = inner.trim();
    if inner.is_empty() {
        return Err(ContractError::dsl(original, "empty token"));
    }
    if let Some((key, type_token)) = inner.split_once(':') {
        let key = key.trim();
        if key.is_empty() {
            return Err(ContractError::dsl(original, "row lookup needs a key name"));
        }
        return Ok(Pattern::LookupRow(LookupRowPattern::new(
            key,
            parse_token(type_token, original)?,
        )));
    }
    if let Some(encoded) = inner.strip_suffix(" in string") {
        return Ok(Pattern::InString(PatternInString::new(parse_token(
            encoded, original,
        )?)));
    }
    if let Some(base) = inner.strip_suffix(OPTIONAL_SUFFIX) {
        return Ok(Pattern::nullable(parse_token(base, original)?));
    }
    if let Some(base) = inner.strip_suffix(ELLIPSIS) {
        return Ok(Pattern::rest(parse_token(base, original)?));
    }
    if let Some(base) = inner.strip_suffix('*') {
        return Ok(Pattern::list(parse_token(base, original)?));
    }
    if let Some(builtin) = builtin(inner) {
        return Ok(builtin);
    }
    let is_name = inner
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ' '));
    if !is_name {
        return Err(ContractError::dsl(original, format!("unrecognised type {}", inner)));
    }
    Ok(Pattern::deferred(inner))
}

fn builtin(keyword: &str) -> Option<Pattern> {
    let scalar = match keyword {
        "number" => ScalarPattern::Number(NumberPattern::default()),
        "integer" => ScalarPattern::Number(NumberPattern {
            integer: true,
            ..NumberPattern::default()
        }),
        "string" => ScalarPattern::String(StringPattern::default()),
        "boolean" => ScalarPattern::Boolean,
        "null" => ScalarPattern::Null,
        "date" => ScalarPattern::Date,
        "datetime" => ScalarPattern::DateTime,
        "uuid" => ScalarPattern::Uuid,
        "email" => ScalarPattern::Email,
        "base64" => ScalarPattern::Base64,
        "binary" => ScalarPattern::Binary,
        "empty" => ScalarPattern::EmptyString,
        "anything" | "anyvalue" => return Some(Pattern::Anything),
        _ => return None,
    };
    Some(Pattern::Scalar(scalar))
}

/// Text as a generic value: JSON objects and arrays are parsed, anything
/// else stays a string.
pub fn parsed_value(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
            if let Ok(value) = Value::from_json(&json) {
                return value;
            }
        }
    }
    Value::String(text.to_string())
}

/// A pattern from a JSON shape.
pub fn pattern_from_json(json: &serde_json::Value) -> Result<Pattern, ContractError> {
    match json {
        serde_json::Value::String(s) if is_pattern_token(s) => parsed_pattern(s),
        serde_json::Value::Null => Ok(Pattern::null()),
        serde_json::Value::Array(items) => {
            let elements = items
                .iter()
                .map(pattern_from_json)
                .collect::<Result<Vec<_>, _>>()?;
            match elements.as_slice() {
                [Pattern::List(_)] => Ok(elements.into_iter().next().unwrap_or(Pattern::Anything)),
                _ => Ok(Pattern::array(elements)),
            }
        }
        serde_json::Value::Object(map) => combinator(map).unwrap_or_else(|| {
            let mut pattern = BTreeMap::new();
            for (key, shape) in map {
                pattern.insert(key.clone(), pattern_from_json(shape)?);
            }
            Ok(Pattern::Object(ObjectPattern::new(pattern)))
        }),
        scalar => Ok(Pattern::exact(Value::from_json(scalar)?)),
    }
}

type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Special single-key objects; `None` when `map` is a plain object shape.
fn combinator(map: &JsonMap) -> Option<Result<Pattern, ContractError>> {
    if let Some(values) = map.get("$enum") {
        return Some(enum_shape(values, map));
    }
    if let Some(options) = map.get("$oneOf") {
        return Some(one_of_shape(options, map));
    }
    if let Some(pair) = map.get("$dictionary") {
        return Some(dictionary_shape(pair));
    }
    if let Some(item) = map.get("$csv") {
        return Some(pattern_from_json(item).map(|p| Pattern::Csv(CsvPattern::new(p))));
    }
    if let Some(bounds) = map.get("$string") {
        return Some(string_shape(bounds));
    }
    if let Some(bounds) = map.get("$number") {
        return Some(number_shape(bounds));
    }
    None
}

fn shape_error(shape: &str, reason: &str) -> ContractError {
    ContractError::dsl(shape, reason)
}

fn enum_shape(values: &serde_json::Value, map: &JsonMap) -> Result<Pattern, ContractError> {
    let serde_json::Value::Array(items) = values else {
        return Err(shape_error("$enum", "expected an array of values"));
    };
    let values = items
        .iter()
        .map(Value::from_json)
        .collect::<Result<Vec<_>, _>>()?;
    let nullable = map
        .get("nullable")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
        || values.iter().any(Value::is_null);
    let mut pattern = EnumPattern::new(values, nullable)?;
    if let Some(example) = map.get("example") {
        pattern = pattern.with_example(Value::from_json(example)?.to_string_literal());
    }
    Ok(Pattern::Enum(pattern))
}

fn one_of_shape(options: &serde_json::Value, map: &JsonMap) -> Result<Pattern, ContractError> {
    let serde_json::Value::Array(items) = options else {
        return Err(shape_error("$oneOf", "expected an array of shapes"));
    };
    let members = items
        .iter()
        .map(pattern_from_json)
        .collect::<Result<Vec<_>, _>>()?;
    let mut any = AnyPattern::new(members);
    if let Some(example) = map.get("example") {
        any = any.with_example(Value::from_json(example)?.to_string_literal());
    }
    Ok(Pattern::Any(any))
}

fn dictionary_shape(pair: &serde_json::Value) -> Result<Pattern, ContractError> {
    match pair {
        serde_json::Value::Array(items) if items.len() == 2 => Ok(Pattern::Dictionary(
            DictionaryPattern::new(pattern_from_json(&items[0])?, pattern_from_json(&items[1])?),
        )),
        _ => Err(shape_error("$dictionary", "expected [keyShape, valueShape]")),
    }
}

fn bound_usize(bounds: &serde_json::Value, name: &str) -> Result<Option<usize>, ContractError> {
    match bounds.get(name) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| shape_error(name, "expected a non-negative integer")),
    }
}

fn bound_decimal(bounds: &serde_json::Value, name: &str) -> Result<Option<Decimal>, ContractError> {
    match bounds.get(name) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => parse_decimal(&n.to_string()).map(Some),
        Some(_) => Err(shape_error(name, "expected a number")),
    }
}

fn string_shape(bounds: &serde_json::Value) -> Result<Pattern, ContractError> {
    let pattern = StringPattern::bounded(
        bound_usize(bounds, "minLength")?,
        bound_usize(bounds, "maxLength")?,
    )?;
    Ok(Pattern::Scalar(ScalarPattern::String(pattern)))
}

fn number_shape(bounds: &serde_json::Value) -> Result<Pattern, ContractError> {
    let integer = bounds
        .get("integer")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);
    let pattern = NumberPattern::bounded(
        bound_decimal(bounds, "minimum")?,
        bound_decimal(bounds, "maximum")?,
        integer,
    )?;
    Ok(Pattern::Scalar(ScalarPattern::Number(pattern)))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str) -> Pattern {
        parsed_pattern(text).unwrap()
    }

    #[test]
    fn scalar_keywords() {
        assert_eq!(token("(number)"), Pattern::number());
        assert_eq!(token("(string)"), Pattern::string());
        assert_eq!(token("(anything)"), Pattern::Anything);
        assert_eq!(token("(uuid)").type_name(), "uuid");
    }

    #[test]
    fn suffixes_compose() {
        assert_eq!(token("(string?)"), Pattern::nullable(Pattern::string()));
        assert_eq!(token("(Id*)"), Pattern::list(Pattern::deferred("(Id)")));
        assert_eq!(token("(number...)"), Pattern::rest(Pattern::number()));
        assert_eq!(
            token("(number*?)"),
            Pattern::nullable(Pattern::list(Pattern::number()))
        );
        assert_eq!(token("(number in string)").type_name(), "number in string");
    }

    #[test]
    fn lookup_rows_and_references() {
        assert_eq!(
            token("(id:number)"),
            Pattern::LookupRow(LookupRowPattern::new("id", Pattern::number()))
        );
        assert_eq!(token("(Customer)"), Pattern::deferred("Customer"));
        assert!(parsed_pattern("()").is_err());
        assert!(parsed_pattern("(a{b)").is_err());
    }

    #[test]
    fn plain_text_is_an_exact_string() {
        assert_eq!(token("hello"), Pattern::exact(Value::string("hello")));
    }

    #[test]
    fn key_helpers() {
        assert!(is_optional_key("name?"));
        assert!(!is_optional_key(ELLIPSIS));
        assert_eq!(without_optionality("name?"), "name");
        assert_eq!(with_pattern_delimiters("Id"), "(Id)");
        assert_eq!(with_pattern_delimiters("(Id)"), "(Id)");
        assert_eq!(without_pattern_delimiters("(Id)"), "Id");
    }

    #[test]
    fn json_shapes() {
        let pattern = token(r#"{"id": "(number)", "tags?": ["(string*)"], "kind": "user"}"#);
        let Pattern::Object(object) = pattern else {
            panic!("expected an object pattern");
        };
        assert_eq!(object.pattern["id"], Pattern::number());
        assert_eq!(object.pattern["tags?"], Pattern::list(Pattern::string()));
        assert_eq!(object.pattern["kind"], Pattern::exact(Value::string("user")));
    }

    #[test]
    fn combinator_objects() {
        let status = token(r#"{"$enum": ["OPEN", "CLOSED"], "nullable": true}"#);
        assert!(matches!(&status, Pattern::Enum(e) if e.nullable));
        let either = token(r#"{"$oneOf": ["(number)", "(string)"]}"#);
        assert_eq!(either.type_name(), "number or string");
        let dict = token(r#"{"$dictionary": ["(string)", "(number)"]}"#);
        assert!(matches!(dict, Pattern::Dictionary(_)));
        let csv = token(r#"{"$csv": "(number)"}"#);
        assert_eq!(csv.type_name(), "csv of number");
        let bounded = parsed_pattern(r#"{"$string": {"minLength": 5, "maxLength": 2}}"#);
        assert!(matches!(bounded, Err(ContractError::InvalidBounds { .. })));
        let mixed = parsed_pattern(r#"{"$enum": ["a", 1]}"#);
        assert!(matches!(mixed, Err(ContractError::MixedEnumTypes { .. })));
    }

    #[test]
    fn values_parse_json_structures_only() {
        assert_eq!(
            parsed_value(r#"{"a": 1}"#),
            Value::object([("a", Value::number(1))])
        );
        assert_eq!(parsed_value("10"), Value::string("10"));
        assert_eq!(parsed_value("{broken"), Value::string("{broken"));
    }
}
