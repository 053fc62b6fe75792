//! The Pattern type system.
//!
//! `Pattern` is a closed sum type. Every variant supports the same six
//! operations, dispatched here:
//!
//! - [`Pattern::matches`] -- validate a [`Value`]
//! - [`Pattern::generate`] -- synthesize an example value
//! - [`Pattern::parse`] -- read text into a value of the expected shape
//! - [`Pattern::encompasses`] -- backward-compatibility containment
//! - [`Pattern::new_based_on`] -- positive test variants (lazy)
//! - [`Pattern::negative_based_on`] -- negative test variants (lazy)
//!
//! The variant-specific logic lives in the submodules.

pub mod any;
pub mod array;
pub mod deferred;
pub mod dictionary;
pub mod encoded;
pub mod exact;
pub mod object;
pub mod scalar;
pub mod xml;

use std::collections::BTreeMap;

pub use any::{AnyPattern, EnumPattern};
pub use array::{ArrayPattern, ListPattern, RestPattern};
pub use deferred::{DeferredPattern, LookupRowPattern};
pub use dictionary::DictionaryPattern;
pub use encoded::{CsvPattern, PatternInString};
pub use exact::ExactValuePattern;
pub use object::ObjectPattern;
pub use scalar::{NumberPattern, ScalarPattern, StringPattern};
pub use xml::{Occurrence, XmlPattern};

use crate::dsl::{is_pattern_token, parsed_pattern, parsed_value, without_pattern_delimiters};
use crate::error::ContractError;
use crate::generation::{self, PatternStream};
use crate::resolver::{Resolver, TypeStack};
use crate::result::MatchResult;
use crate::row::Row;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    // Scalars
    Scalar(ScalarPattern),
    Anything,
    // Structural
    Object(ObjectPattern),
    Tabular(ObjectPattern),
    Array(ArrayPattern),
    List(ListPattern),
    Dictionary(DictionaryPattern),
    Xml(XmlPattern),
    // Combinators
    Any(AnyPattern),
    Enum(EnumPattern),
    Exact(ExactValuePattern),
    Deferred(DeferredPattern),
    LookupRow(LookupRowPattern),
    InString(PatternInString),
    Csv(CsvPattern),
    Rest(RestPattern),
}

// ──────────────────────────────────────────────
// Constructors
// ──────────────────────────────────────────────

impl Pattern {
    pub fn number() -> Self {
        Pattern::Scalar(ScalarPattern::Number(NumberPattern::default()))
    }

    pub fn string() -> Self {
        Pattern::Scalar(ScalarPattern::String(StringPattern::default()))
    }

    pub fn boolean() -> Self {
        Pattern::Scalar(ScalarPattern::Boolean)
    }

    pub fn null() -> Self {
        Pattern::Scalar(ScalarPattern::Null)
    }

    pub fn exact(value: Value) -> Self {
        Pattern::Exact(ExactValuePattern::new(value))
    }

    pub fn deferred(name: &str) -> Self {
        Pattern::Deferred(DeferredPattern::new(name))
    }

    /// `{null, inner}` union, written `(inner?)` in the DSL.
    pub fn nullable(inner: Pattern) -> Self {
        Pattern::Any(AnyPattern::nullable(inner))
    }

    pub fn list(element: Pattern) -> Self {
        Pattern::List(ListPattern::new(element))
    }

    pub fn rest(element: Pattern) -> Self {
        Pattern::Rest(RestPattern::new(element))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Pattern)>) -> Self {
        Pattern::Object(ObjectPattern::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn array(elements: Vec<Pattern>) -> Self {
        Pattern::Array(ArrayPattern::new(elements))
    }

    /// Parse a DSL token or JSON shape, e.g. `(number?)` or `{"id": "(number)"}`.
    pub fn parse_dsl(text: &str) -> Result<Self, ContractError> {
        parsed_pattern(text)
    }

    /// Members of a union, or the pattern itself.
    pub fn union_members(&self) -> Vec<&Pattern> {
        match self {
            Pattern::Any(any) => any.patterns.iter().collect(),
            Pattern::Enum(e) => e.pattern.patterns.iter().collect(),
            other => vec![other],
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Pattern::Scalar(ScalarPattern::Null))
    }

    fn is_union_like(&self) -> bool {
        matches!(
            self,
            Pattern::Any(_)
                | Pattern::Enum(_)
                | Pattern::Deferred(_)
                | Pattern::LookupRow(_)
                | Pattern::Anything
        )
    }

    /// Names of every deferred reference reachable without resolving.
    pub fn references(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references(&self, out: &mut Vec<String>) {
        match self {
            Pattern::Deferred(d) => out.push(d.name.clone()),
            Pattern::Object(o) | Pattern::Tabular(o) => {
                o.pattern.values().for_each(|p| p.collect_references(out))
            }
            Pattern::Array(a) => a.elements.iter().for_each(|p| p.collect_references(out)),
            Pattern::List(l) => l.element.collect_references(out),
            Pattern::Rest(r) => r.pattern.collect_references(out),
            Pattern::Dictionary(d) => {
                d.key.collect_references(out);
                d.value.collect_references(out);
            }
            Pattern::Any(a) => a.patterns.iter().for_each(|p| p.collect_references(out)),
            Pattern::LookupRow(l) => l.pattern.collect_references(out),
            Pattern::InString(s) => s.pattern.collect_references(out),
            Pattern::Csv(c) => c.pattern.collect_references(out),
            Pattern::Xml(x) => {
                if let Some(type_ref) = &x.type_ref {
                    out.push(type_ref.clone());
                }
                x.attributes.values().for_each(|p| p.collect_references(out));
                x.children.iter().for_each(|p| p.collect_references(out));
            }
            Pattern::Scalar(_) | Pattern::Anything | Pattern::Enum(_) | Pattern::Exact(_) => {}
        }
    }
}

/// Breadcrumb naming the union branch a failure came from.
pub(crate) fn branch_breadcrumb(pattern: &Pattern) -> String {
    match pattern {
        Pattern::Deferred(d) => format!("(when {} object)", without_pattern_delimiters(&d.name)),
        Pattern::Object(o) | Pattern::Tabular(o) if o.type_alias.is_some() => format!(
            "(when {} object)",
            without_pattern_delimiters(o.type_alias.as_deref().unwrap_or_default())
        ),
        other => format!("(when {})", other.type_name()),
    }
}

/// Parse text as a generic value and validate it against `pattern`.
pub(crate) fn parse_structured(
    pattern: &Pattern,
    text: &str,
    resolver: &Resolver,
) -> Result<Value, ContractError> {
    let value = parsed_value(text);
    match pattern.matches(&value, resolver) {
        MatchResult::Success => Ok(value),
        MatchResult::Failure(f) => Err(ContractError::parse(text, pattern.type_name(), f.report())),
    }
}

// ──────────────────────────────────────────────
// Operations
// ──────────────────────────────────────────────

impl Pattern {
    pub fn type_name(&self) -> String {
        match self {
            Pattern::Scalar(s) => s.type_name().to_string(),
            Pattern::Anything => "anything".to_string(),
            Pattern::Object(o) | Pattern::Tabular(o) => o.type_name(),
            Pattern::Array(_) => "json array".to_string(),
            Pattern::List(l) => l.type_name(),
            Pattern::Dictionary(d) => d.type_name(),
            Pattern::Xml(x) => x.type_name(),
            Pattern::Any(a) => a.type_name(),
            Pattern::Enum(e) => e.type_name(),
            Pattern::Exact(e) => e.type_name(),
            Pattern::Deferred(d) => d.type_name(),
            Pattern::LookupRow(l) => l.pattern.type_name(),
            Pattern::InString(s) => s.type_name(),
            Pattern::Csv(c) => c.type_name(),
            Pattern::Rest(r) => r.type_name(),
        }
    }

    pub fn matches(&self, value: &Value, resolver: &Resolver) -> MatchResult {
        if resolver.is_mock_mode() {
            if let Value::String(s) = value {
                if is_pattern_token(s) {
                    if let Ok(token) = parsed_pattern(s) {
                        return self.encompasses(&token, resolver, resolver, &TypeStack::new());
                    }
                }
            }
        }
        match self {
            Pattern::Scalar(s) => s.matches(value),
            Pattern::Anything => MatchResult::Success,
            Pattern::Object(o) | Pattern::Tabular(o) => o.matches(value, resolver),
            Pattern::Array(a) => a.matches(value, resolver),
            Pattern::List(l) => l.matches(value, resolver),
            Pattern::Dictionary(d) => d.matches(value, resolver),
            Pattern::Xml(x) => x.matches(value, resolver),
            Pattern::Any(a) => a.matches(value, resolver),
            Pattern::Enum(e) => e.matches(value, resolver),
            Pattern::Exact(e) => e.matches(value),
            Pattern::Deferred(d) => d.matches(value, resolver),
            Pattern::LookupRow(l) => l.pattern.matches(value, resolver),
            Pattern::InString(s) => s.matches(value, resolver),
            Pattern::Csv(c) => c.matches(value, resolver),
            Pattern::Rest(r) => r.matches(value, resolver),
        }
    }

    pub fn generate(&self, resolver: &Resolver) -> Result<Value, ContractError> {
        match self {
            Pattern::Scalar(s) => Ok(s.generate()),
            Pattern::Anything => Ok(Value::string(generation::random_string(6))),
            Pattern::Object(o) | Pattern::Tabular(o) => o.generate(resolver),
            Pattern::Array(a) => a.generate(resolver),
            Pattern::List(l) => l.generate(resolver),
            Pattern::Dictionary(d) => d.generate(resolver),
            Pattern::Xml(x) => x.generate(resolver),
            Pattern::Any(a) => a.generate(resolver),
            Pattern::Enum(e) => e.generate(resolver),
            Pattern::Exact(e) => Ok(e.value.clone()),
            Pattern::Deferred(d) => d.generate(resolver),
            Pattern::LookupRow(l) => l.generate(resolver),
            Pattern::InString(s) => s.generate(resolver),
            Pattern::Csv(c) => c.generate(resolver),
            Pattern::Rest(r) => r.generate(resolver),
        }
    }

    pub fn parse(&self, text: &str, resolver: &Resolver) -> Result<Value, ContractError> {
        match self {
            Pattern::Scalar(s) => s.parse(text),
            Pattern::Anything => Ok(parsed_value(text)),
            Pattern::Any(a) => a.parse(text, resolver),
            Pattern::Enum(e) => e.pattern.parse(text, resolver),
            Pattern::Exact(e) => e.parse(text),
            Pattern::Deferred(d) => resolver.resolve_deferred(&d.name)?.parse(text, resolver),
            Pattern::LookupRow(l) => l.pattern.parse(text, resolver),
            Pattern::InString(s) => s.parse(text, resolver),
            Pattern::Csv(c) => c.parse(text, resolver),
            Pattern::Object(_)
            | Pattern::Tabular(_)
            | Pattern::Array(_)
            | Pattern::List(_)
            | Pattern::Rest(_)
            | Pattern::Dictionary(_)
            | Pattern::Xml(_) => parse_structured(self, text, resolver),
        }
    }

    /// Is every value acceptable to `other` (under `theirs`) also acceptable
    /// to `self` (under `mine`)? `type_stack` holds the named-type pairs
    /// already under comparison; re-entering one succeeds.
    pub fn encompasses(
        &self,
        other: &Pattern,
        mine: &Resolver,
        theirs: &Resolver,
        type_stack: &TypeStack,
    ) -> MatchResult {
        match other {
            Pattern::Deferred(d) if !matches!(self, Pattern::Deferred(_)) => {
                return match theirs.resolve_deferred(&d.name) {
                    Ok(resolved) => self.encompasses(resolved, mine, theirs, type_stack),
                    Err(ContractError::RecursionDetected { .. }) => MatchResult::Success,
                    Err(e) => MatchResult::failure(e.to_string()),
                };
            }
            Pattern::LookupRow(l) => {
                return self.encompasses(&l.pattern, mine, theirs, type_stack);
            }
            Pattern::Any(_) | Pattern::Enum(_) if !self.is_union_like() => {
                return MatchResult::from_results(other.union_members().into_iter().map(
                    |member| {
                        self.encompasses(member, mine, theirs, type_stack)
                            .breadcrumb(branch_breadcrumb(member))
                    },
                ));
            }
            _ => {}
        }

        match self {
            Pattern::Anything => MatchResult::Success,
            Pattern::Scalar(s) => s.encompasses(other),
            Pattern::Exact(e) => e.encompasses(other),
            Pattern::Deferred(d) => d.encompasses(other, mine, theirs, type_stack),
            Pattern::LookupRow(l) => l.pattern.encompasses(other, mine, theirs, type_stack),
            Pattern::Any(a) => a.encompasses(other, mine, theirs, type_stack),
            Pattern::Enum(e) => e.pattern.encompasses(other, mine, theirs, type_stack),
            Pattern::Object(o) | Pattern::Tabular(o) => {
                o.encompasses(other, mine, theirs, type_stack)
            }
            Pattern::Array(a) => a.encompasses(other, mine, theirs, type_stack),
            Pattern::List(l) => l.encompasses(other, mine, theirs, type_stack),
            Pattern::Rest(r) => r.encompasses(other, mine, theirs, type_stack),
            Pattern::Dictionary(d) => d.encompasses(other, mine, theirs, type_stack),
            Pattern::Xml(x) => x.encompasses(other, mine, theirs, type_stack),
            Pattern::InString(s) => s.encompasses(other, mine, theirs, type_stack),
            Pattern::Csv(c) => c.encompasses(other, mine, theirs, type_stack),
        }
    }

    /// `encompasses` with a fresh type stack.
    pub fn is_compatible_with(&self, older: &Pattern, mine: &Resolver, theirs: &Resolver) -> MatchResult {
        self.encompasses(older, mine, theirs, &TypeStack::new())
    }

    /// Positive test variants. Row examples specialize matching keys into
    /// exact values; an example that does not parse is an error unless the
    /// resolver is in negative mode.
    pub fn new_based_on(&self, row: &Row, resolver: &Resolver) -> Result<PatternStream, ContractError> {
        match self {
            Pattern::Scalar(_) | Pattern::Anything | Pattern::Exact(_) => {
                Ok(generation::single(self.clone()))
            }
            Pattern::Object(o) => o.new_based_on(row, resolver, false),
            Pattern::Tabular(o) => o.new_based_on(row, resolver, true),
            Pattern::Array(a) => a.new_based_on(row, resolver),
            Pattern::List(l) => l.new_based_on(row, resolver),
            Pattern::Rest(r) => r.new_based_on(row, resolver),
            Pattern::Dictionary(d) => d.new_based_on(row, resolver),
            Pattern::Xml(x) => x.new_based_on(row, resolver),
            Pattern::Any(a) => a.new_based_on(row, resolver),
            Pattern::Enum(e) => e.new_based_on(resolver),
            Pattern::Deferred(d) => d.new_based_on(row, resolver),
            Pattern::LookupRow(l) => l.new_based_on(row, resolver),
            Pattern::InString(s) => s.new_based_on(row, resolver),
            Pattern::Csv(c) => c.new_based_on(row, resolver),
        }
    }

    /// Variants expected to fail matching. Never includes a variant of the
    /// pattern's own type.
    pub fn negative_based_on(&self, row: &Row, resolver: &Resolver) -> PatternStream {
        match self {
            Pattern::Scalar(s) => generation::from_vec(s.negative_patterns()),
            Pattern::Anything => generation::empty(),
            Pattern::Exact(e) => generation::from_vec(e.negative_patterns()),
            Pattern::Object(o) => o.negative_based_on(row, resolver, false),
            Pattern::Tabular(o) => o.negative_based_on(row, resolver, true),
            Pattern::Array(a) => a.negative_based_on(row, resolver),
            Pattern::List(l) => l.negative_based_on(row, resolver),
            Pattern::Rest(r) => r.negative_based_on(row, resolver),
            Pattern::Dictionary(d) => d.negative_based_on(row, resolver),
            Pattern::Xml(x) => x.negative_based_on(row, resolver),
            Pattern::Any(a) => a.negative_based_on(row, resolver),
            Pattern::Enum(e) => generation::from_vec(e.negative_patterns()),
            Pattern::Deferred(d) => d.negative_based_on(row, resolver),
            Pattern::LookupRow(l) => l.pattern.negative_based_on(row, resolver),
            Pattern::InString(s) => s.negative_based_on(row, resolver),
            Pattern::Csv(c) => c.negative_based_on(row, resolver),
        }
    }

    /// Generate and keep the value only if it round-trips through `matches`.
    pub fn generate_valid(&self, resolver: &Resolver) -> Result<Value, ContractError> {
        let value = self.generate(resolver)?;
        match self.matches(&value, resolver) {
            MatchResult::Success => Ok(value),
            MatchResult::Failure(f) => Err(ContractError::parse(
                value.to_string(),
                self.type_name(),
                f.report(),
            )),
        }
    }
}

/// The row's example for `name` as an exact pattern. JSON null, boolean
/// and number examples are used as typed; text cells are parsed. An
/// example the pattern rejects is an error, except in negative mode where
/// it is skipped so the corrupted test is still produced.
pub(crate) fn row_example(
    name: &str,
    pattern: &Pattern,
    row: &Row,
    resolver: &Resolver,
) -> Result<Option<Pattern>, ContractError> {
    if !row.contains_field(name) {
        return Ok(None);
    }
    let parsed = match row.typed_field(name) {
        Some(typed) if pattern.matches(typed, resolver).is_success() => Ok(typed.clone()),
        Some(Value::Null) => Err(ContractError::parse(
            "null",
            pattern.type_name(),
            "null is not accepted",
        )),
        _ => pattern.parse(&row.get_field(name)?, resolver),
    };
    match parsed {
        Ok(value) => Ok(Some(Pattern::exact(value))),
        Err(e) if resolver.is_negative() => {
            tracing::warn!(key = %name, error = %e, "skipping invalid example in negative run");
            Ok(None)
        }
        Err(e) => Err(ContractError::InvalidExample {
            key: name.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Build a map-keyed object pattern, used by negative policies.
pub(crate) fn object_from_map(
    map: BTreeMap<String, Pattern>,
    type_alias: Option<String>,
    tabular: bool,
) -> Pattern {
    let object = ObjectPattern {
        pattern: map,
        type_alias,
    };
    if tabular {
        Pattern::Tabular(object)
    } else {
        Pattern::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_mode_accepts_type_tokens() {
        let resolver = Resolver::new().mock();
        let number = Pattern::number();
        assert!(number
            .matches(&Value::string("(number)"), &resolver)
            .is_success());
        assert!(number
            .matches(&Value::string("(string)"), &resolver)
            .is_failure());
        assert!(number
            .matches(&Value::string("(number)"), &Resolver::new())
            .is_failure());
    }

    #[test]
    fn references_are_collected() {
        let pattern = Pattern::object([
            ("customer", Pattern::deferred("(Customer)")),
            ("orders", Pattern::list(Pattern::deferred("(Order)"))),
        ]);
        let mut refs = pattern.references();
        refs.sort();
        assert_eq!(refs, vec!["(Customer)".to_string(), "(Order)".to_string()]);
    }

    #[test]
    fn branch_breadcrumbs_name_the_type() {
        assert_eq!(
            branch_breadcrumb(&Pattern::deferred("(Customer)")),
            "(when Customer object)"
        );
        assert_eq!(branch_breadcrumb(&Pattern::number()), "(when number)");
    }
}
