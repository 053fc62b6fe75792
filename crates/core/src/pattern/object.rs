//! JSON objects with declared keys. A `?` suffix marks a key optional; the
//! `...` key admits undeclared keys.

use std::collections::BTreeMap;

use rand::Rng;

use super::{object_from_map, row_example, Pattern};
use crate::combination::CombinationSpec;
use crate::config::OptionalKeyGeneration;
use crate::dsl::{is_optional_key, parsed_pattern, without_optionality, without_pattern_delimiters, ELLIPSIS};
use crate::error::ContractError;
use crate::generation::PatternStream;
use crate::resolver::{Resolver, TypeStack};
use crate::result::MatchResult;
use crate::row::Row;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPattern {
    pub pattern: BTreeMap<String, Pattern>,
    /// Registered name this object was declared under, in `(Name)` form.
    pub type_alias: Option<String>,
}

impl ObjectPattern {
    pub fn new(pattern: BTreeMap<String, Pattern>) -> Self {
        ObjectPattern {
            pattern,
            type_alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.type_alias = Some(alias.into());
        self
    }

    /// A row-derived object from `(key, DSL token)` pairs.
    pub fn tabular<K: Into<String>>(
        rows: impl IntoIterator<Item = (K, String)>,
    ) -> Result<Pattern, ContractError> {
        let mut pattern = BTreeMap::new();
        for (key, token) in rows {
            pattern.insert(key.into(), parsed_pattern(&token)?);
        }
        Ok(Pattern::Tabular(ObjectPattern::new(pattern)))
    }

    pub fn type_name(&self) -> String {
        match &self.type_alias {
            Some(alias) => without_pattern_delimiters(alias).to_string(),
            None => "json object".to_string(),
        }
    }

    pub fn allows_extra_keys(&self) -> bool {
        self.pattern.contains_key(ELLIPSIS)
    }

    /// Declared keys (suffix intact) and their patterns, without the ellipsis.
    pub fn declared_keys(&self) -> impl Iterator<Item = (&String, &Pattern)> {
        self.pattern.iter().filter(|(k, _)| k.as_str() != ELLIPSIS)
    }

    fn lookup<'a>(&'a self, name: &str) -> Option<(&'a String, &'a Pattern)> {
        self.pattern
            .get_key_value(name)
            .or_else(|| self.pattern.get_key_value(&format!("{}?", name)))
    }

    fn is_declared(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    // ── Matching ─────────────────────────────────

    /// Unexpected keys are reported first, then missing keys, then values.
    pub fn matches(&self, value: &Value, resolver: &Resolver) -> MatchResult {
        let Value::Object(map) = value else {
            return MatchResult::mismatch(self.type_name(), value);
        };
        let messages = resolver.mismatch_messages();

        let unexpected: Vec<MatchResult> = if self.allows_extra_keys() {
            Vec::new()
        } else {
            map.keys()
                .filter(|k| !self.is_declared(k))
                .map(|k| MatchResult::failure(messages.unexpected_key(k)).breadcrumb(k.clone()))
                .collect()
        };

        let mut missing = Vec::new();
        let mut values = Vec::new();
        for (key, pattern) in self.declared_keys() {
            let name = without_optionality(key);
            match map.get(name) {
                Some(v) => values.push(pattern.matches(v, resolver).breadcrumb(name.to_string())),
                None if !is_optional_key(key) => missing.push(
                    MatchResult::failure(messages.missing_key(name)).breadcrumb(name.to_string()),
                ),
                None => {}
            }
        }

        MatchResult::from_results(unexpected.into_iter().chain(missing).chain(values))
    }

    // ── Generation ───────────────────────────────

    pub fn generate(&self, resolver: &Resolver) -> Result<Value, ContractError> {
        let mut out = BTreeMap::new();
        for (key, pattern) in self.declared_keys() {
            let name = without_optionality(key);
            if let Some(fact) = resolver.fact(name) {
                if pattern.matches(fact, resolver).is_success() {
                    out.insert(name.to_string(), fact.clone());
                    continue;
                }
            }
            if !is_optional_key(key) {
                out.insert(name.to_string(), pattern.generate(resolver)?);
                continue;
            }
            let include = match resolver.optional_keys() {
                OptionalKeyGeneration::All => true,
                OptionalKeyGeneration::None => false,
                OptionalKeyGeneration::Random => rand::thread_rng().gen_bool(0.5),
            };
            if !include {
                continue;
            }
            match pattern.generate(resolver) {
                Ok(v) => {
                    out.insert(name.to_string(), v);
                }
                Err(ContractError::RecursionDetected { name: cycle }) => {
                    tracing::trace!(key = %name, cycle = %cycle, "omitting recursive optional key");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Value::Object(out))
    }

    // ── Compatibility ────────────────────────────

    /// Every key this object requires must be required by the other side
    /// with a contained value. Keys only the other side declares are
    /// tolerated, and the ellipsis key is ignored.
    pub fn encompasses(
        &self,
        other: &Pattern,
        mine: &Resolver,
        theirs: &Resolver,
        type_stack: &TypeStack,
    ) -> MatchResult {
        let smaller = match other {
            Pattern::Object(o) | Pattern::Tabular(o) => o,
            Pattern::Exact(e) => return self.matches(&e.value, mine),
            other => {
                return MatchResult::failure(format!(
                    "Expected {}, got {}",
                    self.type_name(),
                    other.type_name()
                ))
            }
        };
        let messages = mine.mismatch_messages();
        MatchResult::from_results(self.declared_keys().map(|(key, bigger)| {
            let name = without_optionality(key);
            match smaller.lookup(name) {
                None if is_optional_key(key) => MatchResult::Success,
                None => MatchResult::failure(messages.missing_key(name)).breadcrumb(name.to_string()),
                Some((their_key, _)) if is_optional_key(their_key) && !is_optional_key(key) => {
                    MatchResult::failure(format!(
                        "Key named {} is mandatory, but the other side makes it optional",
                        name
                    ))
                    .breadcrumb(name.to_string())
                }
                Some((_, their_pattern)) => bigger
                    .encompasses(their_pattern, mine, theirs, type_stack)
                    .breadcrumb(name.to_string()),
            }
        }))
    }

    // ── Test generation ──────────────────────────

    /// Positive variants. Each key contributes candidates (an exact value
    /// from the row, or the pattern's own variants, plus absence for
    /// optional keys); the cross-key product is bounded by
    /// `CombinationSpec`.
    pub fn new_based_on(
        &self,
        row: &Row,
        resolver: &Resolver,
        tabular: bool,
    ) -> Result<PatternStream, ContractError> {
        let cap = resolver.max_combinations();
        let mut key_candidates: Vec<(String, Vec<Option<Pattern>>)> = Vec::new();
        for (key, pattern) in self.declared_keys() {
            let name = without_optionality(key);
            let mut candidates: Vec<Option<Pattern>> = match row_example(name, pattern, row, resolver)? {
                Some(exact) => vec![Some(exact)],
                None => {
                    let mut variants: Vec<Option<Pattern>> = pattern
                        .new_based_on(&row.step_down(name), resolver)?
                        .take(cap)
                        .map(Some)
                        .collect();
                    if is_optional_key(key) {
                        variants.push(None);
                    }
                    variants
                }
            };
            candidates.dedup();
            tracing::debug!(key = %name, candidates = candidates.len(), "object key candidates");
            key_candidates.push((key.clone(), candidates));
        }

        let spec = CombinationSpec::new(key_candidates, cap)?;
        let alias = self.type_alias.clone();
        Ok(Box::new(spec.into_iter().map(move |combination| {
            let map: BTreeMap<String, Pattern> = combination
                .into_iter()
                .filter_map(|(key, candidate)| {
                    candidate.map(|p| (without_optionality(&key).to_string(), p))
                })
                .collect();
            object_from_map(map, alias.clone(), tabular)
        })))
    }

    pub fn negative_based_on(&self, row: &Row, resolver: &Resolver, tabular: bool) -> PatternStream {
        let declared: BTreeMap<String, Pattern> = self
            .declared_keys()
            .map(|(k, p)| (k.clone(), p.clone()))
            .collect();
        let alias = self.type_alias.clone();
        let maps = resolver
            .negative_policy()
            .negative_patterns(declared, row, &resolver.negative());
        Box::new(maps.map(move |map| object_from_map(map, alias.clone(), tabular)))
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
