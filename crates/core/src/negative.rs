//! Negative-test policies for objects.
//!
//! Every policy corrupts one key at a time: the key's pattern is replaced by
//! each of its negatives while every other key stays unchanged. Policies
//! differ only in which negatives they keep.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Deserialize;

use crate::dsl::without_optionality;
use crate::error::ContractError;
use crate::pattern::scalar::value_family;
use crate::pattern::{Pattern, ScalarPattern};
use crate::resolver::Resolver;
use crate::row::Row;

/// A lazily evaluated sequence of key-to-pattern maps.
pub type PatternMapStream = Box<dyn Iterator<Item = BTreeMap<String, Pattern>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NegativePolicy {
    /// Every wrong-type substitute, lazily.
    #[default]
    All,
    /// Same as `All`, evaluated eagerly.
    Strict,
    /// For values carried as text (query parameters, headers): string
    /// fields get no negatives and null is never substituted.
    Stringly,
    /// For typed bodies: never null, never a same-type substitute.
    NonStringly,
}

impl FromStr for NegativePolicy {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(NegativePolicy::All),
            "strict" => Ok(NegativePolicy::Strict),
            "stringly" => Ok(NegativePolicy::Stringly),
            "non-stringly" | "nonstringly" => Ok(NegativePolicy::NonStringly),
            other => Err(ContractError::Config(format!(
                "unknown negative policy \"{}\" (expected all, strict, stringly or non-stringly)",
                other
            ))),
        }
    }
}

impl NegativePolicy {
    /// One map per (key, negative) pair. The corrupted key loses its
    /// optional marker so the negative value is always sent.
    pub fn negative_patterns(
        self,
        pattern: BTreeMap<String, Pattern>,
        row: &Row,
        resolver: &Resolver,
    ) -> PatternMapStream {
        let keys: Vec<String> = pattern.keys().cloned().collect();
        let row = row.clone();
        let resolver = resolver.clone();
        let stream: PatternMapStream = Box::new(keys.into_iter().flat_map(move |key| {
            let field = pattern[&key].clone();
            let name = without_optionality(&key).to_string();
            let field_family = family_of(&field, &resolver);
            let base = pattern.clone();
            field
                .negative_based_on(&row.step_down(&name), &resolver)
                .filter(move |negative| self.keeps(field_family, negative))
                .map(move |negative| {
                    let mut corrupted = base.clone();
                    corrupted.remove(&key);
                    corrupted.insert(name.clone(), negative);
                    corrupted
                })
        }));
        match self {
            NegativePolicy::Strict => Box::new(stream.collect::<Vec<_>>().into_iter()),
            _ => stream,
        }
    }

    fn keeps(self, field_family: &str, negative: &Pattern) -> bool {
        // Corrupted structures (an object with one bad key) are never
        // same-type substitutes.
        let same_type = match negative_family(negative) {
            "structure" => false,
            family => family == field_family,
        };
        match self {
            NegativePolicy::All | NegativePolicy::Strict => true,
            NegativePolicy::Stringly => field_family != "string" && !negative.is_null() && !same_type,
            NegativePolicy::NonStringly => !negative.is_null() && !same_type,
        }
    }
}

/// Wire family of a negative pattern: "null", "number", "boolean",
/// "string", or "structure".
fn negative_family(pattern: &Pattern) -> &'static str {
    match pattern {
        Pattern::Scalar(s) => s.family(),
        Pattern::Exact(e) => value_family(&e.value),
        Pattern::InString(_) | Pattern::Csv(_) => "string",
        _ => "structure",
    }
}

/// Wire family of a declared field, looking through nullable unions and
/// named references.
fn family_of(pattern: &Pattern, resolver: &Resolver) -> &'static str {
    match pattern {
        Pattern::Scalar(ScalarPattern::Null) => "null",
        Pattern::Scalar(s) => s.family(),
        Pattern::Exact(e) => value_family(&e.value),
        Pattern::Enum(e) => e.literals().next().map(value_family).unwrap_or("null"),
        Pattern::InString(_) | Pattern::Csv(_) => "string",
        Pattern::Any(a) => {
            let mut members = a.patterns.iter().filter(|p| !p.is_null());
            match (members.next(), members.next()) {
                (Some(only), None) => family_of(only, resolver),
                _ => "structure",
            }
        }
        Pattern::Deferred(d) => match resolver.resolve_deferred(&d.name) {
            Ok(resolved) => family_of(resolved, resolver),
            Err(_) => "structure",
        },
        Pattern::LookupRow(l) => family_of(&l.pattern, resolver),
        _ => "structure",
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
