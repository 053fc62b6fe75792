//! Named references resolved through the [`Resolver`], and row-lookup
//! patterns (`(name:type)`).

use super::{row_example, Pattern};
use crate::dsl::{with_pattern_delimiters, without_pattern_delimiters};
use crate::error::ContractError;
use crate::generation::{self, PatternStream};
use crate::resolver::{Resolver, TypeStack};
use crate::result::MatchResult;
use crate::row::Row;
use crate::value::Value;

/// A reference to a registered pattern, held in `(Name)` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredPattern {
    pub name: String,
}

impl DeferredPattern {
    pub fn new(name: &str) -> Self {
        DeferredPattern {
            name: with_pattern_delimiters(name),
        }
    }

    pub fn type_name(&self) -> String {
        without_pattern_delimiters(&self.name).to_string()
    }

    pub fn matches(&self, value: &Value, resolver: &Resolver) -> MatchResult {
        match resolver.resolve_deferred(&self.name) {
            Ok(pattern) => pattern.matches(value, resolver),
            Err(ContractError::RecursionDetected { .. }) => MatchResult::Success,
            Err(e) => MatchResult::failure(e.to_string()),
        }
    }

    pub fn generate(&self, resolver: &Resolver) -> Result<Value, ContractError> {
        let guarded = resolver.with_cycle_guard(&self.name)?;
        guarded.resolve_deferred(&self.name)?.generate(&guarded)
    }

    /// A reference already being expanded is emitted as-is, which keeps
    /// recursive types finite.
    pub fn new_based_on(&self, row: &Row, resolver: &Resolver) -> Result<PatternStream, ContractError> {
        let guarded = match resolver.with_cycle_guard(&self.name) {
            Ok(guarded) => guarded,
            Err(ContractError::RecursionDetected { .. }) => {
                return Ok(generation::single(Pattern::Deferred(self.clone())))
            }
            Err(e) => return Err(e),
        };
        let pattern = guarded.resolve_deferred(&self.name)?.clone();
        pattern.new_based_on(row, &guarded)
    }

    pub fn negative_based_on(&self, row: &Row, resolver: &Resolver) -> PatternStream {
        let Ok(guarded) = resolver.with_cycle_guard(&self.name) else {
            return generation::empty();
        };
        match guarded.resolve_deferred(&self.name) {
            Ok(pattern) => pattern.clone().negative_based_on(row, &guarded),
            Err(e) => {
                tracing::debug!(name = %self.name, error = %e, "no negatives for unresolved reference");
                generation::empty()
            }
        }
    }

    /// Compares the named types once per `(mine, theirs)` pair; a pair
    /// already on the stack is assumed compatible. An anonymous smaller side
    /// is never short-circuited: it is a finite tree, so the walk ends.
    pub fn encompasses(
        &self,
        other: &Pattern,
        mine: &Resolver,
        theirs: &Resolver,
        type_stack: &TypeStack,
    ) -> MatchResult {
        let mut stack = type_stack.clone();
        if let Some(other_name) = named_identity(other) {
            let pair = (self.name.clone(), other_name);
            if type_stack.contains(&pair) {
                tracing::trace!(bigger = %pair.0, smaller = %pair.1, "type pair already under comparison");
                return MatchResult::Success;
            }
            stack.insert(pair);
        }

        let mine_resolved = match mine.resolve_deferred(&self.name) {
            Ok(p) => p,
            Err(ContractError::RecursionDetected { .. }) => return MatchResult::Success,
            Err(e) => return MatchResult::failure(e.to_string()),
        };
        let theirs_resolved = match other {
            Pattern::Deferred(d) => match theirs.resolve_deferred(&d.name) {
                Ok(p) => p,
                Err(ContractError::RecursionDetected { .. }) => return MatchResult::Success,
                Err(e) => return MatchResult::failure(e.to_string()),
            },
            other => other,
        };
        mine_resolved.encompasses(theirs_resolved, mine, theirs, &stack)
    }
}

/// The registered name a pattern stands for, in `(Name)` form.
fn named_identity(pattern: &Pattern) -> Option<String> {
    match pattern {
        Pattern::Deferred(d) => Some(d.name.clone()),
        Pattern::Object(o) | Pattern::Tabular(o) => o.type_alias.clone(),
        _ => None,
    }
}

// ──────────────────────────────────────────────
// Row lookup
// ──────────────────────────────────────────────

/// `(key:type)`: a pattern whose concrete value comes from the row column
/// (or fact) named `key` when one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRowPattern {
    pub key: String,
    pub pattern: Box<Pattern>,
}

impl LookupRowPattern {
    pub fn new(key: impl Into<String>, pattern: Pattern) -> Self {
        LookupRowPattern {
            key: key.into(),
            pattern: Box::new(pattern),
        }
    }

    pub fn generate(&self, resolver: &Resolver) -> Result<Value, ContractError> {
        if let Some(fact) = resolver.fact(&self.key) {
            if self.pattern.matches(fact, resolver).is_success() {
                return Ok(fact.clone());
            }
        }
        self.pattern.generate(resolver)
    }

    pub fn new_based_on(&self, row: &Row, resolver: &Resolver) -> Result<PatternStream, ContractError> {
        match row_example(&self.key, &self.pattern, row, resolver)? {
            Some(exact) => Ok(generation::single(exact)),
            None => self.pattern.new_based_on(row, resolver),
        }
    }
}
