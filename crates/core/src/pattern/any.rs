//! Unions: `AnyPattern` (oneOf, nullable) and `EnumPattern` (closed set of
//! literals).

use rand::Rng;

use super::scalar::{negatives_for_family, value_family};
use super::{branch_breadcrumb, Pattern};
use crate::error::ContractError;
use crate::generation::{self, PatternStream};
use crate::resolver::{Resolver, TypeStack};
use crate::result::MatchResult;
use crate::row::Row;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnyPattern {
    pub patterns: Vec<Pattern>,
    pub type_alias: Option<String>,
    /// Inline example; when present it is the only generated variant.
    pub example: Option<String>,
}

impl AnyPattern {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        AnyPattern {
            patterns,
            type_alias: None,
            example: None,
        }
    }

    pub fn nullable(inner: Pattern) -> Self {
        AnyPattern::new(vec![Pattern::null(), inner])
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.type_alias = Some(alias.into());
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.patterns.iter().any(Pattern::is_null)
    }

    fn non_null_members(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter().filter(|p| !p.is_null())
    }

    fn is_enum_like(&self) -> bool {
        let mut members = self.non_null_members().peekable();
        members.peek().is_some() && members.all(|p| matches!(p, Pattern::Exact(_)))
    }

    pub fn type_name(&self) -> String {
        if self.patterns.len() == 2 && self.is_nullable() {
            if let Some(inner) = self.non_null_members().next() {
                return format!("{}?", inner.type_name());
            }
        }
        if let Some(alias) = &self.type_alias {
            return alias.clone();
        }
        self.patterns
            .iter()
            .map(Pattern::type_name)
            .collect::<Vec<_>>()
            .join(" or ")
    }

    pub fn matches(&self, value: &Value, resolver: &Resolver) -> MatchResult {
        let results: Vec<(&Pattern, MatchResult)> = self
            .patterns
            .iter()
            .map(|p| (p, p.matches(value, resolver)))
            .collect();
        if results.iter().any(|(_, r)| r.is_success()) {
            return MatchResult::Success;
        }

        if self.is_enum_like() {
            let expected: Vec<String> = self.patterns.iter().map(Pattern::type_name).collect();
            return MatchResult::mismatch(format!("one of {}", expected.join(", ")), value);
        }

        let mut failures: Vec<(&Pattern, MatchResult)> =
            results.into_iter().filter(|(p, _)| !p.is_null()).collect();
        if failures.len() == 1 {
            if let Some((_, only)) = failures.pop() {
                return only;
            }
        }
        MatchResult::from_results(
            failures
                .into_iter()
                .map(|(p, r)| r.breadcrumb(branch_breadcrumb(p))),
        )
    }

    /// Starts from a random member and tries each in turn, so a member that
    /// cannot be generated (a recursive branch) is routed around.
    pub fn generate(&self, resolver: &Resolver) -> Result<Value, ContractError> {
        if let Some(example) = &self.example {
            return self.parse(example, resolver);
        }
        let candidates: Vec<&Pattern> = self.non_null_members().collect();
        if candidates.is_empty() {
            return Ok(Value::Null);
        }
        let start = rand::thread_rng().gen_range(0..candidates.len());
        let mut last_error = None;
        for offset in 0..candidates.len() {
            let pattern = candidates[(start + offset) % candidates.len()];
            match pattern.generate(resolver) {
                Ok(value) => return Ok(value),
                Err(e) => last_error = Some(e),
            }
        }
        if self.is_nullable() {
            return Ok(Value::Null);
        }
        Err(last_error.unwrap_or(ContractError::EmptyEnum))
    }

    pub fn parse(&self, text: &str, resolver: &Resolver) -> Result<Value, ContractError> {
        let mut last_error = None;
        for pattern in self.non_null_members() {
            match pattern.parse(text, resolver) {
                Ok(value) => return Ok(value),
                Err(e) => last_error = Some(e),
            }
        }
        if self.is_nullable() {
            if let Ok(value) = Pattern::null().parse(text, resolver) {
                return Ok(value);
            }
        }
        Err(last_error.unwrap_or_else(|| {
            ContractError::parse(text, self.type_name(), "no member accepts this text")
        }))
    }

    /// Every member of the smaller side must be contained in some member of
    /// this union. Failed members report the attempt against each branch.
    pub fn encompasses(
        &self,
        other: &Pattern,
        mine: &Resolver,
        theirs: &Resolver,
        type_stack: &TypeStack,
    ) -> MatchResult {
        let smaller_is_union = matches!(other, Pattern::Any(_) | Pattern::Enum(_));
        MatchResult::from_results(other.union_members().into_iter().map(|member| {
            let attempts: Vec<MatchResult> = self
                .patterns
                .iter()
                .map(|bigger| bigger.encompasses(member, mine, theirs, type_stack))
                .collect();
            if attempts.iter().any(MatchResult::is_success) {
                return MatchResult::Success;
            }
            let result = if self.patterns.len() == 1 {
                attempts.into_iter().next().unwrap_or(MatchResult::Success)
            } else if self.is_enum_like() {
                MatchResult::failure(format!(
                    "Expected {}, got {}",
                    self.type_name(),
                    member.type_name()
                ))
            } else {
                MatchResult::from_results(
                    self.patterns
                        .iter()
                        .zip(attempts)
                        .map(|(bigger, r)| r.breadcrumb(branch_breadcrumb(bigger))),
                )
            };
            if smaller_is_union {
                result.breadcrumb(branch_breadcrumb(member))
            } else {
                result
            }
        }))
    }

    pub fn new_based_on(&self, row: &Row, resolver: &Resolver) -> Result<PatternStream, ContractError> {
        if let Some(example) = &self.example {
            let value = self.parse(example, resolver)?;
            return Ok(generation::single(Pattern::exact(value)));
        }
        let streams = self
            .patterns
            .iter()
            .map(|p| p.new_based_on(row, resolver))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Box::new(streams.into_iter().flatten()))
    }

    /// Members' negatives, minus anything some member accepts. A nullable
    /// union never gets a null negative.
    pub fn negative_based_on(&self, row: &Row, resolver: &Resolver) -> PatternStream {
        let members = self.patterns.clone();
        let check = resolver.clone();
        let nullable = self.is_nullable();
        let mut seen_scalars: Vec<Pattern> = Vec::new();
        let negatives: Vec<PatternStream> = self
            .non_null_members()
            .map(|p| p.negative_based_on(row, resolver))
            .collect();
        Box::new(negatives.into_iter().flatten().filter(move |negative| {
            if nullable && negative.is_null() {
                return false;
            }
            let accepted = members.iter().any(|m| {
                m.encompasses(negative, &check, &check, &TypeStack::new())
                    .is_success()
            });
            if accepted {
                return false;
            }
            if matches!(negative, Pattern::Scalar(_) | Pattern::Exact(_)) {
                if seen_scalars.contains(negative) {
                    return false;
                }
                seen_scalars.push(negative.clone());
            }
            true
        }))
    }
}

// ──────────────────────────────────────────────
// Enums
// ──────────────────────────────────────────────

/// A closed set of literals of one scalar type, optionally nullable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumPattern {
    pub pattern: AnyPattern,
    pub nullable: bool,
}

impl EnumPattern {
    /// Fails on an empty literal set or literals of mixed types.
    pub fn new(values: Vec<Value>, nullable: bool) -> Result<Self, ContractError> {
        let literals: Vec<Value> = values.into_iter().filter(|v| !v.is_null()).collect();
        if literals.is_empty() {
            return Err(ContractError::EmptyEnum);
        }
        let mut families: Vec<&'static str> = literals.iter().map(value_family).collect();
        families.sort_unstable();
        families.dedup();
        if families.len() > 1 || families.contains(&"structure") {
            return Err(ContractError::MixedEnumTypes {
                found: families.join(", "),
            });
        }
        let mut patterns: Vec<Pattern> = literals.into_iter().map(Pattern::exact).collect();
        if nullable {
            patterns.push(Pattern::null());
        }
        Ok(EnumPattern {
            pattern: AnyPattern::new(patterns),
            nullable,
        })
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.pattern = self.pattern.with_example(example);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.pattern = self.pattern.with_alias(alias);
        self
    }

    pub fn literals(&self) -> impl Iterator<Item = &Value> {
        self.pattern.patterns.iter().filter_map(|p| match p {
            Pattern::Exact(e) => Some(&e.value),
            _ => None,
        })
    }

    pub fn type_name(&self) -> String {
        match &self.pattern.type_alias {
            Some(alias) => alias.clone(),
            None => {
                let values: Vec<String> = self.literals().map(Value::to_string).collect();
                let suffix = if self.nullable { "?" } else { "" };
                format!("enum({}){}", values.join(", "), suffix)
            }
        }
    }

    pub fn matches(&self, value: &Value, resolver: &Resolver) -> MatchResult {
        self.pattern.matches(value, resolver)
    }

    pub fn generate(&self, resolver: &Resolver) -> Result<Value, ContractError> {
        if self.pattern.example.is_some() {
            return self.pattern.generate(resolver);
        }
        let literals: Vec<&Value> = self.literals().collect();
        let index = rand::thread_rng().gen_range(0..literals.len().max(1));
        Ok(literals.get(index).map(|v| (*v).clone()).unwrap_or(Value::Null))
    }

    /// One exact pattern per literal, or only the inline example.
    pub fn new_based_on(&self, resolver: &Resolver) -> Result<PatternStream, ContractError> {
        if let Some(example) = &self.pattern.example {
            let value = self.pattern.parse(example, resolver)?;
            return Ok(generation::single(Pattern::exact(value)));
        }
        Ok(generation::from_vec(self.pattern.patterns.clone()))
    }

    /// The other scalar types, plus null unless the enum is nullable.
    pub fn negative_patterns(&self) -> Vec<Pattern> {
        let family = self.literals().next().map(value_family).unwrap_or("null");
        negatives_for_family(family)
            .into_iter()
            .filter(|p| !(self.nullable && p.is_null()))
            .collect()
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
