//! Patterns carried inside a string: `(number in string)` and comma-joined
//! CSV lists.

use super::scalar::negatives_for_family;
use super::Pattern;
use crate::error::ContractError;
use crate::generation::{self, random_count, PatternStream};
use crate::resolver::{Resolver, TypeStack};
use crate::result::MatchResult;
use crate::row::Row;
use crate::value::Value;

fn string_encoded_mismatch(other: &Pattern, own_type: String) -> MatchResult {
    MatchResult::failure(format!("Expected {}, got {}", own_type, other.type_name()))
}

/// A string whose text must parse as `pattern`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternInString {
    pub pattern: Box<Pattern>,
}

impl PatternInString {
    pub fn new(pattern: Pattern) -> Self {
        PatternInString {
            pattern: Box::new(pattern),
        }
    }

    pub fn type_name(&self) -> String {
        format!("{} in string", self.pattern.type_name())
    }

    pub fn matches(&self, value: &Value, resolver: &Resolver) -> MatchResult {
        let Value::String(text) = value else {
            return MatchResult::mismatch(self.type_name(), value);
        };
        match self.pattern.parse(text, resolver) {
            Ok(_) => MatchResult::Success,
            Err(_) => MatchResult::mismatch(self.type_name(), value),
        }
    }

    pub fn generate(&self, resolver: &Resolver) -> Result<Value, ContractError> {
        Ok(Value::String(self.pattern.generate(resolver)?.to_string_literal()))
    }

    pub fn parse(&self, text: &str, resolver: &Resolver) -> Result<Value, ContractError> {
        self.pattern.parse(text, resolver)?;
        Ok(Value::String(text.to_string()))
    }

    pub fn encompasses(
        &self,
        other: &Pattern,
        mine: &Resolver,
        theirs: &Resolver,
        type_stack: &TypeStack,
    ) -> MatchResult {
        match other {
            Pattern::InString(o) => self.pattern.encompasses(&o.pattern, mine, theirs, type_stack),
            Pattern::Exact(e) => self.matches(&e.value, mine),
            other => string_encoded_mismatch(other, self.type_name()),
        }
    }

    pub fn new_based_on(&self, row: &Row, resolver: &Resolver) -> Result<PatternStream, ContractError> {
        let variants = self.pattern.new_based_on(row, resolver)?;
        Ok(Box::new(variants.map(|p| match p {
            Pattern::Exact(e) => Pattern::exact(Value::String(e.value.to_string_literal())),
            other => Pattern::InString(PatternInString::new(other)),
        })))
    }

    /// Wrong wire types, plus strings holding a value of the wrong inner type.
    pub fn negative_based_on(&self, row: &Row, resolver: &Resolver) -> PatternStream {
        let wrapped: Vec<Pattern> = self
            .pattern
            .negative_based_on(row, resolver)
            .filter(|n| !n.is_null() && !matches!(n, Pattern::Scalar(s) if s.family() == "string"))
            .map(|n| Pattern::InString(PatternInString::new(n)))
            .collect();
        Box::new(negatives_for_family("string").into_iter().chain(wrapped))
    }
}

// ──────────────────────────────────────────────
// CSV
// ──────────────────────────────────────────────

/// Comma-separated items, each matching `pattern`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvPattern {
    pub pattern: Box<Pattern>,
}

impl CsvPattern {
    pub fn new(pattern: Pattern) -> Self {
        CsvPattern {
            pattern: Box::new(pattern),
        }
    }

    pub fn type_name(&self) -> String {
        format!("csv of {}", self.pattern.type_name())
    }

    fn items(text: &str) -> Vec<&str> {
        if text.trim().is_empty() {
            Vec::new()
        } else {
            text.split(',').map(str::trim).collect()
        }
    }

    pub fn matches(&self, value: &Value, resolver: &Resolver) -> MatchResult {
        let Value::String(text) = value else {
            return MatchResult::mismatch(self.type_name(), value);
        };
        MatchResult::from_results(Self::items(text).into_iter().enumerate().map(|(i, item)| {
            match self.pattern.parse(item, resolver) {
                Ok(_) => MatchResult::Success,
                Err(e) => MatchResult::failure(e.to_string()).breadcrumb(format!("[{}]", i)),
            }
        }))
    }

    pub fn generate(&self, resolver: &Resolver) -> Result<Value, ContractError> {
        let items = (0..random_count(1, 3))
            .map(|_| Ok(self.pattern.generate(resolver)?.to_string_literal()))
            .collect::<Result<Vec<_>, ContractError>>()?;
        Ok(Value::String(items.join(",")))
    }

    pub fn parse(&self, text: &str, resolver: &Resolver) -> Result<Value, ContractError> {
        let value = Value::String(text.to_string());
        match self.matches(&value, resolver) {
            MatchResult::Success => Ok(value),
            MatchResult::Failure(f) => Err(ContractError::parse(text, self.type_name(), f.report())),
        }
    }

    pub fn encompasses(
        &self,
        other: &Pattern,
        mine: &Resolver,
        theirs: &Resolver,
        type_stack: &TypeStack,
    ) -> MatchResult {
        match other {
            Pattern::Csv(o) => self.pattern.encompasses(&o.pattern, mine, theirs, type_stack),
            Pattern::Exact(e) => self.matches(&e.value, mine),
            other => string_encoded_mismatch(other, self.type_name()),
        }
    }

    pub fn new_based_on(&self, row: &Row, resolver: &Resolver) -> Result<PatternStream, ContractError> {
        let variants = self.pattern.new_based_on(row, resolver)?;
        Ok(Box::new(variants.map(|p| match p {
            Pattern::Exact(e) => Pattern::exact(Value::String(e.value.to_string_literal())),
            other => Pattern::Csv(CsvPattern::new(other)),
        })))
    }

    pub fn negative_based_on(&self, _row: &Row, _resolver: &Resolver) -> PatternStream {
        generation::from_vec(negatives_for_family("string"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_in_string_checks_the_text() {
        let resolver = Resolver::new();
        let pattern = Pattern::InString(PatternInString::new(Pattern::number()));
        assert_eq!(pattern.type_name(), "number in string");
        assert!(pattern.matches(&Value::string("42"), &resolver).is_success());
        assert!(pattern.matches(&Value::string("forty"), &resolver).is_failure());
        assert!(pattern.matches(&Value::number(42), &resolver).is_failure());
        let generated = pattern.generate(&resolver).unwrap();
        assert!(pattern.matches(&generated, &resolver).is_success());
    }

    #[test]
    fn string_encoded_negatives_include_wrong_inner_types() {
        let pattern = Pattern::InString(PatternInString::new(Pattern::number()));
        let names: Vec<String> = pattern
            .negative_based_on(&Row::default(), &Resolver::new())
            .map(|p| p.type_name())
            .collect();
        assert_eq!(names, vec!["null", "number", "boolean", "boolean in string"]);
    }

    #[test]
    fn csv_reports_bad_items_by_index() {
        let resolver = Resolver::new();
        let pattern = Pattern::Csv(CsvPattern::new(Pattern::number()));
        assert!(pattern.matches(&Value::string("1,2,3"), &resolver).is_success());
        assert!(pattern.matches(&Value::string(""), &resolver).is_success());
        let report = pattern.matches(&Value::string("1,x"), &resolver).report();
        assert!(report.starts_with(">> [1]"), "{}", report);
        let generated = pattern.generate(&resolver).unwrap();
        assert!(pattern.matches(&generated, &resolver).is_success());
    }
}
