use std::collections::BTreeMap;

use super::Pattern;
use crate::dsl::without_optionality;
use crate::error::ContractError;
use crate::generation::{random_count, PatternStream};
use crate::resolver::{Resolver, TypeStack};
use crate::result::MatchResult;
use crate::row::Row;
use crate::value::Value;

/// A JSON object with arbitrary keys: every key matches `key`, every value
/// matches `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryPattern {
    pub key: Box<Pattern>,
    pub value: Box<Pattern>,
}

impl DictionaryPattern {
    pub fn new(key: Pattern, value: Pattern) -> Self {
        DictionaryPattern {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn type_name(&self) -> String {
        format!(
            "dictionary of {} to {}",
            self.key.type_name(),
            self.value.type_name()
        )
    }

    pub fn matches(&self, value: &Value, resolver: &Resolver) -> MatchResult {
        let Value::Object(map) = value else {
            return MatchResult::mismatch(self.type_name(), value);
        };
        MatchResult::from_results(map.iter().map(|(k, v)| {
            let key_result = match self.key.parse(k, resolver) {
                Ok(_) => MatchResult::Success,
                Err(_) => MatchResult::failure(format!(
                    "Key {} is not a valid {}",
                    k,
                    self.key.type_name()
                )),
            };
            MatchResult::from_results([key_result, self.value.matches(v, resolver)]).breadcrumb(k.clone())
        }))
    }

    pub fn generate(&self, resolver: &Resolver) -> Result<Value, ContractError> {
        let mut map = BTreeMap::new();
        for _ in 0..random_count(1, 3) {
            let key = self.key.generate(resolver)?.to_string_literal();
            match self.value.generate(resolver) {
                Ok(value) => {
                    map.insert(key, value);
                }
                Err(ContractError::RecursionDetected { .. }) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(Value::Object(map))
    }

    pub fn new_based_on(&self, row: &Row, resolver: &Resolver) -> Result<PatternStream, ContractError> {
        let key = self.key.clone();
        let variants = self.value.new_based_on(row, resolver)?;
        Ok(Box::new(variants.map(move |value| {
            Pattern::Dictionary(DictionaryPattern {
                key: key.clone(),
                value: Box::new(value),
            })
        })))
    }

    /// Dictionaries whose values are of the wrong type.
    pub fn negative_based_on(&self, row: &Row, resolver: &Resolver) -> PatternStream {
        let key = self.key.clone();
        Box::new(
            self.value
                .negative_based_on(row, &resolver.negative())
                .map(move |value| {
                    Pattern::Dictionary(DictionaryPattern {
                        key: key.clone(),
                        value: Box::new(value),
                    })
                }),
        )
    }

    /// A dictionary contains another dictionary with contained keys and
    /// values, and any object whose every value it contains.
    pub fn encompasses(
        &self,
        other: &Pattern,
        mine: &Resolver,
        theirs: &Resolver,
        type_stack: &TypeStack,
    ) -> MatchResult {
        match other {
            Pattern::Dictionary(d) => MatchResult::from_results([
                self.key.encompasses(&d.key, mine, theirs, type_stack),
                self.value.encompasses(&d.value, mine, theirs, type_stack),
            ]),
            Pattern::Object(o) | Pattern::Tabular(o) => {
                MatchResult::from_results(o.declared_keys().map(|(key, pattern)| {
                    let name = without_optionality(key);
                    let key_result = match self.key.parse(name, mine) {
                        Ok(_) => MatchResult::Success,
                        Err(_) => MatchResult::failure(format!(
                            "Key {} is not a valid {}",
                            name,
                            self.key.type_name()
                        )),
                    };
                    MatchResult::from_results([
                        key_result,
                        self.value.encompasses(pattern, mine, theirs, type_stack),
                    ])
                    .breadcrumb(name.to_string())
                }))
            }
            Pattern::Exact(e) => self.matches(&e.value, mine),
            other => MatchResult::failure(format!(
                "Expected {}, got {}",
                self.type_name(),
                other.type_name()
            )),
        }
    }
}
