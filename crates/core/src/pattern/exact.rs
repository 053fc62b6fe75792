use super::scalar::{negatives_for_family, value_family};
use super::Pattern;
use crate::dsl::parsed_value;
use crate::error::ContractError;
use crate::result::MatchResult;
use crate::value::{parse_decimal, Value};

/// Accepts exactly one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactValuePattern {
    pub value: Value,
}

impl ExactValuePattern {
    pub fn new(value: Value) -> Self {
        ExactValuePattern { value }
    }

    pub fn type_name(&self) -> String {
        self.value.to_string()
    }

    pub fn matches(&self, value: &Value) -> MatchResult {
        if &self.value == value {
            MatchResult::Success
        } else {
            MatchResult::mismatch(self.value.to_string(), value)
        }
    }

    /// Reads `text` as a value of the same kind as the expected one.
    pub fn parse(&self, text: &str) -> Result<Value, ContractError> {
        let value = match &self.value {
            Value::String(_) => Value::String(text.to_string()),
            Value::Number(_) => Value::Number(parse_decimal(text)?),
            _ => parsed_value(text),
        };
        match self.matches(&value) {
            MatchResult::Success => Ok(value),
            MatchResult::Failure(f) => Err(ContractError::parse(text, self.type_name(), f.report())),
        }
    }

    /// Only the same exact value is contained in an exact value.
    pub fn encompasses(&self, other: &Pattern) -> MatchResult {
        match other {
            Pattern::Exact(e) => self.matches(&e.value),
            other => MatchResult::failure(format!(
                "Expected {}, got {}",
                self.type_name(),
                other.type_name()
            )),
        }
    }

    pub fn negative_patterns(&self) -> Vec<Pattern> {
        negatives_for_family(value_family(&self.value))
    }
}
