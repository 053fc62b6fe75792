//! Scalar patterns: numbers, booleans, strings and string formats, null.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use super::Pattern;
use crate::error::ContractError;
use crate::generation::random_string;
use crate::result::MatchResult;
use crate::value::{parse_decimal, Value};

/// Number with optional inclusive bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberPattern {
    pub minimum: Option<Decimal>,
    pub maximum: Option<Decimal>,
    pub integer: bool,
}

impl NumberPattern {
    pub fn bounded(
        minimum: Option<Decimal>,
        maximum: Option<Decimal>,
        integer: bool,
    ) -> Result<Self, ContractError> {
        if let (Some(min), Some(max)) = (minimum, maximum) {
            if min > max {
                return Err(ContractError::InvalidBounds {
                    lower_name: "minimum",
                    lower: min.to_string(),
                    upper_name: "maximum",
                    upper: max.to_string(),
                });
            }
            if integer && min.ceil() > max {
                return Err(ContractError::InvalidBounds {
                    lower_name: "integer minimum",
                    lower: min.ceil().to_string(),
                    upper_name: "maximum",
                    upper: max.to_string(),
                });
            }
        }
        Ok(NumberPattern {
            minimum,
            maximum,
            integer,
        })
    }

    fn check(&self, d: &Decimal) -> MatchResult {
        if self.integer && !d.fract().is_zero() {
            return MatchResult::mismatch("integer", d.normalize());
        }
        if let Some(min) = self.minimum {
            if *d < min {
                return MatchResult::mismatch(format!("number >= {}", min), d.normalize());
            }
        }
        if let Some(max) = self.maximum {
            if *d > max {
                return MatchResult::mismatch(format!("number <= {}", max), d.normalize());
            }
        }
        MatchResult::Success
    }

    fn generate(&self) -> Decimal {
        let span = Decimal::from(1000);
        let (lo, hi) = match (self.minimum, self.maximum) {
            (Some(a), Some(b)) => (a, b),
            (Some(a), None) => (a, a.checked_add(span).unwrap_or(a)),
            (None, Some(b)) => (b.checked_sub(span).unwrap_or(b), b),
            (None, None) => (Decimal::ONE, span),
        };
        let (lo_int, hi_int) = (lo.ceil(), hi.floor());
        match (lo_int.to_i64(), hi_int.to_i64()) {
            (Some(a), Some(b)) if a <= b => Decimal::from(rand::thread_rng().gen_range(a..=b)),
            _ if self.integer => {
                if self.maximum.map_or(true, |max| lo_int <= max) {
                    lo_int
                } else {
                    hi_int
                }
            }
            _ => lo,
        }
    }

    /// Range containment: every number `other` accepts, `self` accepts.
    fn encompasses(&self, other: &NumberPattern) -> MatchResult {
        if self.integer && !other.integer {
            return MatchResult::failure("Expected integer, but the other side allows decimals");
        }
        if let Some(min) = self.minimum {
            match other.minimum {
                Some(other_min) if other_min >= min => {}
                _ => {
                    return MatchResult::failure(format!(
                        "Expected minimum {}, but the other side allows smaller numbers",
                        min
                    ))
                }
            }
        }
        if let Some(max) = self.maximum {
            match other.maximum {
                Some(other_max) if other_max <= max => {}
                _ => {
                    return MatchResult::failure(format!(
                        "Expected maximum {}, but the other side allows larger numbers",
                        max
                    ))
                }
            }
        }
        MatchResult::Success
    }
}

/// String with optional length bounds (in characters).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringPattern {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl StringPattern {
    pub fn bounded(min_length: Option<usize>, max_length: Option<usize>) -> Result<Self, ContractError> {
        if let (Some(min), Some(max)) = (min_length, max_length) {
            if min > max {
                return Err(ContractError::InvalidBounds {
                    lower_name: "minLength",
                    lower: min.to_string(),
                    upper_name: "maxLength",
                    upper: max.to_string(),
                });
            }
        }
        Ok(StringPattern {
            min_length,
            max_length,
        })
    }

    fn is_unbounded(&self) -> bool {
        self.min_length.unwrap_or(0) == 0 && self.max_length.is_none()
    }

    fn check(&self, s: &str) -> MatchResult {
        let len = s.chars().count();
        if let Some(min) = self.min_length {
            if len < min {
                return MatchResult::mismatch(
                    format!("string with minLength {}", min),
                    format!("\"{}\"", s),
                );
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return MatchResult::mismatch(
                    format!("string with maxLength {}", max),
                    format!("\"{}\"", s),
                );
            }
        }
        MatchResult::Success
    }

    fn generate(&self) -> String {
        let mut len = 5;
        if let Some(max) = self.max_length {
            len = len.min(max);
        }
        if let Some(min) = self.min_length {
            len = len.max(min);
        }
        random_string(len)
    }

    fn encompasses(&self, other: &StringPattern) -> MatchResult {
        let min = self.min_length.unwrap_or(0);
        if other.min_length.unwrap_or(0) < min {
            return MatchResult::failure(format!(
                "Expected minLength {}, but the other side allows shorter strings",
                min
            ));
        }
        if let Some(max) = self.max_length {
            match other.max_length {
                Some(other_max) if other_max <= max => {}
                _ => {
                    return MatchResult::failure(format!(
                        "Expected maxLength {}, but the other side allows longer strings",
                        max
                    ))
                }
            }
        }
        MatchResult::Success
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarPattern {
    Number(NumberPattern),
    Boolean,
    String(StringPattern),
    Date,
    DateTime,
    Uuid,
    Email,
    Base64,
    Binary,
    EmptyString,
    Null,
}

impl ScalarPattern {
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarPattern::Number(_) => "number",
            ScalarPattern::Boolean => "boolean",
            ScalarPattern::String(_) => "string",
            ScalarPattern::Date => "date",
            ScalarPattern::DateTime => "datetime",
            ScalarPattern::Uuid => "uuid",
            ScalarPattern::Email => "email",
            ScalarPattern::Base64 => "base64",
            ScalarPattern::Binary => "binary",
            ScalarPattern::EmptyString => "empty",
            ScalarPattern::Null => "null",
        }
    }

    /// Wire-level family used by the negative generators: every
    /// string-encoded format counts as "string".
    pub fn family(&self) -> &'static str {
        match self {
            ScalarPattern::Number(_) => "number",
            ScalarPattern::Boolean => "boolean",
            ScalarPattern::Null => "null",
            _ => "string",
        }
    }

    pub fn matches(&self, value: &Value) -> MatchResult {
        match (self, value) {
            (ScalarPattern::Number(n), Value::Number(d)) => n.check(d),
            (ScalarPattern::Boolean, Value::Boolean(_)) => MatchResult::Success,
            (ScalarPattern::String(s), Value::String(text)) => s.check(text),
            (ScalarPattern::Null, Value::Null) => MatchResult::Success,
            (ScalarPattern::EmptyString, Value::String(text)) if text.is_empty() => {
                MatchResult::Success
            }
            (ScalarPattern::Binary, Value::String(_)) => MatchResult::Success,
            (format, Value::String(text)) if format.is_string_format() => {
                if format.accepts_text(text) {
                    MatchResult::Success
                } else {
                    MatchResult::mismatch(format!("{} string", format.type_name()), value)
                }
            }
            _ => MatchResult::mismatch(self.type_name(), value),
        }
    }

    fn is_string_format(&self) -> bool {
        matches!(
            self,
            ScalarPattern::Date
                | ScalarPattern::DateTime
                | ScalarPattern::Uuid
                | ScalarPattern::Email
                | ScalarPattern::Base64
        )
    }

    fn accepts_text(&self, text: &str) -> bool {
        match self {
            ScalarPattern::Date => Date::parse(text, format_description!("[year]-[month]-[day]")).is_ok(),
            ScalarPattern::DateTime => OffsetDateTime::parse(text, &Rfc3339).is_ok(),
            ScalarPattern::Uuid => uuid::Uuid::parse_str(text).is_ok(),
            ScalarPattern::Email => is_email(text),
            ScalarPattern::Base64 => BASE64.decode(text).is_ok(),
            _ => false,
        }
    }

    pub fn generate(&self) -> Value {
        let mut rng = rand::thread_rng();
        match self {
            ScalarPattern::Number(n) => Value::Number(n.generate()),
            ScalarPattern::Boolean => Value::Boolean(rng.gen_bool(0.5)),
            ScalarPattern::String(s) => Value::String(s.generate()),
            ScalarPattern::Date => {
                let today = OffsetDateTime::now_utc().date();
                Value::String(
                    today
                        .format(format_description!("[year]-[month]-[day]"))
                        .unwrap_or_else(|_| "2020-01-01".to_string()),
                )
            }
            ScalarPattern::DateTime => Value::String(
                OffsetDateTime::now_utc()
                    .replace_nanosecond(0)
                    .unwrap_or_else(|_| OffsetDateTime::now_utc())
                    .format(&Rfc3339)
                    .unwrap_or_else(|_| "2020-01-01T00:00:00Z".to_string()),
            ),
            ScalarPattern::Uuid => Value::String(uuid::Uuid::new_v4().to_string()),
            ScalarPattern::Email => Value::String(format!(
                "{}@example.com",
                random_string(8).to_lowercase()
            )),
            ScalarPattern::Base64 => {
                let bytes: Vec<u8> = (0..9).map(|_| rng.gen()).collect();
                Value::String(BASE64.encode(bytes))
            }
            ScalarPattern::Binary => Value::String(random_string(10)),
            ScalarPattern::EmptyString => Value::String(String::new()),
            ScalarPattern::Null => Value::Null,
        }
    }

    pub fn parse(&self, text: &str) -> Result<Value, ContractError> {
        let value = match self {
            ScalarPattern::Number(_) => Value::Number(parse_decimal(text)?),
            ScalarPattern::Boolean => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Value::Boolean(true),
                "false" => Value::Boolean(false),
                _ => return Err(ContractError::parse(text, "boolean", "expected true or false")),
            },
            ScalarPattern::Null => match text.trim() {
                "" | "null" | "(null)" => Value::Null,
                _ => return Err(ContractError::parse(text, "null", "expected null")),
            },
            _ => Value::String(text.to_string()),
        };
        match self.matches(&value) {
            MatchResult::Success => Ok(value),
            MatchResult::Failure(f) => Err(ContractError::parse(text, self.type_name(), f.report())),
        }
    }

    /// Containment against any other pattern on the smaller side. Unions and
    /// deferred references have already been unwrapped by the caller.
    pub fn encompasses(&self, other: &Pattern) -> MatchResult {
        let other_scalar = match other {
            Pattern::Scalar(s) => s,
            Pattern::Exact(e) => return self.matches(&e.value),
            Pattern::Anything => {
                return MatchResult::failure(format!(
                    "Expected {}, but the other side accepts anything",
                    self.type_name()
                ))
            }
            other => {
                return MatchResult::failure(format!(
                    "Expected {}, got {}",
                    self.type_name(),
                    other.type_name()
                ))
            }
        };
        match (self, other_scalar) {
            (ScalarPattern::Number(a), ScalarPattern::Number(b)) => a.encompasses(b),
            (ScalarPattern::String(a), ScalarPattern::String(b)) => a.encompasses(b),
            (ScalarPattern::String(a), ScalarPattern::EmptyString) if a.min_length.unwrap_or(0) == 0 => {
                MatchResult::Success
            }
            (ScalarPattern::String(a), b) if b.family() == "string" && a.is_unbounded() => {
                MatchResult::Success
            }
            (ScalarPattern::Binary, b) if b.family() == "string" => MatchResult::Success,
            (a, b) if std::mem::discriminant(a) == std::mem::discriminant(b) => MatchResult::Success,
            (a, b) => MatchResult::failure(format!(
                "Expected {}, got {}",
                a.type_name(),
                b.type_name()
            )),
        }
    }

    /// The other scalar families, in the order null, number, boolean, string.
    pub fn negative_patterns(&self) -> Vec<Pattern> {
        negatives_for_family(self.family())
    }
}

/// Wrong-type substitutes for a value family; never includes the family
/// itself.
pub(crate) fn negatives_for_family(family: &str) -> Vec<Pattern> {
    match family {
        "number" => vec![Pattern::null(), Pattern::boolean(), Pattern::string()],
        "boolean" => vec![Pattern::null(), Pattern::number(), Pattern::string()],
        "string" => vec![Pattern::null(), Pattern::number(), Pattern::boolean()],
        _ => Vec::new(),
    }
}

/// Family of a runtime value, for exact values and enum literals.
pub(crate) fn value_family(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Boolean(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        _ => "structure",
    }
}

fn is_email(text: &str) -> bool {
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !text.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .map(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
            .unwrap_or(false)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
