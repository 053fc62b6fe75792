//! pactum-core: the pattern engine behind contract testing.
//!
//! A contract describes request and response shapes as [`Pattern`]s. The
//! engine validates runtime [`Value`]s against them, checks that a newer
//! contract stays backward compatible with an older one, and enumerates
//! positive and negative test inputs.
//!
//! # Public API
//!
//! - [`Pattern`] -- the closed set of pattern variants and their operations
//! - [`Resolver`] -- named-pattern registry, facts and generation mode
//! - [`Row`] -- example data that specializes generated tests
//! - [`MatchResult`] / [`Failure`] -- match outcomes with breadcrumb paths
//! - [`CombinationSpec`] -- bounded cross-key combination of test variants
//! - [`NegativePolicy`] -- which wrong-type substitutes negative tests use
//! - [`ContractDocument`] -- JSON contract loader
//! - [`parsed_pattern`] / [`parsed_value`] -- the parenthesis DSL

pub mod combination;
pub mod config;
pub mod document;
pub mod dsl;
pub mod error;
pub mod generation;
pub mod negative;
pub mod pattern;
pub mod resolver;
pub mod result;
pub mod row;
pub mod value;

// ── Convenience re-exports: key types ────────────────────────────────

pub use combination::{CombinationSpec, Combinations};
pub use config::{GenerationConfig, OptionalKeyGeneration};
pub use document::ContractDocument;
pub use error::ContractError;
pub use generation::PatternStream;
pub use negative::{NegativePolicy, PatternMapStream};
pub use pattern::{
    AnyPattern, ArrayPattern, CsvPattern, DeferredPattern, DictionaryPattern, EnumPattern,
    ExactValuePattern, ListPattern, LookupRowPattern, NumberPattern, ObjectPattern, Occurrence,
    Pattern, PatternInString, RestPattern, ScalarPattern, StringPattern, XmlPattern,
};
pub use resolver::{MismatchMessages, Resolver, TypeStack};
pub use result::{Failure, FailureLine, MatchResult};
pub use row::Row;
pub use value::{Value, XmlNode};

// ── Convenience re-exports: DSL entry points ─────────────────────────

pub use dsl::{parsed_pattern, parsed_value, pattern_from_json};
