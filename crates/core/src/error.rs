//! Contract definition errors.
//!
//! These signal a broken contract (or broken example data), not a data
//! mismatch. Mismatches are reported through [`crate::MatchResult`].

/// All errors raised while constructing patterns, parsing examples or
/// generating values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    /// A deferred reference named a pattern that was never registered.
    #[error("unknown pattern {name}")]
    UnknownPattern { name: String },

    /// Enum literals of more than one scalar type (null excluded).
    #[error("enum values must all be of one type, found {found}")]
    MixedEnumTypes { found: String },

    /// Enum with no literal values.
    #[error("enum must declare at least one value")]
    EmptyEnum,

    /// Text that could not be parsed into a value of the expected shape.
    #[error("\"{text}\" is not a valid {type_name}: {reason}")]
    Parse {
        text: String,
        type_name: String,
        reason: String,
    },

    /// A row example that does not parse against the pattern it feeds.
    #[error("example for {key} is invalid: {reason}")]
    InvalidExample { key: String, reason: String },

    /// Lower bound greater than upper bound on a bounded scalar.
    #[error("{lower_name} {lower} cannot be greater than {upper_name} {upper}")]
    InvalidBounds {
        lower_name: &'static str,
        lower: String,
        upper_name: &'static str,
        upper: String,
    },

    /// Combination cap of zero.
    #[error("max combinations must be > 0, got {0}")]
    InvalidMaxCombinations(usize),

    /// Row columns and values of different lengths, or a missing field.
    #[error("row error: {0}")]
    Row(String),

    /// Malformed parenthesis-DSL token or JSON shape.
    #[error("could not parse pattern \"{text}\": {reason}")]
    Dsl { text: String, reason: String },

    /// Contract document that does not describe a pattern tree.
    #[error("invalid contract document: {0}")]
    Document(String),

    /// Configuration value that cannot be applied.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A mandatory position recursively requires its own type, so no finite
    /// value can be generated.
    #[error("cannot generate {name}: it recursively contains itself")]
    RecursionDetected { name: String },
}

impl ContractError {
    pub fn parse(
        text: impl Into<String>,
        type_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ContractError::Parse {
            text: text.into(),
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub fn dsl(text: impl Into<String>, reason: impl Into<String>) -> Self {
        ContractError::Dsl {
            text: text.into(),
            reason: reason.into(),
        }
    }
}
