//! The context threaded through every pattern operation.
//!
//! A `Resolver` owns the named-pattern registry, the facts used when
//! generating optional keys, and the generation mode flags. Mode switches
//! return modified copies; the registry and facts are shared behind `Arc`
//! so copies are cheap and sibling calls never observe each other's state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::config::{GenerationConfig, OptionalKeyGeneration};
use crate::dsl::with_pattern_delimiters;
use crate::error::ContractError;
use crate::negative::NegativePolicy;
use crate::pattern::Pattern;
use crate::value::Value;

/// Pairs of (bigger, smaller) named types already under comparison.
pub type TypeStack = BTreeSet<(String, String)>;

/// Phrasing of key-level mismatch messages, depending on which side of the
/// comparison is the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MismatchMessages {
    #[default]
    Contract,
    Stub,
}

impl MismatchMessages {
    pub fn unexpected_key(&self, key: &str) -> String {
        match self {
            MismatchMessages::Contract => format!("Key named {} was unexpected", key),
            MismatchMessages::Stub => {
                format!("Key named {} in the stub was not in the contract", key)
            }
        }
    }

    pub fn missing_key(&self, key: &str) -> String {
        match self {
            MismatchMessages::Contract => format!("Expected key named {} was missing", key),
            MismatchMessages::Stub => {
                format!("Key named {} in the contract was not found in the stub", key)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    patterns: Arc<BTreeMap<String, Pattern>>,
    facts: Arc<BTreeMap<String, Value>>,
    is_negative: bool,
    config: GenerationConfig,
    mismatch_messages: MismatchMessages,
    cycle_stack: Vec<String>,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver::default()
    }

    // ── Construction ─────────────────────────────

    /// Register a named pattern. Names are stored in `(Name)` form.
    pub fn register(&mut self, name: &str, pattern: Pattern) {
        Arc::make_mut(&mut self.patterns).insert(with_pattern_delimiters(name), pattern);
    }

    pub fn with_pattern(mut self, name: &str, pattern: Pattern) -> Self {
        self.register(name, pattern);
        self
    }

    /// Copy with an entirely different registry.
    pub fn with_patterns(&self, patterns: BTreeMap<String, Pattern>) -> Self {
        let normalized = patterns
            .into_iter()
            .map(|(k, v)| (with_pattern_delimiters(&k), v))
            .collect();
        Resolver {
            patterns: Arc::new(normalized),
            ..self.clone()
        }
    }

    pub fn with_facts(&self, facts: BTreeMap<String, Value>) -> Self {
        Resolver {
            facts: Arc::new(facts),
            ..self.clone()
        }
    }

    pub fn with_fact(mut self, name: &str, value: Value) -> Self {
        Arc::make_mut(&mut self.facts).insert(name.to_string(), value);
        self
    }

    pub fn with_config(&self, config: GenerationConfig) -> Result<Self, ContractError> {
        config.validate()?;
        Ok(Resolver {
            config,
            ..self.clone()
        })
    }

    pub fn with_max_combinations(&self, max: usize) -> Result<Self, ContractError> {
        self.with_config(GenerationConfig {
            max_combinations: max,
            ..self.config.clone()
        })
    }

    pub fn with_negative_policy(&self, policy: NegativePolicy) -> Self {
        let mut copy = self.clone();
        copy.config.negative_policy = policy;
        copy
    }

    pub fn with_optional_keys(&self, optional_keys: OptionalKeyGeneration) -> Self {
        let mut copy = self.clone();
        copy.config.optional_keys = optional_keys;
        copy
    }

    pub fn with_mismatch_messages(&self, messages: MismatchMessages) -> Self {
        Resolver {
            mismatch_messages: messages,
            ..self.clone()
        }
    }

    /// Copy used for a negative-generation subtree.
    pub fn negative(&self) -> Self {
        Resolver {
            is_negative: true,
            ..self.clone()
        }
    }

    /// Copy that accepts DSL tokens in place of concrete values.
    pub fn mock(&self) -> Self {
        let mut copy = self.clone();
        copy.config.mock_mode = true;
        copy
    }

    // ── Accessors ────────────────────────────────

    pub fn is_negative(&self) -> bool {
        self.is_negative
    }

    pub fn is_mock_mode(&self) -> bool {
        self.config.mock_mode
    }

    pub fn max_combinations(&self) -> usize {
        self.config.max_combinations
    }

    pub fn negative_policy(&self) -> NegativePolicy {
        self.config.negative_policy
    }

    pub fn optional_keys(&self) -> OptionalKeyGeneration {
        self.config.optional_keys
    }

    pub fn mismatch_messages(&self) -> MismatchMessages {
        self.mismatch_messages
    }

    pub fn fact(&self, name: &str) -> Option<&Value> {
        self.facts.get(name)
    }

    pub fn pattern_names(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }

    // ── Lookup ───────────────────────────────────

    pub fn get_pattern(&self, name: &str) -> Result<&Pattern, ContractError> {
        let key = with_pattern_delimiters(name);
        self.patterns
            .get(&key)
            .ok_or(ContractError::UnknownPattern { name: key })
    }

    /// Follow a chain of named aliases (`(A)` -> `(B)` -> concrete) to the
    /// first pattern that is not itself a deferred reference.
    pub fn resolve_deferred(&self, name: &str) -> Result<&Pattern, ContractError> {
        let mut seen: Vec<String> = Vec::new();
        let mut current = with_pattern_delimiters(name);
        loop {
            if seen.contains(&current) {
                tracing::trace!(name = %current, "alias cycle while resolving");
                return Err(ContractError::RecursionDetected { name: current });
            }
            let pattern = self.get_pattern(&current)?;
            match pattern {
                Pattern::Deferred(next) => {
                    seen.push(current);
                    current = next.name.clone();
                }
                other => return Ok(other),
            }
        }
    }

    /// Copy that records `name` as being generated. Re-entering a name
    /// already on the stack is reported as `RecursionDetected`.
    pub fn with_cycle_guard(&self, name: &str) -> Result<Self, ContractError> {
        let key = with_pattern_delimiters(name);
        if self.cycle_stack.contains(&key) {
            tracing::trace!(name = %key, "recursive type reached during generation");
            return Err(ContractError::RecursionDetected { name: key });
        }
        let mut copy = self.clone();
        copy.cycle_stack.push(key);
        Ok(copy)
    }

    pub fn is_generating(&self, name: &str) -> bool {
        self.cycle_stack.contains(&with_pattern_delimiters(name))
    }
}
