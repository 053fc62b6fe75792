//! Generation settings shared by a whole match/generation call tree.

use serde::Deserialize;

use crate::error::ContractError;
use crate::negative::NegativePolicy;

/// Default cap on combinations emitted per generated structure.
pub const DEFAULT_MAX_COMBINATIONS: usize = 64;

pub const ENV_MAX_COMBINATIONS: &str = "PACTUM_MAX_TEST_REQUEST_COMBINATIONS";
pub const ENV_NEGATIVE_POLICY: &str = "PACTUM_NEGATIVE_POLICY";

/// Whether `generate` emits optional object keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionalKeyGeneration {
    #[default]
    Random,
    All,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_combinations: usize,
    pub negative_policy: NegativePolicy,
    pub optional_keys: OptionalKeyGeneration,
    pub mock_mode: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            max_combinations: DEFAULT_MAX_COMBINATIONS,
            negative_policy: NegativePolicy::default(),
            optional_keys: OptionalKeyGeneration::default(),
            mock_mode: false,
        }
    }
}

impl GenerationConfig {
    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Result<Self, ContractError> {
        GenerationConfig::default().with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Overlay values supplied by `lookup` (normally `std::env::var`).
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ContractError> {
        if let Some(raw) = lookup(ENV_MAX_COMBINATIONS) {
            self.max_combinations = raw.trim().parse().map_err(|_| {
                ContractError::Config(format!(
                    "{} must be a positive integer, got \"{}\"",
                    ENV_MAX_COMBINATIONS, raw
                ))
            })?;
        }
        if let Some(raw) = lookup(ENV_NEGATIVE_POLICY) {
            self.negative_policy = raw.parse()?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ContractError> {
        if self.max_combinations == 0 {
            return Err(ContractError::InvalidMaxCombinations(0));
        }
        Ok(())
    }
}
