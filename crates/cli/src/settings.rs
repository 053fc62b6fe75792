//! Generation settings: a TOML file's `[generation]` table, then the
//! environment.
//!
//! ```toml
//! [generation]
//! max_combinations = 32
//! negative_policy = "non-stringly"
//! optional_keys = "all"
//! ```

use std::path::Path;

use pactum_core::GenerationConfig;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    #[serde(default)]
    generation: GenerationConfig,
}

pub(crate) fn load(path: Option<&Path>) -> Result<GenerationConfig, String> {
    let base = match path {
        None => GenerationConfig::default(),
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("error reading '{}': {}", path.display(), e))?;
            parse(&text).map_err(|e| format!("error in '{}': {}", path.display(), e))?
        }
    };
    base.with_env_overrides(|name| std::env::var(name).ok())
        .map_err(|e| e.to_string())
}

fn parse(text: &str) -> Result<GenerationConfig, String> {
    let file: SettingsFile = toml::from_str(text).map_err(|e| e.to_string())?;
    file.generation.validate().map_err(|e| e.to_string())?;
    Ok(file.generation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactum_core::{NegativePolicy, OptionalKeyGeneration};

    #[test]
    fn generation_table_is_read() {
        let config = parse(
            r#"
            [generation]
            max_combinations = 8
            negative_policy = "non-stringly"
            optional_keys = "none"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_combinations, 8);
        assert_eq!(config.negative_policy, NegativePolicy::NonStringly);
        assert_eq!(config.optional_keys, OptionalKeyGeneration::None);
        assert!(!config.mock_mode);
    }

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse("").unwrap(), GenerationConfig::default());
    }

    #[test]
    fn zero_cap_is_rejected() {
        let err = parse("[generation]\nmax_combinations = 0\n").unwrap_err();
        assert!(err.contains("must be > 0"));
    }

    #[test]
    fn unknown_tables_are_rejected() {
        assert!(parse("[server]\nport = 1\n").is_err());
    }
}
