//! Reading contract documents and JSON inputs from disk.

use std::path::Path;

use pactum_core::{ContractDocument, GenerationConfig, Pattern, Resolver, Row, Value};

/// A contract ready for matching and generation.
pub(crate) struct LoadedContract {
    pub root: Pattern,
    pub resolver: Resolver,
    pub rows: Vec<Row>,
}

pub(crate) fn read_json(path: &Path) -> Result<serde_json::Value, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading '{}': {}", path.display(), e))?;
    serde_json::from_str(&text)
        .map_err(|e| format!("error parsing JSON in '{}': {}", path.display(), e))
}

pub(crate) fn read_value(path: &Path) -> Result<Value, String> {
    Value::from_json(&read_json(path)?).map_err(|e| format!("{}: {}", path.display(), e))
}

pub(crate) fn load_contract(path: &Path, config: &GenerationConfig) -> Result<LoadedContract, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading '{}': {}", path.display(), e))?;
    let document = ContractDocument::from_json_str(&text)
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    let (root, resolver) = document
        .load()
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    let resolver = resolver
        .with_config(config.clone())
        .map_err(|e| e.to_string())?;
    let rows = document
        .rows()
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    tracing::debug!(
        contract = %path.display(),
        types = resolver.pattern_names().count(),
        rows = rows.len(),
        "loaded contract"
    );
    Ok(LoadedContract {
        root,
        resolver,
        rows,
    })
}
