use std::path::Path;
use std::process;

use pactum_core::{GenerationConfig, MatchResult, Pattern};

use crate::commands::failure_json;
use crate::contract::load_contract;
use crate::{fail, print_json, OutputFormat};

/// The root pattern and every named type declared by both contracts are
/// compared; the newer side must encompass the older one.
pub(crate) fn cmd_compat(
    older: &Path,
    newer: &Path,
    config: GenerationConfig,
    output: OutputFormat,
    quiet: bool,
) {
    let older = match load_contract(older, &config) {
        Ok(l) => l,
        Err(msg) => fail(&msg, output, quiet),
    };
    let newer = match load_contract(newer, &config) {
        Ok(l) => l,
        Err(msg) => fail(&msg, output, quiet),
    };

    let mut checks: Vec<(String, MatchResult)> = vec![(
        "root".to_string(),
        newer
            .root
            .is_compatible_with(&older.root, &newer.resolver, &older.resolver),
    )];
    for name in older.resolver.pattern_names() {
        if newer.resolver.get_pattern(name).is_err() {
            continue;
        }
        let named = Pattern::deferred(name);
        let result = named.is_compatible_with(&named, &newer.resolver, &older.resolver);
        checks.push((named.type_name(), result));
    }

    let broken: Vec<&(String, MatchResult)> =
        checks.iter().filter(|(_, r)| r.is_failure()).collect();
    tracing::debug!(checked = checks.len(), broken = broken.len(), "compatibility");

    if !quiet {
        match output {
            OutputFormat::Json => {
                let failures: Vec<serde_json::Value> = broken
                    .iter()
                    .filter_map(|(name, result)| {
                        result.as_failure().map(|f| {
                            serde_json::json!({ "type": name, "failures": failure_json(f) })
                        })
                    })
                    .collect();
                print_json(&serde_json::json!({
                    "compatible": broken.is_empty(),
                    "checked": checks.len(),
                    "incompatible": failures,
                }));
            }
            OutputFormat::Text => {
                if broken.is_empty() {
                    println!("compatible ({} pattern(s) checked)", checks.len());
                } else {
                    println!("{} incompatible pattern(s):", broken.len());
                    for (name, result) in &broken {
                        println!();
                        println!("{}", name);
                        println!();
                        println!("{}", result.report());
                    }
                }
            }
        }
    }
    if !broken.is_empty() {
        process::exit(1);
    }
}
