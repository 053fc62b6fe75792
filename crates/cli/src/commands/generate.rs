use std::path::Path;

use pactum_core::GenerationConfig;

use crate::contract::load_contract;
use crate::{fail, print_json, OutputFormat};

pub(crate) fn cmd_generate(
    contract: &Path,
    count: usize,
    config: GenerationConfig,
    output: OutputFormat,
    quiet: bool,
) {
    let loaded = match load_contract(contract, &config) {
        Ok(l) => l,
        Err(msg) => fail(&msg, output, quiet),
    };

    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        match loaded.root.generate_valid(&loaded.resolver) {
            Ok(v) => values.push(v.to_json()),
            Err(e) => fail(&format!("generation error: {}", e), output, quiet),
        }
    }

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => print_json(&serde_json::Value::Array(values)),
        OutputFormat::Text => {
            for value in &values {
                print_json(value);
            }
        }
    }
}
