use std::path::Path;
use std::process;

use pactum_core::{GenerationConfig, MatchResult};

use crate::commands::failure_json;
use crate::contract::{load_contract, read_value};
use crate::{fail, print_json, OutputFormat};

pub(crate) fn cmd_match(
    contract: &Path,
    value: &Path,
    mock: bool,
    config: GenerationConfig,
    output: OutputFormat,
    quiet: bool,
) {
    let loaded = match load_contract(contract, &config) {
        Ok(l) => l,
        Err(msg) => fail(&msg, output, quiet),
    };
    let value = match read_value(value) {
        Ok(v) => v,
        Err(msg) => fail(&msg, output, quiet),
    };
    let resolver = if mock {
        loaded.resolver.mock()
    } else {
        loaded.resolver
    };

    let result = loaded.root.matches(&value, &resolver);
    if !quiet {
        match (&result, output) {
            (MatchResult::Success, OutputFormat::Json) => {
                print_json(&serde_json::json!({ "matched": true }));
            }
            (MatchResult::Success, OutputFormat::Text) => {
                println!("matched {}", loaded.root.type_name());
            }
            (MatchResult::Failure(failure), OutputFormat::Json) => {
                print_json(&serde_json::json!({
                    "matched": false,
                    "failures": failure_json(failure),
                }));
            }
            (MatchResult::Failure(failure), OutputFormat::Text) => {
                let count = failure.lines().len();
                println!("{} mismatch(es):", count);
                println!();
                println!("{}", failure.report());
            }
        }
    }
    if result.is_failure() {
        process::exit(1);
    }
}
