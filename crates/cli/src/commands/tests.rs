use std::path::Path;

use pactum_core::{GenerationConfig, PatternStream, Row};

use crate::contract::{load_contract, read_value};
use crate::{fail, print_json, OutputFormat};

/// One generated test input.
struct TestInput {
    row: String,
    pattern: String,
    value: serde_json::Value,
}

pub(crate) fn cmd_tests(
    contract: &Path,
    row: Option<&Path>,
    negative: bool,
    limit: usize,
    config: GenerationConfig,
    output: OutputFormat,
    quiet: bool,
) {
    let loaded = match load_contract(contract, &config) {
        Ok(l) => l,
        Err(msg) => fail(&msg, output, quiet),
    };

    let rows = match row {
        Some(path) => match read_value(path) {
            Ok(example) => vec![Row::from_json_example(example).named(path.display().to_string())],
            Err(msg) => fail(&msg, output, quiet),
        },
        None if loaded.rows.is_empty() => vec![Row::default().named("no example")],
        None => loaded.rows,
    };

    let mut inputs = Vec::new();
    for row in &rows {
        let stream: PatternStream = if negative {
            loaded.root.negative_based_on(row, &loaded.resolver)
        } else {
            match loaded.root.new_based_on(row, &loaded.resolver) {
                Ok(s) => s,
                Err(e) => fail(&format!("{}: {}", row.name, e), output, quiet),
            }
        };
        let before = inputs.len();
        for pattern in stream.take(limit) {
            match pattern.generate(&loaded.resolver) {
                Ok(value) => inputs.push(TestInput {
                    row: row.name.clone(),
                    pattern: pattern.type_name(),
                    value: value.to_json(),
                }),
                Err(e) => fail(&format!("{}: generation error: {}", row.name, e), output, quiet),
            }
        }
        tracing::debug!(row = %row.name, inputs = inputs.len() - before, negative, "generated test inputs");
    }

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = inputs
                .iter()
                .map(|input| {
                    serde_json::json!({
                        "row": input.row,
                        "pattern": input.pattern,
                        "value": input.value,
                    })
                })
                .collect();
            print_json(&serde_json::Value::Array(entries));
        }
        OutputFormat::Text => {
            let kind = if negative { "negative" } else { "positive" };
            println!("{} {} test input(s)", inputs.len(), kind);
            for (i, input) in inputs.iter().enumerate() {
                println!();
                println!("[{}] {}", i + 1, input.row);
                print_json(&input.value);
            }
        }
    }
}
