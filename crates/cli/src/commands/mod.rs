pub(crate) mod compat;
pub(crate) mod generate;
pub(crate) mod matching;
pub(crate) mod tests;

use pactum_core::Failure;

/// One `{path, message}` entry per failure leaf.
pub(crate) fn failure_json(failure: &Failure) -> serde_json::Value {
    serde_json::to_value(failure.lines()).unwrap_or_default()
}
