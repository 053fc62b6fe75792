//! Match and compatibility outcomes.
//!
//! A failure is a tree: structural patterns collect every child failure
//! under a breadcrumb (key name, array index or union branch) so a report
//! shows all violations in one pass.

use serde::Serialize;

/// Outcome of `matches` or `encompasses`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Success,
    Failure(Failure),
}

/// A node in the failure tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub message: String,
    /// Empty when this node does not add a path segment.
    pub breadcrumb: String,
    pub causes: Vec<Failure>,
}

/// One rendered report entry: the full breadcrumb path and its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureLine {
    pub path: String,
    pub message: String,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Failure {
            message: message.into(),
            breadcrumb: String::new(),
            causes: Vec::new(),
        }
    }

    /// Flatten the tree into one entry per leaf, in tree order.
    pub fn lines(&self) -> Vec<FailureLine> {
        let mut out = Vec::new();
        self.collect_lines("", &mut out);
        out
    }

    fn collect_lines(&self, prefix: &str, out: &mut Vec<FailureLine>) {
        let path = join_breadcrumbs(prefix, &self.breadcrumb);
        if self.causes.is_empty() {
            out.push(FailureLine {
                path,
                message: self.message.clone(),
            });
            return;
        }
        if !self.message.is_empty() {
            out.push(FailureLine {
                path: path.clone(),
                message: self.message.clone(),
            });
        }
        for cause in &self.causes {
            cause.collect_lines(&path, out);
        }
    }

    /// Plain-text report: `>> path` followed by the indented message.
    pub fn report(&self) -> String {
        self.lines()
            .iter()
            .map(|line| {
                if line.path.is_empty() {
                    line.message.clone()
                } else {
                    format!(">> {}\n\n   {}", line.path, line.message)
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn join_breadcrumbs(prefix: &str, crumb: &str) -> String {
    if crumb.is_empty() {
        return prefix.to_string();
    }
    if prefix.is_empty() {
        return crumb.to_string();
    }
    if crumb.starts_with('[') {
        format!("{}{}", prefix, crumb)
    } else {
        format!("{}.{}", prefix, crumb)
    }
}

impl MatchResult {
    pub fn failure(message: impl Into<String>) -> Self {
        MatchResult::Failure(Failure::new(message))
    }

    /// Mismatch between an expected type name and an actual value.
    pub fn mismatch(expected: impl AsRef<str>, actual: impl std::fmt::Display) -> Self {
        MatchResult::failure(format!(
            "Expected {}, actual was {}",
            expected.as_ref(),
            actual
        ))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MatchResult::Success)
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Nest a failure under a path segment. Success passes through.
    pub fn breadcrumb(self, crumb: impl Into<String>) -> Self {
        match self {
            MatchResult::Success => MatchResult::Success,
            MatchResult::Failure(f) => MatchResult::Failure(Failure {
                message: String::new(),
                breadcrumb: crumb.into(),
                causes: vec![f],
            }),
        }
    }

    /// Aggregate independent checks: Success only if all succeed, otherwise
    /// a single failure whose causes are every individual failure.
    pub fn from_results(results: impl IntoIterator<Item = MatchResult>) -> Self {
        let causes: Vec<Failure> = results
            .into_iter()
            .filter_map(|r| match r {
                MatchResult::Success => None,
                MatchResult::Failure(f) => Some(f),
            })
            .collect();
        if causes.is_empty() {
            MatchResult::Success
        } else {
            MatchResult::Failure(Failure {
                message: String::new(),
                breadcrumb: String::new(),
                causes,
            })
        }
    }

    /// Success, or the failure's report text.
    pub fn report(&self) -> String {
        match self {
            MatchResult::Success => String::new(),
            MatchResult::Failure(f) => f.report(),
        }
    }

    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            MatchResult::Success => None,
            MatchResult::Failure(f) => Some(f),
        }
    }
}
