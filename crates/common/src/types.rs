//! Core types for the Transaction Insights suite

use serde::{Deserialize, Serialize};

/// Identity of one logical test invocation: a test method name plus the
/// literal argument tuple it was invoked with.
///
/// Retry state and report entries are keyed by this. Two invocations with
/// the same method and different arguments are different tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestIdentity {
    method: String,
    #[serde(default)]
    args: Vec<String>,
}

impl TestIdentity {
    /// Identity for a test method invoked without arguments
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            args: Vec::new(),
        }
    }

    /// Identity for a data-driven invocation
    pub fn with_args<I, S>(method: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method: method.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Human-readable heading used for the report entry.
    ///
    /// `dashboard_loads` becomes "Dashboard loads", `executeTestCase` becomes
    /// "Execute Test Case"; a non-empty argument tuple is appended in brackets.
    pub fn display_name(&self) -> String {
        let mut name = String::with_capacity(self.method.len() + 8);
        for c in self.method.chars() {
            if c == '_' {
                if !name.ends_with(' ') && !name.is_empty() {
                    name.push(' ');
                }
            } else if c.is_uppercase() && !name.is_empty() && !name.ends_with(' ') {
                name.push(' ');
                name.push(c);
            } else {
                name.push(c);
            }
        }

        let mut chars = name.trim().chars();
        let mut heading = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };

        if !self.args.is_empty() {
            heading.push_str(&format!(" [{}]", self.args.join(", ")));
        }
        heading
    }
}

impl std::fmt::Display for TestIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.method, self.args.join(", "))
    }
}

/// Severity of a report event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Pass,
    Fail,
    Warning,
    Skip,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Pass => write!(f, "PASS"),
            Severity::Fail => write!(f, "FAIL"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Skip => write!(f, "SKIP"),
        }
    }
}

/// Outcome of one attempt, derived from the raw result and the retry state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    FailedRetrying,
    FailedTerminal,
    Skipped,
}

impl TestOutcome {
    /// Whether no further attempt follows this outcome
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TestOutcome::FailedRetrying)
    }
}

impl std::fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestOutcome::Passed => write!(f, "passed"),
            TestOutcome::FailedRetrying => write!(f, "failed (retrying)"),
            TestOutcome::FailedTerminal => write!(f, "failed"),
            TestOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// Numeric link columns in the transaction table that open a details modal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Successful,
    Errored,
}

impl std::fmt::Display for LinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkKind::Successful => write!(f, "Successful"),
            LinkKind::Errored => write!(f, "Errored"),
        }
    }
}
