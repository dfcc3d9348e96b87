//! Findings produced by the checkers

use serde::Serialize;
use std::fmt;

/// How a finding is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("Warning"),
            Severity::Error => f.write_str("Error"),
        }
    }
}

/// Warnings and errors collected from one or more checks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl CheckReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        match severity {
            Severity::Warning => self.warnings.push(message.into()),
            Severity::Error => self.errors.push(message.into()),
        }
    }

    /// Append another report's findings after this one's
    pub fn merge(&mut self, other: CheckReport) {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }
}

/// Render a headline followed by one indented line per finding:
///
/// ```text
/// Error
///    -> first
///    -> second
/// ```
pub fn build_failure_message<S: AsRef<str>>(headline: &str, findings: &[S]) -> String {
    let mut message = headline.to_string();
    for finding in findings {
        message.push_str("\n   -> ");
        message.push_str(finding.as_ref());
    }
    message
}
