//! Core error types

use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CoreError {
    #[error("Failed to read descriptor {path}: {source}")]
    #[diagnostic(code(helmt::descriptor::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse descriptor {origin}: {source}")]
    #[diagnostic(
        code(helmt::descriptor::parse),
        help("the descriptor must be a YAML mapping with chart, version, repository and name keys")
    )]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid descriptor: {}", join_issues(.issues))]
    #[diagnostic(code(helmt::descriptor::validation))]
    Validation { issues: Vec<ValidationIssue> },
}

impl CoreError {
    /// Names of the fields that failed validation (empty for other errors)
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        match self {
            CoreError::Validation { issues } => issues.iter().map(|i| i.field).collect(),
            _ => Vec::new(),
        }
    }
}

/// A single descriptor field that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Descriptor key, as written in YAML
    pub field: &'static str,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, CoreError>;
