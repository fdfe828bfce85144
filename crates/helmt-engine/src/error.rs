//! Engine error types

use miette::Diagnostic;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while driving helm and managing rendered output
#[derive(Error, Debug, Diagnostic)]
pub enum EngineError {
    #[error("`{command}` exited with {}{}", describe_status(*.status), describe_stderr(.stderr))]
    #[diagnostic(code(helmt::tool::failed))]
    ExternalTool {
        /// Command line, with secrets masked
        command: String,
        /// Exit code, `None` when the process was killed by a signal
        status: Option<i32>,
        /// Captured stderr, with secrets masked
        stderr: String,
    },

    #[error("Failed to run {program}: {source}")]
    #[diagnostic(
        code(helmt::tool::spawn),
        help("make sure helm is installed and on PATH, or point --helm at the binary")
    )]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error(
        "Unexpected content in temporary directory {}: expected exactly one chart archive, found {}",
        dir.display(),
        describe_entries(.entries)
    )]
    #[diagnostic(
        code(helmt::fetch::artifact),
        help("the directory was kept for inspection")
    )]
    UnexpectedArtifact { dir: PathBuf, entries: Vec<String> },

    #[error("Failed to {action} {}: {source}", path.display())]
    #[diagnostic(code(helmt::io))]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EngineError {
    /// Build a mapper from `io::Error` for use with `map_err`
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| EngineError::Io {
            action,
            path,
            source,
        }
    }
}

fn describe_status(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {}", code),
        None => "no exit status (terminated by signal)".to_string(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

fn describe_entries(entries: &[String]) -> String {
    if entries.is_empty() {
        "nothing".to_string()
    } else {
        format!("{} entries ({})", entries.len(), entries.join(", "))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
