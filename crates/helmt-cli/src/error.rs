//! CLI error type with exit code handling
//!
//! Wraps the library errors unchanged (their diagnostics are shown as-is)
//! and maps each failure kind to an exit code.

use helmt_core::CoreError;
use helmt_engine::{EngineError, PipelineError, StageError};
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Descriptor(#[from] CoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Pipeline(err) => match &err.source {
                StageError::Descriptor(e) => descriptor_exit_code(e),
                StageError::Engine(e) => engine_exit_code(e),
            },
            CliError::Descriptor(e) => descriptor_exit_code(e),
            CliError::Engine(e) => engine_exit_code(e),
        }
    }
}

fn descriptor_exit_code(err: &CoreError) -> i32 {
    match err {
        CoreError::Io { .. } => exit_codes::IO_ERROR,
        CoreError::Parse { .. } | CoreError::Validation { .. } => exit_codes::DESCRIPTOR_ERROR,
    }
}

fn engine_exit_code(err: &EngineError) -> i32 {
    match err {
        EngineError::ExternalTool { .. } | EngineError::Spawn { .. } => exit_codes::TOOL_ERROR,
        EngineError::UnexpectedArtifact { .. } => exit_codes::ARTIFACT_ERROR,
        EngineError::Io { .. } => exit_codes::IO_ERROR,
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
