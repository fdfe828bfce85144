//! helmt engine - renders a Helm chart into plain manifests
//!
//! This crate drives the external `helm` binary through a single, redacting
//! command runner:
//! - `runner`: the `CommandRunner` chokepoint, echoing every command with secrets masked
//! - `helm`: version probe, chart fetch into a private temporary directory, `helm template`
//! - `output`: removal of a previous render (`--clean`)
//! - `kustomize`: a deterministic `kustomization.yaml` listing the rendered files
//! - `pipeline`: the stages wired together, each one replaceable
//!
//! ## Example
//!
//! ```rust,no_run
//! use helmt_engine::{ExecConfig, Pipeline, PipelineOptions, ProcessRunner};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = Arc::new(ProcessRunner::new(ExecConfig::default()));
//! let pipeline = Pipeline::builder(runner).build();
//!
//! let report = pipeline.run(Path::new("helm-chart.yaml"), &PipelineOptions::default())?;
//! println!("rendered into {}", report.rendered_dir.display());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod helm;
pub mod kustomize;
pub mod output;
pub mod pipeline;
pub mod redact;
pub mod report;
pub mod runner;
pub mod sink;

pub use error::{EngineError, Result};
pub use helm::{
    ChartFetcher, ChartRenderer, Credentials, FetchRequest, FetchedArtifact, Helm,
    TemplateRequest, ToolProbe, DEFAULT_BINARY,
};
pub use kustomize::{FsSynthesizer, KustomizationSynthesizer, KUSTOMIZATION_FILE};
pub use output::{DirCleaner, OutputCleaner};
pub use pipeline::{
    Pipeline, PipelineBuilder, PipelineError, PipelineOptions, PipelineReport, Stage, StageError,
};
pub use redact::{Redactor, MASK, WITHHELD};
pub use report::Reporter;
pub use runner::{CommandRunner, ExecConfig, ExecOptions, Invocation, ProcessRunner, RecordingRunner};
pub use sink::{Capture, Sink};
