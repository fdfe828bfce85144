//! The helm command-line driver
//!
//! [`Helm`] implements the three stages that shell out to helm: the version
//! probe, the chart fetch into a private temporary directory, and the
//! `helm template` render. Argument lists are built by [`fetch_args`] and
//! [`template_args`] so they can be checked without running anything.

use helmt_core::ChartSpec;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::error::{EngineError, Result};
use crate::report::Reporter;
use crate::runner::{CommandRunner, ExecOptions};

/// Binary used when none is configured
pub const DEFAULT_BINARY: &str = "helm";

/// Prefix of the temporary directories charts are downloaded into
const STAGING_PREFIX: &str = "helmt";

/// Repository credentials for `helm fetch`
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_empty() { "" } else { "*****" };
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &password)
            .finish()
    }
}

/// What to download
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    pub repository: &'a str,
    pub chart: &'a str,
    pub version: &'a str,
    pub credentials: &'a Credentials,
}

impl<'a> FetchRequest<'a> {
    pub fn new(spec: &'a ChartSpec, credentials: &'a Credentials) -> Self {
        Self {
            repository: &spec.repository,
            chart: &spec.chart,
            version: &spec.version,
            credentials,
        }
    }
}

/// Arguments for `helm fetch` into `destination`
pub fn fetch_args(request: &FetchRequest<'_>, destination: &Path) -> Vec<String> {
    let mut args = vec![
        "fetch".to_string(),
        "--repo".to_string(),
        request.repository.to_string(),
        "--version".to_string(),
        request.version.to_string(),
        "--destination".to_string(),
        destination.to_string_lossy().into_owned(),
    ];
    if !request.credentials.username.is_empty() {
        args.push("--username".to_string());
        args.push(request.credentials.username.clone());
    }
    if !request.credentials.password.is_empty() {
        args.push("--password".to_string());
        args.push(request.credentials.password.clone());
    }
    args.push(request.chart.to_string());
    args
}

/// A downloaded chart archive
///
/// When staged, the archive lives alone in a temporary directory that is
/// removed when the artifact is dropped, unless [`FetchedArtifact::persist`]
/// was called.
#[derive(Debug)]
pub struct FetchedArtifact {
    path: PathBuf,
    staging: Option<TempDir>,
}

impl FetchedArtifact {
    /// An archive that owns its staging directory
    pub fn staged(staging: TempDir, file_name: &str) -> Self {
        Self {
            path: staging.path().join(file_name),
            staging: Some(staging),
        }
    }

    /// An archive at a path this process does not manage
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            staging: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the staging directory on disk after this artifact is dropped
    pub fn persist(&mut self) -> &Path {
        if let Some(staging) = self.staging.take() {
            let dir = staging.keep();
            tracing::debug!(dir = %dir.display(), "keeping downloaded chart");
        }
        &self.path
    }
}

/// Everything `helm template` needs
#[derive(Debug, Clone, Copy)]
pub struct TemplateRequest<'a> {
    pub release: &'a str,
    pub chart: &'a Path,
    pub namespace: Option<&'a str>,
    pub include_crds: bool,
    pub values: &'a [String],
    pub output_dir: &'a Path,
    pub api_versions: &'a [String],
}

impl<'a> TemplateRequest<'a> {
    pub fn new(spec: &'a ChartSpec, chart: &'a Path) -> Self {
        Self {
            release: &spec.name,
            chart,
            namespace: spec.namespace(),
            include_crds: !spec.skip_crds,
            values: &spec.values,
            output_dir: spec.output_dir(),
            api_versions: &spec.api_versions,
        }
    }
}

/// Arguments for `helm template`, in a fixed order
pub fn template_args(request: &TemplateRequest<'_>) -> Vec<String> {
    let mut args = vec![
        "template".to_string(),
        request.release.to_string(),
        request.chart.to_string_lossy().into_owned(),
    ];
    if let Some(namespace) = request.namespace.filter(|ns| !ns.is_empty()) {
        args.push("--namespace".to_string());
        args.push(namespace.to_string());
    }
    if request.include_crds {
        args.push("--include-crds".to_string());
    }
    args.push("--skip-tests".to_string());
    for values_file in request.values {
        args.push("--values".to_string());
        args.push(values_file.clone());
    }
    args.push("--output-dir".to_string());
    args.push(request.output_dir.to_string_lossy().into_owned());
    for api_version in request.api_versions {
        args.push("--api-versions".to_string());
        args.push(api_version.clone());
    }
    args
}

/// Preflight check that the chart tool is usable
pub trait ToolProbe {
    fn probe(&self) -> Result<()>;
}

/// Downloads a chart archive
pub trait ChartFetcher {
    fn fetch(&self, request: &FetchRequest<'_>) -> Result<FetchedArtifact>;
}

/// Renders a chart archive into manifest files
pub trait ChartRenderer {
    fn render(&self, request: &TemplateRequest<'_>) -> Result<()>;
}

/// Drives the helm binary through a [`CommandRunner`]
#[derive(Clone)]
pub struct Helm {
    binary: String,
    runner: Arc<dyn CommandRunner>,
    reporter: Reporter,
}

impl Helm {
    pub fn new(runner: Arc<dyn CommandRunner>, reporter: Reporter) -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            runner,
            reporter,
        }
    }

    /// Use a different helm executable
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn run(&self, options: &ExecOptions, args: &[String]) -> Result<()> {
        self.runner.run(&self.binary, options, args)
    }
}

impl fmt::Debug for Helm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Helm").field("binary", &self.binary).finish()
    }
}

impl ToolProbe for Helm {
    fn probe(&self) -> Result<()> {
        self.run(&ExecOptions::new(), &["version".to_string()])
    }
}

impl ChartFetcher for Helm {
    fn fetch(&self, request: &FetchRequest<'_>) -> Result<FetchedArtifact> {
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir()
            .map_err(EngineError::io(
                "create temporary directory in",
                std::env::temp_dir(),
            ))?;

        // The password is masked even when the runner was not told about it
        let options = ExecOptions::new().secret(request.credentials.password.clone());
        self.run(&options, &fetch_args(request, staging.path()))?;

        let entries = list_entries(staging.path())?;
        if entries.len() != 1 {
            // Left on disk so the unexpected content can be inspected
            let dir = staging.keep();
            return Err(EngineError::UnexpectedArtifact { dir, entries });
        }

        let artifact = FetchedArtifact::staged(staging, &entries[0]);
        self.reporter
            .step(format!("downloaded {}", artifact.path().display()));
        Ok(artifact)
    }
}

impl ChartRenderer for Helm {
    fn render(&self, request: &TemplateRequest<'_>) -> Result<()> {
        self.run(&ExecOptions::new(), &template_args(request))
    }
}

/// Names of the immediate entries of `dir`, sorted
fn list_entries(dir: &Path) -> Result<Vec<String>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(EngineError::io("read", dir))? {
        let entry = entry.map_err(EngineError::io("read", dir))?;
        entries.push(entry.file_name().to_string_lossy().into_owned());
    }
    entries.sort();
    Ok(entries)
}
