//! The chart pipeline: load, probe, fetch, clean, render, kustomize
//!
//! Each stage sits behind its own trait and can be replaced through the
//! [`PipelineBuilder`]. Stages run in order and the first failure stops the
//! run; the resulting [`PipelineError`] names the stage that failed.

use helmt_core::{ChartSpec, CoreError, DescriptorLoader, FileLoader};
use miette::Diagnostic;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::error::EngineError;
use crate::helm::{
    ChartFetcher, ChartRenderer, Credentials, FetchRequest, Helm, TemplateRequest, ToolProbe,
};
use crate::kustomize::{FsSynthesizer, KustomizationSynthesizer};
use crate::output::{DirCleaner, OutputCleaner};
use crate::report::Reporter;
use crate::runner::CommandRunner;

/// Pipeline steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Probe,
    Fetch,
    Clean,
    Render,
    Kustomize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Load => "loading the chart descriptor",
            Stage::Probe => "checking the helm installation",
            Stage::Fetch => "fetching the chart",
            Stage::Clean => "cleaning the previous output",
            Stage::Render => "rendering the chart",
            Stage::Kustomize => "generating kustomization.yaml",
        })
    }
}

/// Underlying cause of a pipeline failure
#[derive(Error, Debug, Diagnostic)]
pub enum StageError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Descriptor(#[from] CoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

/// A pipeline failure and the stage it happened in
#[derive(Error, Debug, Diagnostic)]
#[error("Failed while {stage}")]
#[diagnostic(code(helmt::pipeline))]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    #[diagnostic_source]
    pub source: StageError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: impl Into<StageError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}

fn at<E: Into<StageError>>(stage: Stage) -> impl FnOnce(E) -> PipelineError {
    move |err| PipelineError::new(stage, err)
}

/// Per-run switches
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Remove the previously rendered chart directory first
    pub clean: bool,
    /// Repository credentials for the fetch
    pub credentials: Credentials,
    /// Keep the downloaded archive instead of deleting its temporary directory
    pub keep_download: bool,
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub spec: ChartSpec,
    /// Directory the chart's manifests were rendered into
    pub rendered_dir: PathBuf,
    /// Generated kustomization.yaml, if requested by the descriptor
    pub kustomization: Option<PathBuf>,
    /// Downloaded archive, if it was kept
    pub kept_download: Option<PathBuf>,
}

/// The chart pipeline
pub struct Pipeline {
    loader: Box<dyn DescriptorLoader>,
    probe: Box<dyn ToolProbe>,
    fetcher: Box<dyn ChartFetcher>,
    cleaner: Box<dyn OutputCleaner>,
    renderer: Box<dyn ChartRenderer>,
    synthesizer: Box<dyn KustomizationSynthesizer>,
}

impl Pipeline {
    /// Start building a pipeline whose helm stages use `runner`
    pub fn builder(runner: Arc<dyn CommandRunner>) -> PipelineBuilder {
        PipelineBuilder::new(runner)
    }

    /// Load the descriptor at `descriptor` and run every stage
    pub fn run(
        &self,
        descriptor: &Path,
        options: &PipelineOptions,
    ) -> Result<PipelineReport, PipelineError> {
        tracing::debug!(descriptor = %descriptor.display(), "loading descriptor");
        let spec = self.loader.load(descriptor).map_err(at(Stage::Load))?;
        self.execute(spec, options)
    }

    /// Run every stage after loading for an already validated spec
    pub fn execute(
        &self,
        spec: ChartSpec,
        options: &PipelineOptions,
    ) -> Result<PipelineReport, PipelineError> {
        tracing::debug!(chart = %spec.chart, version = %spec.version, "starting pipeline");

        self.probe.probe().map_err(at(Stage::Probe))?;

        let mut artifact = self
            .fetcher
            .fetch(&FetchRequest::new(&spec, &options.credentials))
            .map_err(at(Stage::Fetch))?;
        let kept_download = options
            .keep_download
            .then(|| artifact.persist().to_path_buf());

        let rendered_dir = spec.rendered_dir();
        if options.clean {
            self.cleaner
                .clean(&rendered_dir)
                .map_err(at(Stage::Clean))?;
        }

        self.renderer
            .render(&TemplateRequest::new(&spec, artifact.path()))
            .map_err(at(Stage::Render))?;
        drop(artifact);

        let kustomization = if spec.generate_kustomization() {
            let path = self
                .synthesizer
                .generate(&rendered_dir)
                .map_err(at(Stage::Kustomize))?;
            Some(path)
        } else {
            None
        };

        tracing::debug!(rendered_dir = %rendered_dir.display(), "pipeline finished");
        Ok(PipelineReport {
            spec,
            rendered_dir,
            kustomization,
            kept_download,
        })
    }
}

/// Builder for [`Pipeline`]; unset stages get the real implementations
pub struct PipelineBuilder {
    runner: Arc<dyn CommandRunner>,
    reporter: Reporter,
    helm_binary: Option<String>,
    loader: Option<Box<dyn DescriptorLoader>>,
    probe: Option<Box<dyn ToolProbe>>,
    fetcher: Option<Box<dyn ChartFetcher>>,
    cleaner: Option<Box<dyn OutputCleaner>>,
    renderer: Option<Box<dyn ChartRenderer>>,
    synthesizer: Option<Box<dyn KustomizationSynthesizer>>,
}

impl PipelineBuilder {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            reporter: Reporter::stdout(),
            helm_binary: None,
            loader: None,
            probe: None,
            fetcher: None,
            cleaner: None,
            renderer: None,
            synthesizer: None,
        }
    }

    /// Where the built-in stages report progress
    pub fn reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// helm executable used by the built-in helm stages
    pub fn helm_binary(mut self, binary: impl Into<String>) -> Self {
        self.helm_binary = Some(binary.into());
        self
    }

    pub fn loader(mut self, loader: impl DescriptorLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    pub fn probe(mut self, probe: impl ToolProbe + 'static) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    pub fn fetcher(mut self, fetcher: impl ChartFetcher + 'static) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    pub fn cleaner(mut self, cleaner: impl OutputCleaner + 'static) -> Self {
        self.cleaner = Some(Box::new(cleaner));
        self
    }

    pub fn renderer(mut self, renderer: impl ChartRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn synthesizer(mut self, synthesizer: impl KustomizationSynthesizer + 'static) -> Self {
        self.synthesizer = Some(Box::new(synthesizer));
        self
    }

    pub fn build(self) -> Pipeline {
        let mut helm = Helm::new(self.runner, self.reporter.clone());
        if let Some(binary) = self.helm_binary {
            helm = helm.with_binary(binary);
        }

        Pipeline {
            loader: self.loader.unwrap_or_else(|| Box::new(FileLoader)),
            probe: self.probe.unwrap_or_else(|| Box::new(helm.clone())),
            fetcher: self.fetcher.unwrap_or_else(|| Box::new(helm.clone())),
            renderer: self.renderer.unwrap_or_else(|| Box::new(helm)),
            cleaner: self
                .cleaner
                .unwrap_or_else(|| Box::new(DirCleaner::new(self.reporter.clone()))),
            synthesizer: self
                .synthesizer
                .unwrap_or_else(|| Box::new(FsSynthesizer::new(self.reporter))),
        }
    }
}
