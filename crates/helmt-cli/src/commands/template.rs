//! Template command - fetch and render the chart described by a descriptor

use console::style;
use helmt_engine::{
    Credentials, ExecConfig, Pipeline, PipelineOptions, ProcessRunner, Redactor, Reporter, Sink,
};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

pub fn run(
    descriptor: &Path,
    helm: &str,
    clean: bool,
    credentials: Credentials,
    keep_download: bool,
) -> Result<()> {
    tracing::debug!(
        descriptor = %descriptor.display(),
        helm,
        clean,
        keep_download,
        "template command"
    );

    let reporter = Reporter::stdout();
    let runner = ProcessRunner::new(ExecConfig {
        stdout: Sink::Stdout,
        stderr: Sink::Stderr,
        reporter: reporter.clone(),
        redactor: Redactor::new().with_secret(credentials.password.clone()),
    });

    let pipeline = Pipeline::builder(Arc::new(runner))
        .reporter(reporter)
        .helm_binary(helm)
        .build();

    let options = PipelineOptions {
        clean,
        credentials,
        keep_download,
    };
    let report = pipeline.run(descriptor, &options)?;

    println!(
        "{} {} {} into {}",
        style("rendered").green(),
        report.spec.chart,
        report.spec.version,
        report.rendered_dir.display()
    );
    if let Some(archive) = &report.kept_download {
        println!("{} {}", style("kept").green(), archive.display());
    }

    Ok(())
}
