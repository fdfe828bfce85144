//! Validate command - check a descriptor without running helm

use console::style;
use helmt_core::{DescriptorLoader, FileLoader};
use std::path::Path;

use crate::error::Result;

pub fn run(descriptor: &Path) -> Result<()> {
    let spec = FileLoader.load(descriptor)?;

    println!(
        "{} {} is valid",
        style("✓").green().bold(),
        descriptor.display()
    );
    println!();

    println!("{}: {}", style("Chart").bold(), spec.chart);
    println!("{}: {}", style("Version").bold(), spec.version);
    println!("{}: {}", style("Repository").bold(), spec.repository);
    println!("{}: {}", style("Release").bold(), spec.name);
    println!(
        "{}: {}",
        style("Namespace").bold(),
        spec.namespace().unwrap_or("(unset)")
    );
    println!(
        "{}: {}",
        style("CRDs").bold(),
        if spec.skip_crds { "skipped" } else { "included" }
    );
    println!(
        "{}: {}",
        style("Output").bold(),
        spec.rendered_dir().display()
    );

    if !spec.values.is_empty() {
        println!();
        println!("{}:", style("Values files").bold());
        for values_file in &spec.values {
            println!("  - {}", values_file);
        }
    }

    if !spec.api_versions.is_empty() {
        println!();
        println!("{}:", style("API versions").bold());
        for api_version in &spec.api_versions {
            println!("  - {}", api_version);
        }
    }

    if spec.generate_kustomization() {
        println!();
        println!(
            "{} kustomization.yaml will be generated",
            style("→").blue()
        );
    }

    Ok(())
}
