//! Kustomize command - write a kustomization.yaml for an existing directory

use helmt_engine::{FsSynthesizer, KustomizationSynthesizer, Reporter};
use std::path::Path;

use crate::error::Result;

pub fn run(dir: &Path) -> Result<()> {
    FsSynthesizer::new(Reporter::stdout()).generate(dir)?;
    Ok(())
}
