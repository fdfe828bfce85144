//! kustomization.yaml generation for rendered charts

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{EngineError, Result};
use crate::report::Reporter;

/// Name of the generated manifest
pub const KUSTOMIZATION_FILE: &str = "kustomization.yaml";

const HEADER: &str = "apiVersion: kustomize.config.k8s.io/v1beta1
kind: Kustomization
resources:
";

/// Writes a kustomization listing every file under a directory
pub trait KustomizationSynthesizer {
    /// Generate the manifest inside `dir`, returning its path
    fn generate(&self, dir: &Path) -> Result<PathBuf>;
}

/// Generates the manifest from the filesystem
#[derive(Debug, Clone, Default)]
pub struct FsSynthesizer {
    reporter: Reporter,
}

impl FsSynthesizer {
    pub fn new(reporter: Reporter) -> Self {
        Self { reporter }
    }
}

impl KustomizationSynthesizer for FsSynthesizer {
    fn generate(&self, dir: &Path) -> Result<PathBuf> {
        let manifest = render_manifest(&resources(dir)?);
        let path = dir.join(KUSTOMIZATION_FILE);

        fs::write(&path, manifest).map_err(EngineError::io("write", &path))?;
        self.reporter.step(format!("wrote {}", path.display()));
        Ok(path)
    }
}

/// Every non-directory entry under `root`, relative to it, `/`-separated
///
/// Entries are sorted by name within each directory and visited depth first,
/// so the result only depends on the tree's content. A `kustomization.yaml`
/// at the root is skipped.
pub fn resources(root: &Path) -> Result<Vec<String>> {
    let mut resources = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf());
            EngineError::Io {
                action: "walk",
                path,
                source: err.into(),
            }
        })?;

        if entry.file_type().is_dir() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|c| {
                c.as_os_str().to_str().ok_or_else(|| EngineError::Io {
                    action: "list",
                    path: entry.path().to_path_buf(),
                    source: io::Error::new(
                        io::ErrorKind::InvalidData,
                        "file name is not valid UTF-8",
                    ),
                })
            })
            .collect::<Result<Vec<_>>>()?
            .join("/");

        if relative != KUSTOMIZATION_FILE {
            resources.push(relative);
        }
    }

    Ok(resources)
}

/// The manifest text for a resource list
pub fn render_manifest(resources: &[String]) -> String {
    let mut manifest = String::from(HEADER);
    for resource in resources {
        manifest.push_str("  - ");
        manifest.push_str(resource);
        manifest.push('\n');
    }
    manifest
}
