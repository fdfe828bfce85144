//! Chart descriptor loading and validation

use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result, ValidationIssue};

/// A validated chart descriptor
///
/// ```yaml
/// chart: nginx
/// version: 1.2.3
/// repository: https://charts.example.com
/// name: web
/// namespace: frontend
/// values:
///   - values/common.yaml
///   - values/prod.yaml
/// skipCRDs: false
/// outputDir: manifests
/// apiVersions:
///   - monitoring.coreos.com/v1
/// postProcess:
///   generateKustomization: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    /// Chart identifier within the repository
    #[serde(default, deserialize_with = "scalar_string")]
    pub chart: String,

    /// Exact chart version
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: String,

    /// Chart repository URL
    #[serde(default, deserialize_with = "scalar_string")]
    pub repository: String,

    /// Release name
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: String,

    /// Target namespace (empty means unset)
    #[serde(default, deserialize_with = "scalar_string")]
    pub namespace: String,

    /// Values files, applied in order (later files win)
    #[serde(default, deserialize_with = "string_list")]
    pub values: Vec<String>,

    /// Exclude CRDs from the rendered output
    #[serde(default, rename = "skipCRDs", deserialize_with = "nullable")]
    pub skip_crds: bool,

    /// Output directory (empty means the current directory)
    #[serde(default, deserialize_with = "scalar_string")]
    pub output_dir: String,

    /// Extra API versions advertised to the renderer
    #[serde(default, deserialize_with = "string_list")]
    pub api_versions: Vec<String>,

    /// Steps to run after rendering
    #[serde(default, deserialize_with = "nullable")]
    pub post_process: PostProcess,
}

/// Post-render processing switches
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostProcess {
    /// Write a kustomization.yaml listing the rendered manifests
    #[serde(default, deserialize_with = "nullable")]
    pub generate_kustomization: bool,
}

impl ChartSpec {
    /// Load and validate a descriptor from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse and validate a descriptor from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::parse(yaml, "<inline>")
    }

    fn parse(yaml: &str, origin: &str) -> Result<Self> {
        let spec = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str::<Option<Self>>(yaml)
                .map_err(|source| CoreError::Parse {
                    origin: origin.to_string(),
                    source,
                })?
                .unwrap_or_default()
        };

        spec.validate()?;
        Ok(spec)
    }

    /// Check required fields, reporting every offending field at once
    pub fn validate(&self) -> Result<()> {
        let mut issues = Vec::new();

        let required = [
            ("chart", &self.chart),
            ("version", &self.version),
            ("repository", &self.repository),
            ("name", &self.name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                issues.push(ValidationIssue::new(field, "is required"));
            }
        }

        // The chart name becomes a directory under outputDir, which --clean removes
        if !self.chart.trim().is_empty() && matches!(self.chart_name(), "" | "." | "..") {
            issues.push(ValidationIssue::new(
                "chart",
                format!("'{}' does not name a chart", self.chart),
            ));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation { issues })
        }
    }

    /// Namespace, if one was set
    pub fn namespace(&self) -> Option<&str> {
        if self.namespace.is_empty() {
            None
        } else {
            Some(&self.namespace)
        }
    }

    /// Directory handed to the renderer, `.` when unset
    pub fn output_dir(&self) -> &Path {
        if self.output_dir.is_empty() {
            Path::new(".")
        } else {
            Path::new(&self.output_dir)
        }
    }

    /// Last path segment of the chart identifier
    pub fn chart_name(&self) -> &str {
        let chart = self.chart.trim_end_matches('/');
        chart.rsplit('/').next().unwrap_or(chart)
    }

    /// Directory the renderer writes this chart's manifests into
    pub fn rendered_dir(&self) -> PathBuf {
        self.output_dir().join(self.chart_name())
    }

    #[inline]
    pub fn generate_kustomization(&self) -> bool {
        self.post_process.generate_kustomization
    }
}

/// Source of validated chart descriptors
pub trait DescriptorLoader {
    fn load(&self, path: &Path) -> Result<ChartSpec>;
}

/// Loads descriptors from the filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl DescriptorLoader for FileLoader {
    fn load(&self, path: &Path) -> Result<ChartSpec> {
        ChartSpec::from_file(path)
    }
}

fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        Some(value) => scalar_to_string(value),
        None => Ok(String::new()),
    }
}

fn string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<serde_yaml::Value>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .map(scalar_to_string)
        .collect()
}

/// Accept any YAML scalar where a string is expected (`version: 1.0`)
fn scalar_to_string<E: de::Error>(value: serde_yaml::Value) -> std::result::Result<String, E> {
    use serde_yaml::Value;

    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(tagged.value),
        Value::Sequence(_) => Err(E::custom("expected a string, found a sequence")),
        Value::Mapping(_) => Err(E::custom("expected a string, found a mapping")),
    }
}
