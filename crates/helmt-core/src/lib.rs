//! helmt core - the chart descriptor
//!
//! This crate provides the types shared by the rest of helmt:
//! - `ChartSpec`: the validated chart descriptor (chart, version, repository, release name, ...)
//! - `DescriptorLoader`: the loading stage, with `FileLoader` reading YAML from disk
//! - `CoreError`: parse, read and validation failures

pub mod error;
pub mod spec;

pub use error::{CoreError, Result, ValidationIssue};
pub use spec::{ChartSpec, DescriptorLoader, FileLoader, PostProcess};
