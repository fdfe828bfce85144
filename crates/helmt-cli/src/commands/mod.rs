//! CLI commands

pub mod kustomize;
pub mod template;
pub mod validate;
