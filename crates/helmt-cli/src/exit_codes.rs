//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// Descriptor error - the chart descriptor could not be parsed or is incomplete
pub const DESCRIPTOR_ERROR: i32 = 2;

/// Tool error - helm could not be run or exited with a non-zero status
pub const TOOL_ERROR: i32 = 3;

/// Artifact error - the chart fetch did not produce exactly one archive
pub const ARTIFACT_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
