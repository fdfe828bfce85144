//! External command execution
//!
//! All subprocesses go through a [`CommandRunner`]. The real implementation,
//! [`ProcessRunner`], prints the (redacted) command line before spawning the
//! process and turns a non-zero exit into [`EngineError::ExternalTool`].
//! [`RecordingRunner`] records invocations instead, for tests.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{EngineError, Result};
use crate::redact::Redactor;
use crate::report::Reporter;
use crate::sink::Sink;

/// Per-invocation execution options
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Working directory (defaults to the current directory)
    pub dir: Option<PathBuf>,
    /// Destination for the command's stdout (defaults to the runner's stdout)
    pub output: Option<Sink>,
    /// Secrets for this call only, masked on top of the runner's own
    pub secrets: Redactor,
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn output(mut self, sink: Sink) -> Self {
        self.output = Some(sink);
        self
    }

    /// Mask `secret` wherever this call's command line or stderr shows it
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secrets.add(secret);
        self
    }
}

/// Runs external commands
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, succeeding only on exit status zero
    fn run(&self, program: &str, options: &ExecOptions, args: &[String]) -> Result<()>;
}

/// Replaces captured stderr lines that would still show a secret
const STDERR_WITHHELD: &str = "[stderr line withheld]";

/// Streams and secrets used by a [`ProcessRunner`]
#[derive(Debug, Clone)]
pub struct ExecConfig {
    /// Default destination for subprocess stdout
    pub stdout: Sink,
    /// Destination for subprocess stderr
    pub stderr: Sink,
    /// Where command lines are echoed
    pub reporter: Reporter,
    /// Secrets masked from every echoed line and captured stderr
    pub redactor: Redactor,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            stdout: Sink::Stdout,
            stderr: Sink::Stderr,
            reporter: Reporter::stdout(),
            redactor: Redactor::new(),
        }
    }
}

/// Runs commands as child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    config: ExecConfig,
}

impl ProcessRunner {
    pub fn new(config: ExecConfig) -> Self {
        Self { config }
    }

    /// The command line as it is logged: program and arguments, secrets masked
    pub fn command_line(&self, program: &str, args: &[String]) -> String {
        self.config.redactor.redact(&join_command(program, args))
    }

    /// The runner's secrets plus those of a single call
    fn redactor_for(&self, options: &ExecOptions) -> Redactor {
        let mut redactor = self.config.redactor.clone();
        redactor.merge(&options.secrets);
        redactor
    }
}

fn join_command(program: &str, args: &[String]) -> String {
    let mut line = String::from(program);
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, options: &ExecOptions, args: &[String]) -> Result<()> {
        let redactor = self.redactor_for(options);
        let line = redactor.redact(&join_command(program, args));
        tracing::debug!(command = %line, dir = ?options.dir, "running external command");
        self.config.reporter.step(&line);

        let stdout = options.output.as_ref().unwrap_or(&self.config.stdout);

        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = &options.dir {
            command.current_dir(dir);
        }
        command.stdout(if stdout.is_stdout() {
            Stdio::inherit()
        } else {
            Stdio::piped()
        });
        command.stderr(Stdio::piped());

        let output = command.output().map_err(|source| EngineError::Spawn {
            program: program.to_string(),
            source,
        })?;

        if !stdout.is_stdout() {
            if let Err(e) = stdout.write_all(&output.stdout) {
                tracing::warn!("failed to forward output of {}: {}", program, e);
            }
        }

        let stderr =
            redactor.redact_lines(&String::from_utf8_lossy(&output.stderr), STDERR_WITHHELD);
        if !stderr.is_empty() {
            if let Err(e) = self.config.stderr.write_all(stderr.as_bytes()) {
                tracing::warn!("failed to forward stderr of {}: {}", program, e);
            }
        }

        if output.status.success() {
            Ok(())
        } else {
            tracing::debug!(command = %line, status = ?output.status.code(), "external command failed");
            Err(EngineError::ExternalTool {
                command: line,
                status: output.status.code(),
                stderr: stderr.trim().to_string(),
            })
        }
    }
}

/// A recorded call to a [`RecordingRunner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
}

impl Invocation {
    /// First argument, i.e. the helm subcommand
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Value following `flag`, if present
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

type Handler = dyn Fn(&Invocation) -> Result<()> + Send + Sync;

/// Runner that records invocations instead of spawning processes
///
/// A handler can simulate the command's side effects (such as writing the
/// fetched archive) or its failure.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<Invocation>>>,
    handler: Option<Arc<Handler>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `handler` for every invocation; its result becomes the command's result
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Invocation) -> Result<()> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// All invocations so far, in order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Subcommands invoked so far, in order
    pub fn subcommands(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .filter_map(|i| i.subcommand().map(String::from))
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, program: &str, options: &ExecOptions, args: &[String]) -> Result<()> {
        let invocation = Invocation {
            program: program.to_string(),
            args: args.to_vec(),
            dir: options.dir.clone(),
        };
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(invocation.clone());

        match &self.handler {
            Some(handler) => handler(&invocation),
            None => Ok(()),
        }
    }
}
