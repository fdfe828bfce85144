//! helmt CLI - render a Helm chart to plain manifests from a YAML descriptor

use clap::{Parser, Subcommand};
use helmt_engine::{Credentials, DEFAULT_BINARY};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod error;
mod exit_codes;

use error::CliError;

#[derive(Parser)]
#[command(name = "helmt")]
#[command(version)]
#[command(about = "Render a Helm chart to plain manifests from a YAML descriptor", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// helm executable to run
    #[arg(long, global = true, env = "HELMT_HELM", default_value = DEFAULT_BINARY)]
    helm: String,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the chart and render it to manifest files
    Template {
        /// Chart descriptor
        #[arg(default_value = "helm-chart.yaml")]
        descriptor: PathBuf,

        /// Remove the previously rendered chart directory first
        #[arg(long)]
        clean: bool,

        /// Chart repository username
        #[arg(long, env = "HELMT_USERNAME")]
        username: Option<String>,

        /// Chart repository password
        #[arg(long, env = "HELMT_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Keep the downloaded chart archive
        #[arg(long)]
        keep_download: bool,
    },

    /// Check a chart descriptor without running helm
    Validate {
        /// Chart descriptor
        #[arg(default_value = "helm-chart.yaml")]
        descriptor: PathBuf,
    },

    /// Write a kustomization.yaml listing every file under a directory
    Kustomize {
        /// Directory containing rendered manifests
        dir: PathBuf,
    },
}

fn main() {
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
        let _ = miette::set_hook(Box::new(|_| {
            Box::new(miette::MietteHandlerOpts::new().color(false).build())
        }));
    }
    init_tracing(cli.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Template {
            descriptor,
            clean,
            username,
            password,
            keep_download,
        } => commands::template::run(
            &descriptor,
            &cli.helm,
            clean,
            Credentials::new(username.unwrap_or_default(), password.unwrap_or_default()),
            keep_download,
        ),

        Commands::Validate { descriptor } => commands::validate::run(&descriptor),

        Commands::Kustomize { dir } => commands::kustomize::run(&dir),
    }
}

/// Log to stderr; `--debug` wins over RUST_LOG, which wins over the `warn` default
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
