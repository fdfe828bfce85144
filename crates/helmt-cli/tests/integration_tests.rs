//! Integration tests for CLI commands
//!
//! A shell script stands in for helm: it appends its arguments to a log,
//! drops an archive into the fetch destination and writes one manifest into
//! the output directory on `template`. `HELMT_FAKE_MODE` switches it into
//! failure modes.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const FAKE_HELM: &str = r#"#!/bin/sh
echo "$*" >> "$HELMT_FAKE_LOG"
cmd="$1"
shift
case "$cmd" in
  version)
    echo "version.BuildInfo{Version:\"v3.14.0\"}"
    ;;
  fetch)
    while [ $# -gt 0 ]; do
      [ "$1" = "--destination" ] && dest="$2"
      shift
    done
    [ "$HELMT_FAKE_MODE" = "empty-fetch" ] && exit 0
    echo archive > "$dest/nginx-1.0.0.tgz"
    ;;
  template)
    if [ "$HELMT_FAKE_MODE" = "template-fail" ]; then
      echo "Error: parse error in nginx/templates/service.yaml" >&2
      exit 1
    fi
    while [ $# -gt 0 ]; do
      [ "$1" = "--output-dir" ] && out="$2"
      shift
    done
    mkdir -p "$out/nginx/templates"
    echo "kind: Deployment" > "$out/nginx/templates/deployment.yaml"
    ;;
esac
"#;

const DESCRIPTOR: &str = "chart: nginx
version: 1.0.0
repository: https://charts.example.com
name: web
namespace: frontend
";

struct Workspace {
    dir: TempDir,
    helm: PathBuf,
    log: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let helm = dir.path().join("fake-helm");
        fs::write(&helm, FAKE_HELM).unwrap();
        fs::set_permissions(&helm, fs::Permissions::from_mode(0o755)).unwrap();
        let log = dir.path().join("helm.log");
        Self { dir, helm, log }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn descriptor(&self, content: &str) {
        fs::write(self.path().join("helm-chart.yaml"), content).unwrap();
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_helmt"));
        cmd.current_dir(self.path())
            .arg("--helm")
            .arg(&self.helm)
            .args(args)
            .env("HELMT_FAKE_LOG", &self.log)
            .env_remove("HELMT_FAKE_MODE")
            .env_remove("HELMT_HELM")
            .env_remove("HELMT_USERNAME")
            .env_remove("HELMT_PASSWORD")
            .env_remove("RUST_LOG");
        cmd
    }

    fn helmt(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("Failed to execute helmt")
    }

    fn helm_calls(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

mod template_command {
    use super::*;

    #[test]
    fn test_renders_chart() {
        let ws = Workspace::new();
        ws.descriptor(DESCRIPTOR);

        let output = ws.helmt(&["template"]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(ws.path().join("nginx/templates/deployment.yaml").exists());
        assert!(!ws.path().join("nginx/kustomization.yaml").exists());
        assert!(stdout(&output).contains("rendered nginx 1.0.0"));

        let calls = ws.helm_calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], "version");
        assert!(calls[1].starts_with("fetch --repo https://charts.example.com --version 1.0.0"));
        assert!(calls[1].ends_with(" nginx"));
        assert!(calls[2].starts_with("template web "));
        assert!(calls[2].ends_with(
            "--namespace frontend --include-crds --skip-tests --output-dir ."
        ));
    }

    #[test]
    fn test_generates_kustomization() {
        let ws = Workspace::new();
        ws.descriptor(&format!(
            "{DESCRIPTOR}postProcess:\n  generateKustomization: true\n"
        ));

        let output = ws.helmt(&["template"]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let manifest = fs::read_to_string(ws.path().join("nginx/kustomization.yaml")).unwrap();
        assert_eq!(
            manifest,
            "apiVersion: kustomize.config.k8s.io/v1beta1\n\
             kind: Kustomization\n\
             resources:\n  - templates/deployment.yaml\n"
        );
        let reported = stdout(&output)
            .lines()
            .filter(|l| l.starts_with("wrote ") && l.ends_with("kustomization.yaml"))
            .count();
        assert_eq!(reported, 1);
    }

    #[test]
    fn test_downloaded_archive_is_removed() {
        let ws = Workspace::new();
        ws.descriptor(DESCRIPTOR);

        let output = ws.helmt(&["template"]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let calls = ws.helm_calls();
        let chart = calls[2].split_whitespace().nth(2).unwrap();
        assert!(chart.ends_with("nginx-1.0.0.tgz"));
        assert!(!Path::new(chart).exists());
        assert!(!Path::new(chart).parent().unwrap().exists());
    }

    #[test]
    fn test_keep_download() {
        let ws = Workspace::new();
        ws.descriptor(DESCRIPTOR);

        let output = ws.helmt(&["template", "--keep-download"]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let calls = ws.helm_calls();
        let chart = PathBuf::from(calls[2].split_whitespace().nth(2).unwrap());
        assert!(chart.exists());
        assert!(stdout(&output).contains("kept"));

        fs::remove_dir_all(chart.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_clean_removes_stale_output() {
        let ws = Workspace::new();
        ws.descriptor(DESCRIPTOR);
        fs::create_dir_all(ws.path().join("nginx/templates")).unwrap();
        fs::write(ws.path().join("nginx/templates/stale.yaml"), "kind: Secret").unwrap();

        let output = ws.helmt(&["template", "--clean"]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(!ws.path().join("nginx/templates/stale.yaml").exists());
        assert!(ws.path().join("nginx/templates/deployment.yaml").exists());
    }

    #[test]
    fn test_password_is_never_printed() {
        let ws = Workspace::new();
        ws.descriptor(DESCRIPTOR);

        let output = ws.helmt(&[
            "--debug",
            "template",
            "--username",
            "deployer",
            "--password",
            "hunter2-s3cret",
        ]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(!stdout(&output).contains("hunter2-s3cret"));
        assert!(!stderr(&output).contains("hunter2-s3cret"));
        assert!(stdout(&output).contains("--password *****"));

        // helm itself still receives the real credentials
        assert!(ws.helm_calls()[1].contains("--username deployer --password hunter2-s3cret"));
    }

    #[test]
    fn test_password_from_environment() {
        let ws = Workspace::new();
        ws.descriptor(DESCRIPTOR);

        let output = ws
            .command(&["template"])
            .env("HELMT_USERNAME", "deployer")
            .env("HELMT_PASSWORD", "from-env-pass")
            .output()
            .unwrap();

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(!stdout(&output).contains("from-env-pass"));
        assert!(ws.helm_calls()[1].contains("--password from-env-pass"));
    }

    #[test]
    fn test_invalid_descriptor_never_runs_helm() {
        let ws = Workspace::new();
        ws.descriptor("chart: nginx\n");

        let output = ws.helmt(&["template"]);

        assert_eq!(output.status.code(), Some(2));
        let err = stderr(&output);
        assert!(err.contains("version"));
        assert!(err.contains("repository"));
        assert!(err.contains("name"));
        assert!(ws.helm_calls().is_empty());
    }

    #[test]
    fn test_missing_descriptor() {
        let ws = Workspace::new();

        let output = ws.helmt(&["template"]);

        assert_eq!(output.status.code(), Some(5));
        assert!(stderr(&output).contains("helm-chart.yaml"));
        assert!(ws.helm_calls().is_empty());
    }

    #[test]
    fn test_template_failure() {
        let ws = Workspace::new();
        ws.descriptor(&format!(
            "{DESCRIPTOR}postProcess:\n  generateKustomization: true\n"
        ));

        let output = ws
            .command(&["template"])
            .env("HELMT_FAKE_MODE", "template-fail")
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(3));
        assert!(stderr(&output).contains("parse error"));
        assert!(!ws.path().join("nginx/kustomization.yaml").exists());
    }

    #[test]
    fn test_empty_fetch() {
        let ws = Workspace::new();
        ws.descriptor(DESCRIPTOR);

        let output = ws
            .command(&["template"])
            .env("HELMT_FAKE_MODE", "empty-fetch")
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(4));
        assert!(stderr(&output).contains("found nothing"));
        assert_eq!(ws.helm_calls().len(), 2);
    }

    #[test]
    fn test_missing_helm_binary() {
        let ws = Workspace::new();
        ws.descriptor(DESCRIPTOR);

        let output = Command::new(env!("CARGO_BIN_EXE_helmt"))
            .current_dir(ws.path())
            .args(["--helm", "/nonexistent/helm", "template"])
            .env_remove("HELMT_HELM")
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(3));
        assert!(!ws.path().join("nginx").exists());
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn test_validate_summary() {
        let ws = Workspace::new();
        ws.descriptor(&format!(
            "{DESCRIPTOR}skipCRDs: true\nvalues:\n  - prod.yaml\noutputDir: rendered\n"
        ));

        let output = ws.helmt(&["validate"]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let out = stdout(&output);
        assert!(out.contains("helm-chart.yaml is valid"));
        assert!(out.contains("Chart: nginx"));
        assert!(out.contains("Namespace: frontend"));
        assert!(out.contains("CRDs: skipped"));
        assert!(out.contains("Output: rendered/nginx"));
        assert!(out.contains("  - prod.yaml"));
        assert!(ws.helm_calls().is_empty());
    }

    #[test]
    fn test_validate_invalid() {
        let ws = Workspace::new();
        fs::write(ws.path().join("other.yaml"), "chart: [unclosed\n").unwrap();

        let output = ws.helmt(&["validate", "other.yaml"]);

        assert_eq!(output.status.code(), Some(2));
    }
}

mod kustomize_command {
    use super::*;

    #[test]
    fn test_kustomize_directory() {
        let ws = Workspace::new();
        let dir = ws.path().join("manifests");
        fs::create_dir_all(dir.join("b")).unwrap();
        fs::write(dir.join("b/service.yaml"), "kind: Service").unwrap();
        fs::write(dir.join("a.yaml"), "kind: ConfigMap").unwrap();

        let output = ws.helmt(&["kustomize", "manifests"]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let manifest = fs::read_to_string(dir.join("kustomization.yaml")).unwrap();
        assert!(manifest.ends_with("resources:\n  - a.yaml\n  - b/service.yaml\n"));
    }

    #[test]
    fn test_kustomize_missing_directory() {
        let ws = Workspace::new();

        let output = ws.helmt(&["kustomize", "absent"]);

        assert_eq!(output.status.code(), Some(5));
    }
}

mod usage {
    use super::*;

    #[test]
    fn test_unknown_subcommand() {
        let ws = Workspace::new();

        let output = ws.helmt(&["install"]);

        assert_eq!(output.status.code(), Some(64));
    }

    #[test]
    fn test_help() {
        let ws = Workspace::new();

        let output = ws.helmt(&["--help"]);

        assert!(output.status.success());
        let out = stdout(&output);
        assert!(out.contains("template"));
        assert!(out.contains("validate"));
        assert!(out.contains("kustomize"));
    }
}
