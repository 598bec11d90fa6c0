//! Unit tests for the command line

use crate::cli::{run, Cli};
use crate::runtime_config::RuntimeConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_crate_dir_is_required() {
    assert!(Cli::try_parse_from(["routedoc-gen"]).is_err());
}

#[test]
fn test_defaults() {
    let cli = Cli::try_parse_from(["routedoc-gen", "demos/items"]).unwrap();
    assert_eq!(cli.crate_dir, PathBuf::from("demos/items"));
    assert!(cli.html.is_none());
    assert!(!cli.pretty);
    assert!(!cli.offline);
    assert!(cli.cargo.is_none());
}

#[test]
fn test_all_flags() {
    let cli = Cli::try_parse_from([
        "routedoc-gen",
        "--html",
        "docs.html",
        "--pretty",
        "--cargo",
        "/usr/local/bin/cargo",
        "--target-dir",
        "/tmp/probes",
        "--timeout-secs",
        "42",
        "--offline",
        "app",
    ])
    .unwrap();
    assert_eq!(cli.html, Some(PathBuf::from("docs.html")));
    assert!(cli.pretty);
    assert!(cli.offline);
    assert_eq!(cli.timeout_secs, Some(42));

    let probe = cli.probe(&RuntimeConfig::default());
    assert_eq!(probe.cargo, PathBuf::from("/usr/local/bin/cargo"));
    assert_eq!(probe.timeout, Duration::from_secs(42));
    assert_eq!(probe.target_dir, Some(PathBuf::from("/tmp/probes")));
    assert!(probe.offline);
}

#[test]
fn test_probe_falls_back_to_runtime_config() {
    let cli = Cli::try_parse_from(["routedoc-gen", "app"]).unwrap();
    let runtime = RuntimeConfig {
        probe_timeout: Duration::from_secs(9),
        cargo_bin: PathBuf::from("cargo-nightly"),
        ..RuntimeConfig::default()
    };
    let probe = cli.probe(&runtime);
    assert_eq!(probe.timeout, Duration::from_secs(9));
    assert_eq!(probe.cargo, PathBuf::from("cargo-nightly"));
}

#[test]
fn test_bad_timeout_is_rejected() {
    assert!(Cli::try_parse_from(["routedoc-gen", "--timeout-secs", "soon", "app"]).is_err());
}

#[test]
fn test_run_fails_without_output_for_missing_crate() {
    let dir = tempfile::tempdir().unwrap();
    let html = dir.path().join("out.html");
    let cli = Cli::try_parse_from([
        "routedoc-gen".into(),
        "--html".into(),
        html.clone().into_os_string(),
        dir.path().join("missing").into_os_string(),
    ])
    .unwrap();
    let err = run(&cli, &RuntimeConfig::default()).unwrap_err();
    assert!(format!("{err:#}").contains("missing"), "{err:#}");
    assert!(!html.exists());
}
