use crate::docs::{render_html, to_writer, Documentation};
use crate::probe::CargoProbe;
use crate::runtime_config::RuntimeConfig;
use crate::scanner::{discover, Scanner};
use anyhow::Context;
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Generate API documentation for a crate's route tables
///
/// Scans the crate's source for route tables, probes each one by compiling
/// and running a small program against the crate, and writes the result as
/// JSON (stdout) or as an HTML page.
#[derive(Parser, Debug)]
#[command(name = "routedoc-gen", version)]
#[command(about = "Generate API documentation from route tables", long_about = None)]
pub struct Cli {
    /// Directory of the crate to document (holds its Cargo.toml)
    #[arg(value_name = "CRATE_DIR")]
    pub crate_dir: PathBuf,

    /// Write an HTML page to this file instead of JSON to stdout
    #[arg(long, value_name = "FILE", env = "ROUTEDOC_HTML")]
    pub html: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false, env = "ROUTEDOC_PRETTY")]
    pub pretty: bool,

    /// Cargo binary used to build probes (default: ROUTEDOC_CARGO_BIN or `cargo`)
    #[arg(long, value_name = "BIN")]
    pub cargo: Option<PathBuf>,

    /// Target directory shared by probe builds
    /// (default: <CRATE_DIR>/target/routedoc-probe)
    #[arg(long, value_name = "DIR", env = "ROUTEDOC_TARGET_DIR")]
    pub target_dir: Option<PathBuf>,

    /// Kill a probe that runs longer than this
    /// (default: ROUTEDOC_PROBE_TIMEOUT_SECS or 300)
    #[arg(long, value_name = "N")]
    pub timeout_secs: Option<u64>,

    /// Build probes without network access
    #[arg(long, default_value_t = false, env = "ROUTEDOC_OFFLINE")]
    pub offline: bool,
}

impl Cli {
    /// Probe settings: flags first, then the environment.
    #[must_use]
    pub fn probe(&self, runtime: &RuntimeConfig) -> CargoProbe {
        let mut probe = CargoProbe::from_runtime_config(runtime);
        if let Some(cargo) = &self.cargo {
            probe.cargo = cargo.clone();
        }
        if let Some(secs) = self.timeout_secs {
            probe.timeout = Duration::from_secs(secs);
        }
        probe.target_dir = self.target_dir.clone();
        probe.offline = self.offline;
        probe
    }
}

/// Run the documentation pipeline for parsed arguments.
///
/// Output is only written once every table has been probed.
///
/// # Errors
///
/// Returns an error for any scan, probe or output failure.
pub fn run(cli: &Cli, runtime: &RuntimeConfig) -> anyhow::Result<()> {
    let discovery = discover(&cli.crate_dir)
        .with_context(|| format!("scanning {}", cli.crate_dir.display()))?;
    let package = discovery.manifest.package_name.clone();
    let scanner = Scanner::new(cli.probe(runtime));
    let docs = scanner.probe_all(&discovery)?;
    info!(package = %package, groups = docs.len(), "Documentation built");
    write_output(cli, &package, &docs)
}

fn write_output(cli: &Cli, package: &str, docs: &Documentation) -> anyhow::Result<()> {
    match &cli.html {
        Some(path) => {
            let html = render_html(docs, &format!("{package} API"))?;
            std::fs::write(path, html)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "Wrote HTML documentation");
        }
        None => {
            let mut buf = Vec::new();
            to_writer(docs, &mut buf, cli.pretty)?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(&buf).context("writing documentation to stdout")?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Parse the command line and run.
///
/// # Errors
///
/// See [`run`].
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let runtime = RuntimeConfig::from_env();
    run(&cli, &runtime)
}
