use askama::Template;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use toml::{Table, Value};
use tracing::info;

use super::error::ProbeError;
use super::runner::run_probe;
use super::{Oracle, ProbeTarget};
use crate::docs::Endpoint;
use crate::runtime_config::{RuntimeConfig, DEFAULT_PROBE_TIMEOUT};

#[derive(Template)]
#[template(path = "probe_Cargo.toml.txt", escape = "none")]
pub struct ProbeCargoToml {
    pub package_name: String,
    /// Pre-rendered `[dependencies]` TOML
    pub dependencies: String,
}

#[derive(Template)]
#[template(path = "probe_main.rs.txt", escape = "none")]
pub struct ProbeMainRs {
    pub table_name: String,
    pub routedoc_ident: String,
    pub table_expr: String,
}

/// The two files of a probe crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeProgram {
    pub cargo_toml: String,
    pub main_rs: String,
}

fn dependencies_toml(target: &ProbeTarget) -> Result<String, ProbeError> {
    let manifest = &target.manifest;
    let mut target_dep = Table::new();
    target_dep.insert(
        "path".to_string(),
        Value::String(manifest.dir.to_string_lossy().into_owned()),
    );

    let mut deps = Table::new();
    deps.insert(manifest.package_name.clone(), Value::Table(target_dep));
    deps.insert(
        manifest.routedoc.key.clone(),
        Value::Table(manifest.routedoc.spec.clone()),
    );
    let mut root = Table::new();
    root.insert("dependencies".to_string(), Value::Table(deps));

    toml::to_string(&root).map_err(|e| {
        ProbeError::Render(askama::Error::Custom(Box::new(e)))
    })
}

/// Render the probe crate for one route table.
///
/// # Errors
///
/// Returns [`ProbeError::Render`] if either template fails.
pub fn render_program(target: &ProbeTarget) -> Result<ProbeProgram, ProbeError> {
    let cargo_toml = ProbeCargoToml {
        package_name: target.manifest.package_name.clone(),
        dependencies: dependencies_toml(target)?,
    }
    .render()
    .map_err(ProbeError::Render)?;
    let main_rs = ProbeMainRs {
        table_name: target.table_name.clone(),
        routedoc_ident: target.manifest.routedoc.ident(),
        table_expr: target.table_expr.clone(),
    }
    .render()
    .map_err(ProbeError::Render)?;
    Ok(ProbeProgram {
        cargo_toml,
        main_rs,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), ProbeError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ProbeError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| ProbeError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the probe crate into `dir`; returns the manifest path.
///
/// # Errors
///
/// Returns [`ProbeError::Io`] naming the file that could not be written.
pub fn write_program(program: &ProbeProgram, dir: &Path) -> Result<PathBuf, ProbeError> {
    let manifest = dir.join("Cargo.toml");
    write_file(&manifest, &program.cargo_toml)?;
    write_file(&dir.join("src").join("main.rs"), &program.main_rs)?;
    Ok(manifest)
}

/// Probes by compiling and running a throwaway crate with cargo.
///
/// The crate lives in a temporary directory removed when the probe returns,
/// whatever the outcome. Builds share one target directory so repeated runs
/// only recompile the probe itself.
#[derive(Debug, Clone)]
pub struct CargoProbe {
    pub cargo: PathBuf,
    pub timeout: Duration,
    /// Defaults to `<target crate>/target/routedoc-probe`
    pub target_dir: Option<PathBuf>,
    pub offline: bool,
}

impl Default for CargoProbe {
    fn default() -> Self {
        Self {
            cargo: PathBuf::from("cargo"),
            timeout: DEFAULT_PROBE_TIMEOUT,
            target_dir: None,
            offline: false,
        }
    }
}

impl CargoProbe {
    /// Cargo binary and timeout from the environment.
    #[must_use]
    pub fn from_runtime_config(config: &RuntimeConfig) -> Self {
        Self {
            cargo: config.cargo_bin.clone(),
            timeout: config.probe_timeout,
            ..Self::default()
        }
    }

    fn command(&self, manifest_path: &Path, target: &ProbeTarget) -> Command {
        let target_dir = self
            .target_dir
            .clone()
            .unwrap_or_else(|| target.manifest.dir.join("target").join("routedoc-probe"));
        let mut cmd = Command::new(&self.cargo);
        cmd.arg("run").arg("--quiet").arg("--manifest-path").arg(manifest_path);
        if self.offline {
            cmd.arg("--offline");
        }
        cmd.env("CARGO_TARGET_DIR", target_dir);
        if let Some(dir) = manifest_path.parent() {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl Oracle for CargoProbe {
    fn probe(&self, target: &ProbeTarget) -> Result<Vec<Endpoint>, ProbeError> {
        let program = render_program(target)?;
        let dir = tempfile::Builder::new()
            .prefix("routedoc-probe-")
            .tempdir()
            .map_err(|source| ProbeError::Io {
                path: std::env::temp_dir(),
                source,
            })?;
        let manifest_path = write_program(&program, dir.path())?;
        info!(
            table = %target.table_name,
            probe_dir = %dir.path().display(),
            "Running probe"
        );
        let records = run_probe(self.command(&manifest_path, target), self.timeout)?;
        Ok(records.into_iter().map(Endpoint::from).collect())
    }
}
