//! Reading the `Cargo.toml` of a crate to document.
//!
//! The scanner needs to know where the library root lives and what the
//! crate is called in code; the probe needs to depend on the target crate and
//! on `routedoc` exactly as the target does.

use std::fmt;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// Package name of this library, as looked up in the target's dependencies.
pub const ROUTEDOC_PACKAGE: &str = "routedoc";

#[derive(Debug)]
pub enum ManifestError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// A workspace root manifest without `[package]`.
    NotAPackage { path: PathBuf },
    /// The package has no library target to document.
    NoLibrary { package: String },
    /// The package does not depend on `routedoc`.
    MissingDependency { package: String },
    /// `workspace = true` could not be resolved.
    Workspace { dependency: String, reason: String },
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::Io { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            ManifestError::Parse { path, source } => {
                write!(f, "invalid manifest {}: {source}", path.display())
            }
            ManifestError::NotAPackage { path } => {
                write!(f, "{} has no [package] section", path.display())
            }
            ManifestError::NoLibrary { package } => {
                write!(f, "package '{package}' has no library target")
            }
            ManifestError::MissingDependency { package } => write!(
                f,
                "package '{package}' does not depend on '{ROUTEDOC_PACKAGE}'"
            ),
            ManifestError::Workspace { dependency, reason } => write!(
                f,
                "cannot resolve workspace dependency '{dependency}': {reason}"
            ),
        }
    }
}

impl std::error::Error for ManifestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ManifestError::Io { source, .. } => Some(source),
            ManifestError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// How a crate depends on `routedoc`.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedocDependency {
    /// Key in `[dependencies]`; with `-` replaced by `_` this is the name
    /// used in paths.
    pub key: String,
    /// Dependency table with relative paths made absolute and workspace
    /// inheritance resolved.
    pub spec: Table,
}

impl RoutedocDependency {
    /// Crate name as it appears in `use` paths.
    #[must_use]
    pub fn ident(&self) -> String {
        self.key.replace('-', "_")
    }
}

/// The parts of a package manifest the documentation pipeline uses.
#[derive(Debug, Clone, PartialEq)]
pub struct CrateManifest {
    /// Directory holding `Cargo.toml`
    pub dir: PathBuf,
    pub package_name: String,
    /// Library crate name as used in paths
    pub lib_ident: String,
    /// Library root source file
    pub lib_path: PathBuf,
    pub routedoc: RoutedocDependency,
}

fn read_table(path: &Path) -> Result<Table, ManifestError> {
    let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    text.parse::<Table>().map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn absolute(dir: &Path) -> PathBuf {
    std::fs::canonicalize(dir).unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(dir))
            .unwrap_or_else(|_| dir.to_path_buf())
    })
}

/// Make a relative `path = ".."` absolute against `base`.
fn rebase_path(spec: &mut Table, base: &Path) {
    if let Some(Value::String(p)) = spec.get("path") {
        let candidate = Path::new(p);
        if candidate.is_relative() {
            let rebased = absolute(&base.join(candidate));
            spec.insert(
                "path".to_string(),
                Value::String(rebased.to_string_lossy().into_owned()),
            );
        }
    }
}

/// Normalize a dependency value to table form.
fn as_table(value: &Value) -> Option<Table> {
    match value {
        Value::String(version) => {
            let mut t = Table::new();
            t.insert("version".to_string(), Value::String(version.clone()));
            Some(t)
        }
        Value::Table(t) => Some(t.clone()),
        _ => None,
    }
}

/// Locate `routedoc` among `[dependencies]`, by key or by `package = ..`.
fn find_dependency(deps: &Table) -> Option<(String, Table)> {
    deps.iter().find_map(|(key, value)| {
        let spec = as_table(value)?;
        let package = spec
            .get("package")
            .and_then(Value::as_str)
            .unwrap_or(key.as_str());
        (package == ROUTEDOC_PACKAGE).then(|| (key.clone(), spec))
    })
}

/// Nearest ancestor manifest (the package's own directory included) that
/// declares `[workspace]`.
fn find_workspace_root(package_dir: &Path) -> Option<(PathBuf, Table)> {
    let mut dir = Some(package_dir);
    while let Some(current) = dir {
        let candidate = current.join("Cargo.toml");
        if candidate.is_file() {
            if let Ok(table) = read_table(&candidate) {
                if table.contains_key("workspace") {
                    return Some((current.to_path_buf(), table));
                }
            }
        }
        dir = current.parent();
    }
    None
}

fn resolve_workspace(
    key: &str,
    member: Table,
    package_dir: &Path,
) -> Result<Table, ManifestError> {
    let fail = |reason: &str| ManifestError::Workspace {
        dependency: key.to_string(),
        reason: reason.to_string(),
    };
    let (root, table) =
        find_workspace_root(package_dir).ok_or_else(|| fail("no workspace root found"))?;
    let inherited = table
        .get("workspace")
        .and_then(|w| w.get("dependencies"))
        .and_then(|d| d.get(key))
        .and_then(as_table)
        .ok_or_else(|| fail("not listed in [workspace.dependencies]"))?;

    let mut spec = inherited;
    rebase_path(&mut spec, &root);

    // Member features add to the inherited ones
    if let Some(Value::Array(extra)) = member.get("features") {
        let mut features = match spec.remove("features") {
            Some(Value::Array(f)) => f,
            _ => Vec::new(),
        };
        for feature in extra {
            if !features.contains(feature) {
                features.push(feature.clone());
            }
        }
        spec.insert("features".to_string(), Value::Array(features));
    }
    Ok(spec)
}

impl CrateManifest {
    /// Read `<dir>/Cargo.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] when the manifest is unreadable, is not a
    /// library package, or lacks a usable `routedoc` dependency.
    pub fn load(dir: &Path) -> Result<Self, ManifestError> {
        let dir = absolute(dir);
        let manifest_path = dir.join("Cargo.toml");
        let table = read_table(&manifest_path)?;

        let package_name = table
            .get("package")
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| ManifestError::NotAPackage {
                path: manifest_path.clone(),
            })?
            .to_string();

        let lib = table.get("lib");
        let lib_ident = lib
            .and_then(|l| l.get("name"))
            .and_then(Value::as_str)
            .map_or_else(|| package_name.replace('-', "_"), str::to_string);
        let lib_path = dir.join(
            lib.and_then(|l| l.get("path"))
                .and_then(Value::as_str)
                .unwrap_or("src/lib.rs"),
        );
        if !lib_path.is_file() {
            return Err(ManifestError::NoLibrary {
                package: package_name,
            });
        }

        let (key, mut spec) = table
            .get("dependencies")
            .and_then(Value::as_table)
            .and_then(find_dependency)
            .ok_or_else(|| ManifestError::MissingDependency {
                package: package_name.clone(),
            })?;

        if spec.get("workspace").and_then(Value::as_bool) == Some(true) {
            let inherit_key = spec
                .get("package")
                .and_then(Value::as_str)
                .map_or_else(|| key.clone(), str::to_string);
            spec = resolve_workspace(&inherit_key, spec, &dir)?;
        } else {
            rebase_path(&mut spec, &dir);
        }
        // Probe-irrelevant member-only keys
        spec.remove("optional");

        Ok(Self {
            dir,
            package_name,
            lib_ident,
            lib_path,
            routedoc: RoutedocDependency { key, spec },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, rel: &str, text: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_plain_package_with_relative_path() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "routedoc/Cargo.toml", "[package]\nname='routedoc'\n");
        write(
            tmp.path(),
            "app/Cargo.toml",
            "[package]\nname = \"my-app\"\n[dependencies]\nroutedoc = { path = \"../routedoc\", features = [\"x\"] }\n",
        );
        write(tmp.path(), "app/src/lib.rs", "");

        let manifest = CrateManifest::load(&tmp.path().join("app")).unwrap();
        assert_eq!(manifest.package_name, "my-app");
        assert_eq!(manifest.lib_ident, "my_app");
        assert!(manifest.lib_path.ends_with("src/lib.rs"));
        assert_eq!(manifest.routedoc.ident(), "routedoc");
        let path = manifest.routedoc.spec["path"].as_str().unwrap();
        assert!(Path::new(path).is_absolute());
        assert!(path.ends_with("routedoc"));
        assert!(manifest.routedoc.spec.contains_key("features"));
    }

    #[test]
    fn test_renamed_dependency_and_custom_lib() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "Cargo.toml",
            "[package]\nname = \"svc\"\n[lib]\nname = \"svc_core\"\npath = \"lib/root.rs\"\n[dependencies]\nrd = { package = \"routedoc\", version = \"0.1\" }\n",
        );
        write(tmp.path(), "lib/root.rs", "");

        let manifest = CrateManifest::load(tmp.path()).unwrap();
        assert_eq!(manifest.lib_ident, "svc_core");
        assert!(manifest.lib_path.ends_with("lib/root.rs"));
        assert_eq!(manifest.routedoc.key, "rd");
        assert_eq!(manifest.routedoc.spec["version"].as_str(), Some("0.1"));
    }

    #[test]
    fn test_workspace_inheritance() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "Cargo.toml",
            "[workspace]\nmembers = [\"app\"]\n[workspace.dependencies]\nroutedoc = { path = \"vendor/routedoc\", features = [\"a\"] }\n",
        );
        write(tmp.path(), "vendor/routedoc/Cargo.toml", "");
        write(
            tmp.path(),
            "app/Cargo.toml",
            "[package]\nname = \"app\"\n[dependencies]\nroutedoc = { workspace = true, features = [\"b\"], optional = true }\n",
        );
        write(tmp.path(), "app/src/lib.rs", "");

        let manifest = CrateManifest::load(&tmp.path().join("app")).unwrap();
        let spec = &manifest.routedoc.spec;
        assert!(spec["path"].as_str().unwrap().ends_with("vendor/routedoc"));
        let features: Vec<_> = spec["features"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(features, vec!["a", "b"]);
        assert!(!spec.contains_key("workspace"));
        assert!(!spec.contains_key("optional"));
    }

    #[test]
    fn test_errors() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            CrateManifest::load(tmp.path()),
            Err(ManifestError::Io { .. })
        ));

        write(tmp.path(), "Cargo.toml", "[package]\nname = \"bin-only\"\n");
        assert!(matches!(
            CrateManifest::load(tmp.path()),
            Err(ManifestError::NoLibrary { .. })
        ));

        write(tmp.path(), "src/lib.rs", "");
        let err = CrateManifest::load(tmp.path()).unwrap_err();
        assert!(matches!(err, ManifestError::MissingDependency { .. }));
        assert!(err.to_string().contains("bin-only"));

        write(tmp.path(), "Cargo.toml", "[package\n");
        assert!(matches!(
            CrateManifest::load(tmp.path()),
            Err(ManifestError::Parse { .. })
        ));
    }
}
